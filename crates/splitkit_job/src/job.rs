//! Top-level partition and merge jobs: read, plan, write, archive.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use splitkit_io_xlsx::{
    NoopObserver, ObserveStep, StepTimer, StyleSource, XlsxReader, sanitize_label,
};

use crate::archive::{build_archive, derive_archive_name};
use crate::config::SpecJobConfig;
use crate::coordinator::{CancelToken, Coordinator, ProgressFn};
use crate::merge::merge;
use crate::partition::partition;
use crate::probe::{MemoryProbe, NoopMemoryProbe};
use crate::report::{ReportJob, ReportJobBuilder};
use crate::spec::{EnumJobWarning, EnumPartitionMode, JobError, SpecWriteTask};
use crate::util::{derive_output_path, derive_sheet_dir_name, derive_unique_name};

/// Injected collaborators of a job run.
pub struct SpecJobHooks<'a> {
    /// Step timing observer.
    pub observer: &'a dyn ObserveStep,
    /// Memory capability for admission back-pressure.
    pub probe: &'a dyn MemoryProbe,
    /// `(completed, total)` callback.
    pub progress: Option<&'a ProgressFn<'a>>,
    /// Stops admission of further write batches.
    pub cancel_token: CancelToken,
}

impl Default for SpecJobHooks<'_> {
    fn default() -> Self {
        Self {
            observer: &NoopObserver,
            probe: &NoopMemoryProbe,
            progress: None,
            cancel_token: CancelToken::new(),
        }
    }
}

impl<'a> SpecJobHooks<'a> {
    fn derive_coordinator(&self, config: &SpecJobConfig) -> Coordinator<'a> {
        let coordinator = Coordinator::new(config.to_coordinator_options())
            .with_observer(self.observer)
            .with_probe(self.probe)
            .with_cancel_token(self.cancel_token.clone());
        match self.progress {
            Some(progress) => coordinator.with_progress(progress),
            None => coordinator,
        }
    }
}

/// Partition the spreadsheet at `path_input` into `config.output_dir`.
pub fn run_partition_job(
    path_input: &Path,
    config: &SpecJobConfig,
    hooks: &SpecJobHooks<'_>,
) -> Result<ReportJob, JobError> {
    config.validate(true)?;
    let reader = XlsxReader::open(path_input)?;
    run_partition_reader(&reader, config, hooks)
}

/// Partition an already opened spreadsheet (file or in-memory buffer).
///
/// Every selected sheet is read and planned before anything is written, so
/// a missing split field or primary sheet aborts the job with no output.
/// With several sheets each sheet writes into its own subdirectory.
pub fn run_partition_reader(
    reader: &XlsxReader,
    config: &SpecJobConfig,
    hooks: &SpecJobHooks<'_>,
) -> Result<ReportJob, JobError> {
    config.validate(true)?;
    log::info!(
        "Partition job: input={} size={:.1}MB split_field={:?} mode={:?}",
        reader.label(),
        reader.size_bytes() as f64 / (1024.0 * 1024.0),
        config.split_field,
        config.partition_mode()
    );
    let mut builder = ReportJobBuilder::default();
    let l_sheets = resolve_partition_sheets(reader, config, &mut builder)?;

    let read_options = config.to_read_options();
    let mut l_plans = Vec::with_capacity(l_sheets.len());
    for c_sheet in &l_sheets {
        let model: StyleSource = Arc::new(reader.read_sheet(
            Some(c_sheet.as_str()),
            &read_options,
            hooks.observer,
        )?);
        builder.add_input_read(model.n_rows());

        let timer = StepTimer::start("partition", hooks.observer);
        let plan = partition(&model, &config.to_partition_spec(c_sheet))?;
        timer.finish(c_sheet);
        l_plans.push((c_sheet.clone(), plan));
    }

    let path_dir_out = &config.output_dir;
    let if_subdirs = l_plans.len() > 1;
    let c_prefix = sanitize_label(&config.split_field);
    let mut l_tasks = Vec::new();
    let mut set_dirs_used = HashSet::new();
    for (c_sheet, plan) in l_plans {
        let path_dir_sheet = if if_subdirs {
            path_dir_out.join(derive_unique_name(
                &derive_sheet_dir_name(&c_sheet),
                &mut set_dirs_used,
            ))
        } else {
            path_dir_out.clone()
        };
        create_output_dir(&path_dir_sheet)?;

        builder.extend_warnings(plan.warnings);
        builder.add_planned(plan.l_outputs.len());
        let mut set_used = HashSet::new();
        for output in plan.l_outputs {
            let c_stem = match config.partition_mode() {
                EnumPartitionMode::OneFilePerValue => format!("{c_prefix}-{}", output.label),
                EnumPartitionMode::CustomGroups => output.label.clone(),
            };
            let c_stem = derive_unique_name(&c_stem, &mut set_used);
            l_tasks.push(SpecWriteTask {
                label: output.label,
                path_file_out: derive_output_path(&path_dir_sheet, &c_stem),
                dataset: output.dataset,
                style_source: output.style_source,
            });
        }
    }

    let timer = StepTimer::start("write_outputs", hooks.observer);
    hooks.derive_coordinator(config).run(l_tasks).apply_to(&mut builder);
    timer.finish("");

    if config.archive && !builder.outputs.is_empty() {
        let timer = StepTimer::start("archive", hooks.observer);
        let path_archive = path_dir_out.join(derive_archive_name(
            config.partition_mode(),
            &config.split_field,
        ));
        let mut l_files = builder.outputs.clone();
        l_files.sort();
        builder.path_archive = Some(build_archive(path_dir_out, &l_files, &path_archive)?);
        timer.finish("");
    }

    let report = builder.build();
    report.log("[SPLIT]");
    Ok(report)
}

/// Merge `l_inputs` into the single file `path_file_out`.
///
/// Unreadable inputs are skipped with a warning. Each input contributes the
/// configured sheet when it has one, otherwise its first sheet.
pub fn run_merge_job(
    l_inputs: &[PathBuf],
    path_file_out: &Path,
    config: &SpecJobConfig,
    hooks: &SpecJobHooks<'_>,
) -> Result<ReportJob, JobError> {
    config.validate(false)?;
    log::info!(
        "Merge job: {} input(s) -> {}",
        l_inputs.len(),
        path_file_out.display()
    );
    let mut builder = ReportJobBuilder::default();
    let read_options = config.to_read_options();

    let mut l_models: Vec<StyleSource> = Vec::with_capacity(l_inputs.len());
    for path_input in l_inputs {
        let res_model = XlsxReader::open(path_input).and_then(|reader| {
            let c_sheet = config
                .sheet_name
                .as_deref()
                .filter(|c| reader.has_sheet(c));
            reader.read_sheet(c_sheet, &read_options, hooks.observer)
        });
        match res_model {
            Ok(model) => {
                builder.add_input_read(model.n_rows());
                l_models.push(Arc::new(model));
            }
            Err(err) => {
                log::warn!("Skipping merge input {}: {err}", path_input.display());
                builder.add_input_skipped();
                builder.add_warning(EnumJobWarning::InputSkipped {
                    path: path_input.display().to_string(),
                    message: err.to_string(),
                });
            }
        }
    }

    let timer = StepTimer::start("merge", hooks.observer);
    let merged = merge(&l_models, &config.keep_fields, &config.sort_fields)?;
    timer.finish("");
    drop(l_models);
    builder.extend_warnings(merged.warnings);

    if let Some(path_dir) = path_file_out.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_output_dir(path_dir)?;
    }
    let c_label = path_file_out
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "merged".to_string());
    builder.add_planned(1);
    let task = SpecWriteTask {
        label: c_label,
        path_file_out: path_file_out.to_path_buf(),
        dataset: merged.dataset,
        style_source: merged.style_source,
    };

    let timer = StepTimer::start("write_outputs", hooks.observer);
    hooks.derive_coordinator(config).run(vec![task]).apply_to(&mut builder);
    timer.finish("");

    let report = builder.build();
    report.log("[MERGE]");
    Ok(report)
}

fn resolve_partition_sheets(
    reader: &XlsxReader,
    config: &SpecJobConfig,
    builder: &mut ReportJobBuilder,
) -> Result<Vec<String>, JobError> {
    if !config.selected_sheets.is_empty() {
        let mut l_sheets = Vec::new();
        for c_sheet in &config.selected_sheets {
            if reader.has_sheet(c_sheet) {
                l_sheets.push(c_sheet.clone());
            } else {
                log::warn!("Sheet {c_sheet:?} not found in {}; skipped", reader.label());
                builder.add_input_skipped();
                builder.add_warning(EnumJobWarning::SheetSkipped {
                    path: reader.label().to_string(),
                    sheet: c_sheet.clone(),
                });
            }
        }
        if l_sheets.is_empty() {
            return Err(JobError::SheetNotFound {
                path: reader.label().to_string(),
                sheet: config.selected_sheets.join(", "),
            });
        }
        return Ok(l_sheets);
    }

    let c_sheet = match &config.sheet_name {
        Some(c_name) if reader.has_sheet(c_name) => c_name.clone(),
        Some(c_name) => {
            return Err(JobError::SheetNotFound {
                path: reader.label().to_string(),
                sheet: c_name.clone(),
            });
        }
        None => reader
            .sheet_names()
            .into_iter()
            .next()
            .ok_or_else(|| JobError::SheetNotFound {
                path: reader.label().to_string(),
                sheet: "<first>".to_string(),
            })?,
    };
    Ok(vec![c_sheet])
}

fn create_output_dir(path_dir: &Path) -> Result<(), JobError> {
    std::fs::create_dir_all(path_dir).map_err(|e| JobError::OutputInit {
        path: path_dir.to_path_buf(),
        message: e.to_string(),
    })
}
