//! Job manifest and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::{EnumJobWarning, SpecOutputError};

/// Manifest of one partition or merge job: what succeeded and what failed.
#[derive(Debug, Default, Clone)]
pub struct ReportJob {
    /// Inputs (files or sheets) read successfully.
    pub cnt_inputs_read: u64,
    /// Inputs skipped after a read failure or missing sheet.
    pub cnt_inputs_skipped: u64,
    /// Data rows read across all inputs.
    pub cnt_rows_read: u64,
    /// Outputs planned by the partition or merge step.
    pub cnt_outputs_planned: u64,
    /// Outputs saved.
    pub cnt_outputs_written: u64,
    /// Outputs never started (cancellation).
    pub cnt_outputs_skipped: u64,
    /// Data rows written across all outputs.
    pub cnt_rows_written: u64,
    /// Saved output files, sorted.
    pub outputs: Vec<PathBuf>,
    /// ZIP archive of the outputs, when requested.
    pub path_archive: Option<PathBuf>,
    /// Non-fatal diagnostics.
    pub warnings: Vec<EnumJobWarning>,
    /// Per-output failures.
    pub errors: Vec<SpecOutputError>,
}

impl ReportJob {
    /// Number of failed outputs.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Whether every planned output was written.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && self.cnt_outputs_written == self.cnt_outputs_planned
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_inputs_read".to_string(), self.cnt_inputs_read);
        dict_counts.insert("cnt_inputs_skipped".to_string(), self.cnt_inputs_skipped);
        dict_counts.insert("cnt_rows_read".to_string(), self.cnt_rows_read);
        dict_counts.insert("cnt_outputs_planned".to_string(), self.cnt_outputs_planned);
        dict_counts.insert("cnt_outputs_written".to_string(), self.cnt_outputs_written);
        dict_counts.insert("cnt_outputs_skipped".to_string(), self.cnt_outputs_skipped);
        dict_counts.insert("cnt_rows_written".to_string(), self.cnt_rows_written);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} inputs={} skipped_inputs={} rows_in={} planned={} written={} skipped={} rows_out={} errors={} warnings={}",
            dict_counts["cnt_inputs_read"],
            dict_counts["cnt_inputs_skipped"],
            dict_counts["cnt_rows_read"],
            dict_counts["cnt_outputs_planned"],
            dict_counts["cnt_outputs_written"],
            dict_counts["cnt_outputs_skipped"],
            dict_counts["cnt_rows_written"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }

    /// Log the summary, then each warning and failure.
    pub fn log(&self, prefix: &str) {
        log::info!("{}", self.format(prefix));
        for warning in &self.warnings {
            log::warn!("{prefix} {warning}");
        }
        for err in &self.errors {
            log::error!(
                "{prefix} output {} ({}) failed: {}",
                err.label,
                err.path.display(),
                err.exception
            );
        }
    }
}

impl fmt::Display for ReportJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[JOB]"))
    }
}

/// Mutable accumulator for job statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportJobBuilder {
    /// See [`ReportJob::cnt_inputs_read`].
    pub cnt_inputs_read: u64,
    /// See [`ReportJob::cnt_inputs_skipped`].
    pub cnt_inputs_skipped: u64,
    /// See [`ReportJob::cnt_rows_read`].
    pub cnt_rows_read: u64,
    /// See [`ReportJob::cnt_outputs_planned`].
    pub cnt_outputs_planned: u64,
    /// See [`ReportJob::cnt_outputs_written`].
    pub cnt_outputs_written: u64,
    /// See [`ReportJob::cnt_outputs_skipped`].
    pub cnt_outputs_skipped: u64,
    /// See [`ReportJob::cnt_rows_written`].
    pub cnt_rows_written: u64,
    /// See [`ReportJob::outputs`].
    pub outputs: Vec<PathBuf>,
    /// See [`ReportJob::path_archive`].
    pub path_archive: Option<PathBuf>,
    /// See [`ReportJob::warnings`].
    pub warnings: Vec<EnumJobWarning>,
    /// See [`ReportJob::errors`].
    pub errors: Vec<SpecOutputError>,
}

impl ReportJobBuilder {
    /// Record one input read with `n_rows` data rows.
    pub fn add_input_read(&mut self, n_rows: usize) {
        self.cnt_inputs_read += 1;
        self.cnt_rows_read += n_rows as u64;
    }

    /// Record one skipped input.
    pub fn add_input_skipped(&mut self) {
        self.cnt_inputs_skipped += 1;
    }

    /// Record `n` planned outputs.
    pub fn add_planned(&mut self, n: usize) {
        self.cnt_outputs_planned += n as u64;
    }

    /// Record one saved output.
    pub fn add_written(&mut self, path: PathBuf, n_rows: usize) {
        self.cnt_outputs_written += 1;
        self.cnt_rows_written += n_rows as u64;
        self.outputs.push(path);
    }

    /// Record one output never started.
    pub fn add_skipped(&mut self) {
        self.cnt_outputs_skipped += 1;
    }

    /// Add warning.
    pub fn add_warning(&mut self, warning: EnumJobWarning) {
        self.warnings.push(warning);
    }

    /// Add many warnings.
    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = EnumJobWarning>) {
        self.warnings.extend(warnings);
    }

    /// Add one output failure.
    pub fn add_error(&mut self, label: String, path: PathBuf, exception: String) {
        self.errors.push(SpecOutputError {
            label,
            path,
            exception,
        });
    }

    /// Finalize builder into immutable report.
    pub fn build(mut self) -> ReportJob {
        self.outputs.sort();
        ReportJob {
            cnt_inputs_read: self.cnt_inputs_read,
            cnt_inputs_skipped: self.cnt_inputs_skipped,
            cnt_rows_read: self.cnt_rows_read,
            cnt_outputs_planned: self.cnt_outputs_planned,
            cnt_outputs_written: self.cnt_outputs_written,
            cnt_outputs_skipped: self.cnt_outputs_skipped,
            cnt_rows_written: self.cnt_rows_written,
            outputs: self.outputs,
            path_archive: self.path_archive,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}
