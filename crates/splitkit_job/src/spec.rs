//! Partition/merge specification models and top-level error types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use splitkit_io_xlsx::{Dataset, SpecXlsxReport, StyleSource, XlsxReadError};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// How rows are assigned to outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPartitionMode {
    /// One output per distinct normalized split value.
    #[default]
    OneFilePerValue,
    /// One output per named group of split values.
    CustomGroups,
}

/// Lifecycle of one write task. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumTaskState {
    /// Planned, not yet admitted to the pool.
    Pending,
    /// Admitted and executing.
    Running,
    /// Output file saved.
    Succeeded,
    /// Writer error or panic.
    Failed,
}

impl EnumTaskState {
    /// Whether the state is final.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Succeeded | Self::Failed => 2,
        }
    }

    /// Whether `next` is a legal successor: `Pending -> Running -> terminal`.
    pub fn can_advance_to(self, next: Self) -> bool {
        next.rank() > self.rank()
    }
}

/// Columns kept per sheet: one list for every sheet, or a list per sheet name.
///
/// An empty list, or a sheet missing from the map, keeps all columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumKeepFields {
    /// Same projection for every sheet.
    List(Vec<String>),
    /// Projection keyed by sheet name.
    PerSheet(BTreeMap<String, Vec<String>>),
}

impl Default for EnumKeepFields {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl EnumKeepFields {
    /// Projection for `sheet_name`; empty means keep every column.
    pub fn fields_for(&self, sheet_name: &str) -> &[String] {
        match self {
            Self::List(l_fields) => l_fields.as_slice(),
            Self::PerSheet(dict_fields) => dict_fields
                .get(sheet_name)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PartitionSpecification

/// What to partition on and how to shape each output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecPartitionSpec {
    /// Column whose normalized value selects the output.
    pub split_field: String,
    /// Assignment mode.
    pub mode: EnumPartitionMode,
    /// Named groups of normalized values, in output order (custom mode only).
    pub l_groups: Vec<(String, Vec<String>)>,
    /// Ordered projection; empty keeps all columns.
    pub keep_fields: Vec<String>,
    /// Stable ascending sort keys.
    pub sort_fields: Vec<String>,
    /// Output receiving rows of unassigned values (custom mode only).
    pub unassigned_group: Option<String>,
}

impl SpecPartitionSpec {
    /// One output per distinct value of `split_field`.
    pub fn by_value(split_field: impl Into<String>) -> Self {
        Self {
            split_field: split_field.into(),
            ..Default::default()
        }
    }

    /// One output per named group.
    pub fn by_groups(split_field: impl Into<String>, l_groups: Vec<(String, Vec<String>)>) -> Self {
        Self {
            split_field: split_field.into(),
            mode: EnumPartitionMode::CustomGroups,
            l_groups,
            ..Default::default()
        }
    }
}

/// One planned output of a partition or merge.
#[derive(Debug, Clone)]
pub struct SpecPartitionOutput {
    /// Sanitized value or group name.
    pub label: String,
    /// Rows to write.
    pub dataset: Dataset,
    /// Formatting template.
    pub style_source: StyleSource,
}

/// Planned outputs plus the diagnostics raised while planning them.
#[derive(Debug, Clone, Default)]
pub struct SpecPartitionPlan {
    /// Outputs in first-occurrence (or group) order.
    pub l_outputs: Vec<SpecPartitionOutput>,
    /// Normalized values that belong to no group, in first-occurrence order.
    pub l_unassigned: Vec<String>,
    /// Non-fatal diagnostics.
    pub warnings: Vec<EnumJobWarning>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TaskModels

/// One independent write job for the coordinator.
#[derive(Debug, Clone)]
pub struct SpecWriteTask {
    /// Output label used in reports.
    pub label: String,
    /// Destination file.
    pub path_file_out: PathBuf,
    /// Rows to write.
    pub dataset: Dataset,
    /// Formatting template.
    pub style_source: StyleSource,
}

/// Terminal (or pending, when cancelled) result of one task.
#[derive(Debug, Clone)]
pub struct SpecTaskOutcome {
    /// Output label.
    pub label: String,
    /// Destination file.
    pub path_file_out: PathBuf,
    /// Final state.
    pub state: EnumTaskState,
    /// Writer report when the task succeeded.
    pub report: Option<SpecXlsxReport>,
    /// Failure text when the task failed.
    pub error: Option<String>,
    /// Wall time spent in the task.
    pub elapsed: Duration,
}

/// One failed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecOutputError {
    /// Output label.
    pub label: String,
    /// Destination file.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WarningsAndErrors

/// Non-fatal diagnostics collected into the job report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumJobWarning {
    /// Split values covered by no custom group.
    UnassignedValues {
        /// Values in first-occurrence order.
        values: Vec<String>,
        /// Rows carrying those values.
        n_rows: usize,
    },
    /// Custom group that matched no row; no file is produced.
    EmptyGroup(String),
    /// Selected sheet absent from the input.
    SheetSkipped {
        /// Input label.
        path: String,
        /// Missing sheet.
        sheet: String,
    },
    /// Merge input that could not be read.
    InputSkipped {
        /// Input label.
        path: String,
        /// Read error text.
        message: String,
    },
    /// Merge input lacking some retained columns; they are filled with nulls.
    MergeFieldsMissing {
        /// Input label.
        path: String,
        /// Missing columns.
        fields: Vec<String>,
    },
    /// Writer-level warning of one output.
    Writer {
        /// Output label.
        label: String,
        /// Warning text.
        message: String,
    },
    /// Thread pool could not be built; tasks ran serially.
    PoolFallback(String),
    /// Tasks never admitted because the job was cancelled.
    Cancelled {
        /// Number of tasks left pending.
        n_tasks: usize,
    },
    /// Admission stalled on memory pressure.
    MemoryStall {
        /// Resident memory when the stall ended, in MiB.
        n_mb_resident: u64,
        /// Configured limit in MiB.
        n_mb_limit: u64,
        /// Time spent waiting.
        waited: Duration,
    },
}

impl fmt::Display for EnumJobWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnassignedValues { values, n_rows } => write!(
                f,
                "{} value(s) in no group ({n_rows} row(s)): {}",
                values.len(),
                values.join(", ")
            ),
            Self::EmptyGroup(group) => write!(f, "Group {group:?} matched no rows; skipped"),
            Self::SheetSkipped { path, sheet } => {
                write!(f, "Sheet {sheet:?} not found in {path}; skipped")
            }
            Self::InputSkipped { path, message } => {
                write!(f, "Input {path} skipped: {message}")
            }
            Self::MergeFieldsMissing { path, fields } => write!(
                f,
                "Input {path} lacks field(s) {}; filled with nulls",
                fields.join(", ")
            ),
            Self::Writer { label, message } => write!(f, "[{label}] {message}"),
            Self::PoolFallback(msg) => write!(f, "{msg}"),
            Self::Cancelled { n_tasks } => {
                write!(f, "Cancelled; {n_tasks} task(s) not started")
            }
            Self::MemoryStall {
                n_mb_resident,
                n_mb_limit,
                waited,
            } => write!(
                f,
                "Memory {n_mb_resident}MB over limit {n_mb_limit}MB; admission waited {:.1}s",
                waited.as_secs_f64()
            ),
        }
    }
}

/// "Job failed before producing outputs" errors.
#[derive(Debug)]
pub enum JobError {
    /// Split, keep or sort field absent from the sheet.
    FieldNotFound {
        /// Missing field.
        field: String,
        /// Sheet searched.
        sheet: String,
    },
    /// Requested sheet absent (primary sheet, or every selected sheet).
    SheetNotFound {
        /// Input label.
        path: String,
        /// Requested sheet.
        sheet: String,
    },
    /// Merge with no readable input.
    NoData(String),
    /// Primary input could not be read.
    Read(XlsxReadError),
    /// Configuration rejected by validation or parsing.
    InvalidConfig(String),
    /// Output directory initialization failed.
    OutputInit {
        /// Output directory.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// ZIP archive creation failed.
    Archive {
        /// Archive path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldNotFound { field, sheet } => {
                write!(f, "Field not found: {field:?} in sheet {sheet:?}")
            }
            Self::SheetNotFound { path, sheet } => {
                write!(f, "Sheet not found: {sheet:?} in {path}")
            }
            Self::NoData(msg) => write!(f, "No data: {msg}"),
            Self::Read(err) => write!(f, "{err}"),
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
            Self::OutputInit { path, message } => write!(
                f,
                "Failed to initialize output directory {}: {message}",
                path.display()
            ),
            Self::Archive { path, message } => {
                write!(f, "Failed to build archive {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read(err) => Some(err),
            _ => None,
        }
    }
}

impl From<XlsxReadError> for JobError {
    fn from(err: XlsxReadError) -> Self {
        match err {
            XlsxReadError::SheetNotFound { path, sheet } => Self::SheetNotFound { path, sheet },
            other => Self::Read(other),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
