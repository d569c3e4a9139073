//! Job configuration loaded from JSON or YAML.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use splitkit_io_xlsx::{SpecXlsxReadOptions, SpecXlsxWriteOptions};

use crate::coordinator::SpecCoordinatorOptions;
use crate::spec::{EnumKeepFields, EnumPartitionMode, JobError, SpecPartitionSpec};

const N_BYTES_PER_MB: u64 = 1024 * 1024;

/// Partition/merge job configuration.
///
/// Unknown keys are ignored and missing keys take their defaults. Keys are
/// accepted in snake_case or camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecJobConfig {
    /// Column whose value selects the output (partition jobs).
    #[serde(alias = "splitField")]
    pub split_field: String,
    /// Kept columns, one list for all sheets or a list per sheet.
    #[serde(alias = "keepFields")]
    pub keep_fields: EnumKeepFields,
    /// Stable ascending sort keys.
    #[serde(alias = "sortFields")]
    pub sort_fields: Vec<String>,
    /// Directory receiving outputs.
    #[serde(alias = "outputDir")]
    pub output_dir: PathBuf,
    /// Sheet to read; first sheet when absent.
    #[serde(alias = "sheetName")]
    pub sheet_name: Option<String>,
    /// Sheets partitioned independently; overrides `sheet_name` when non-empty.
    #[serde(alias = "selectedSheets")]
    pub selected_sheets: Vec<String>,
    /// Copy styles, dimensions and merges from the source.
    #[serde(alias = "preserveFormat")]
    pub preserve_format: bool,
    /// Group name to member values; non-empty switches to custom-group mode.
    #[serde(alias = "customGroups")]
    pub custom_groups: BTreeMap<String, Vec<String>>,
    /// Output name for rows whose value is in no group.
    #[serde(alias = "unassignedGroup")]
    pub unassigned_group: Option<String>,
    /// Collect partition outputs into one ZIP archive.
    pub archive: bool,
    /// Rows per streaming batch.
    #[serde(alias = "batchSize")]
    pub batch_size: usize,
    /// Worker pool size.
    #[serde(alias = "maxWorkers")]
    pub max_workers: usize,
    /// Advisory resident-memory limit in MiB.
    #[serde(alias = "memoryLimitMB", alias = "memoryLimitMb")]
    pub memory_limit_mb: u64,
    /// Inputs at or above this size are read in batches.
    #[serde(alias = "streamingThresholdMB", alias = "streamingThresholdMb")]
    pub streaming_threshold_mb: u64,
}

impl Default for SpecJobConfig {
    fn default() -> Self {
        Self {
            split_field: String::new(),
            keep_fields: EnumKeepFields::default(),
            sort_fields: Vec::new(),
            output_dir: PathBuf::from("output"),
            sheet_name: None,
            selected_sheets: Vec::new(),
            preserve_format: true,
            custom_groups: BTreeMap::new(),
            unassigned_group: None,
            archive: false,
            batch_size: 1000,
            max_workers: 4,
            memory_limit_mb: 512,
            streaming_threshold_mb: 50,
        }
    }
}

impl SpecJobConfig {
    /// Load from a `.json`, `.yml` or `.yaml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, JobError> {
        let path = path.as_ref();
        let c_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let c_text = std::fs::read_to_string(path).map_err(|e| {
            JobError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        match c_ext.as_str() {
            "json" => Self::from_json_str(&c_text),
            "yml" | "yaml" => Self::from_yaml_str(&c_text),
            _ => Err(JobError::InvalidConfig(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }

    /// Parse JSON text.
    pub fn from_json_str(c_text: &str) -> Result<Self, JobError> {
        serde_json::from_str(c_text).map_err(|e| JobError::InvalidConfig(format!("JSON: {e}")))
    }

    /// Parse YAML text.
    pub fn from_yaml_str(c_text: &str) -> Result<Self, JobError> {
        serde_yaml::from_str(c_text).map_err(|e| JobError::InvalidConfig(format!("YAML: {e}")))
    }

    /// Reject settings no job can run with.
    pub fn validate(&self, if_partition: bool) -> Result<(), JobError> {
        if if_partition && self.split_field.trim().is_empty() {
            return Err(JobError::InvalidConfig("split_field is empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(JobError::InvalidConfig("batch_size must be > 0".to_string()));
        }
        if self.max_workers == 0 {
            return Err(JobError::InvalidConfig("max_workers must be > 0".to_string()));
        }
        Ok(())
    }

    /// Partition mode implied by `custom_groups`.
    pub fn partition_mode(&self) -> EnumPartitionMode {
        if self.custom_groups.is_empty() {
            EnumPartitionMode::OneFilePerValue
        } else {
            EnumPartitionMode::CustomGroups
        }
    }

    /// Partition spec for `sheet_name`.
    pub fn to_partition_spec(&self, sheet_name: &str) -> SpecPartitionSpec {
        SpecPartitionSpec {
            split_field: self.split_field.clone(),
            mode: self.partition_mode(),
            l_groups: self
                .custom_groups
                .iter()
                .map(|(c_group, l_values)| (c_group.clone(), l_values.clone()))
                .collect(),
            keep_fields: self.keep_fields.fields_for(sheet_name).to_vec(),
            sort_fields: self.sort_fields.clone(),
            unassigned_group: self.unassigned_group.clone(),
        }
    }

    /// Reader options.
    pub fn to_read_options(&self) -> SpecXlsxReadOptions {
        SpecXlsxReadOptions {
            size_streaming_min_bytes: self.streaming_threshold_mb.saturating_mul(N_BYTES_PER_MB),
            n_rows_batch: self.batch_size,
            if_force_streaming: false,
        }
    }

    /// Coordinator options.
    pub fn to_coordinator_options(&self) -> SpecCoordinatorOptions {
        SpecCoordinatorOptions {
            max_workers: self.max_workers,
            memory_limit_mb: self.memory_limit_mb,
            write_options: SpecXlsxWriteOptions {
                if_preserve_format: self.preserve_format,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
