//! `splitkit_job` v1:
//! Partition/merge orchestration over the `splitkit_io_xlsx` kernel.
//!
//! Modules:
//! - `spec`        : partition specs, task models, warnings and errors
//! - `report`      : job manifest and builder
//! - `partition`   : one sheet -> labelled datasets
//! - `merge`       : many sheets -> one dataset
//! - `coordinator` : bounded-pool write execution
//! - `probe`       : memory capability and admission governor
//! - `config`      : JSON/YAML job configuration
//! - `archive`     : ZIP collection of outputs
//! - `job`         : end-to-end partition and merge runners
//! - `util`        : pure helper functions
pub mod archive;
pub mod config;
pub mod coordinator;
pub mod job;
pub mod merge;
pub mod partition;
pub mod probe;
pub mod report;
pub mod spec;
mod util;

pub use archive::{build_archive, derive_archive_name};
pub use config::SpecJobConfig;
pub use coordinator::{
    CancelToken, Coordinator, ProgressFn, SpecCoordinatorOptions, SpecCoordinatorOutcome,
    TaskStateFn,
};
pub use job::{SpecJobHooks, run_merge_job, run_partition_job, run_partition_reader};
pub use merge::{SpecMergeResult, merge};
pub use partition::partition;
#[cfg(feature = "memory-probe")]
pub use probe::SysinfoMemoryProbe;
pub use probe::{MemoryGovernor, MemoryProbe, NoopMemoryProbe};
pub use report::{ReportJob, ReportJobBuilder};
pub use spec::{
    EnumJobWarning, EnumKeepFields, EnumPartitionMode, EnumTaskState, JobError,
    SpecOutputError, SpecPartitionOutput, SpecPartitionPlan, SpecPartitionSpec, SpecTaskOutcome,
    SpecWriteTask,
};
