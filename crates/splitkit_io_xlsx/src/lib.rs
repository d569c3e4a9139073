//! `splitkit_io_xlsx` v1:
//! Format-preserving XLSX kernel.
//!
//! Modules:
//! - `conf`     : constants and default presets
//! - `spec`     : style/value models, options, reports and errors
//! - `registry` : value-keyed style interning
//! - `model`    : in-memory sheet model and datasets
//! - `parse`    : workbook-level part parsers
//! - `reader`   : sheet reader (in-memory or batched)
//! - `writer`   : styled single-sheet writer
//! - `observe`  : injectable step-timing observers
//! - `util`     : pure helper functions
pub mod conf;
pub mod model;
pub mod observe;
pub mod parse;
pub mod reader;
pub mod registry;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_LABEL_BLANK, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    N_ROWS_BATCH_DEFAULT, N_SIZE_STREAMING_MIN_BYTES,
};
pub use model::{Dataset, StyleSource, WorkbookModel};
pub use observe::{NoopObserver, ObserveStep, SpecStepStats, StepTimer, TimingCollector};
pub use reader::{XlsxReader, read_workbook_model};
pub use registry::{StyleHandle, StyleRegistry};
pub use spec::{
    EnumCellValue, EnumColor, EnumUnderline, SpecAlignment, SpecBorder, SpecBorderSide,
    SpecCellRange, SpecCellStyle, SpecFill, SpecFont, SpecXlsxReadOptions, SpecXlsxReport,
    SpecXlsxWriteOptions, XlsxReadError, XlsxWriteError,
};
pub use util::{sanitize_label, sanitize_sheet_name};
pub use writer::{XlsxWriter, write_dataset_file};
