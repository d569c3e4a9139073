//! Shared XLSX specification models: cell styles, values, options, reports and errors.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::conf::{N_ROWS_BATCH_DEFAULT, N_SIZE_STREAMING_MIN_BYTES};

////////////////////////////////////////////////////////////////////////////////
// #region CellStyleSpecification

/// Colour reference as stored in `styles.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumColor {
    /// Explicit `RRGGBB` colour (alpha channel dropped).
    Rgb(u32),
    /// Theme colour index with optional raw tint text.
    Theme {
        /// Theme colour index.
        id: u32,
        /// Raw `tint` attribute, kept verbatim for value equality.
        tint: Option<String>,
    },
    /// Legacy palette index.
    Indexed(u32),
    /// System automatic colour.
    Auto,
}

/// Font underline kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumUnderline {
    /// No underline.
    #[default]
    None,
    /// Single underline.
    Single,
    /// Double underline.
    Double,
    /// Single accounting underline.
    SingleAccounting,
    /// Double accounting underline.
    DoubleAccounting,
}

/// Font part of a cell style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecFont {
    /// Font family name, e.g. `Calibri`.
    pub name: Option<String>,
    /// Font size in points.
    pub size: Option<f64>,
    /// Bold weight.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Underline kind.
    pub underline: EnumUnderline,
    /// Strikethrough.
    pub strike: bool,
    /// Font colour.
    pub color: Option<EnumColor>,
}

// Sizes come from decimal attribute text and are never NaN.
impl Eq for SpecFont {}

impl Hash for SpecFont {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.size.map(f64::to_bits).hash(state);
        self.bold.hash(state);
        self.italic.hash(state);
        self.underline.hash(state);
        self.strike.hash(state);
        self.color.hash(state);
    }
}

/// Pattern fill part of a cell style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecFill {
    /// Raw `patternType`, e.g. `solid`; `None` means no fill.
    pub pattern: Option<String>,
    /// Foreground (pattern) colour.
    pub fg_color: Option<EnumColor>,
    /// Background colour.
    pub bg_color: Option<EnumColor>,
}

/// One border edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecBorderSide {
    /// Raw border style name, e.g. `thin`; `None` means no line.
    pub style: Option<String>,
    /// Line colour.
    pub color: Option<EnumColor>,
}

/// Border part of a cell style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecBorder {
    /// Left edge.
    pub left: SpecBorderSide,
    /// Right edge.
    pub right: SpecBorderSide,
    /// Top edge.
    pub top: SpecBorderSide,
    /// Bottom edge.
    pub bottom: SpecBorderSide,
    /// Diagonal line.
    pub diagonal: SpecBorderSide,
    /// Diagonal runs bottom-left to top-right.
    pub diagonal_up: bool,
    /// Diagonal runs top-left to bottom-right.
    pub diagonal_down: bool,
}

/// Alignment part of a cell style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecAlignment {
    /// Raw horizontal alignment, e.g. `center`.
    pub horizontal: Option<String>,
    /// Raw vertical alignment, e.g. `top`.
    pub vertical: Option<String>,
    /// Wrap text.
    pub wrap_text: bool,
    /// Raw `textRotation` value (0-180, or 255 for stacked text).
    pub rotation: u16,
    /// Indent level.
    pub indent: u8,
}

/// Immutable, value-comparable cell formatting descriptor.
///
/// Two styles are equal iff every field is equal; equal styles share one
/// [`crate::registry::StyleRegistry`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecCellStyle {
    /// Font.
    pub font: SpecFont,
    /// Fill.
    pub fill: SpecFill,
    /// Borders.
    pub border: SpecBorder,
    /// Alignment.
    pub alignment: SpecAlignment,
    /// Number format code.
    pub number_format: String,
    /// Built-in `numFmtId` (1-163) when the source referenced the format by id only.
    pub number_format_index: Option<u8>,
    /// Hyperlink target (`internal:Sheet!A1` for in-document links).
    pub hyperlink: Option<String>,
}

impl Default for SpecCellStyle {
    fn default() -> Self {
        Self {
            font: SpecFont::default(),
            fill: SpecFill::default(),
            border: SpecBorder::default(),
            alignment: SpecAlignment::default(),
            number_format: crate::conf::C_NUM_FORMAT_GENERAL.to_string(),
            number_format_index: None,
            hyperlink: None,
        }
    }
}

impl SpecCellStyle {
    /// Return a copy of this style carrying `hyperlink`.
    pub fn with_hyperlink(&self, hyperlink: Option<String>) -> SpecCellStyle {
        SpecCellStyle {
            hyperlink,
            ..self.clone()
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Semantic cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value (dates included, as serial numbers).
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

impl EnumCellValue {
    /// Whether the value is missing.
    pub fn is_none(&self) -> bool {
        matches!(self, EnumCellValue::None)
    }

    /// String-normalized form used for split/group matching.
    ///
    /// Integral numbers lose their fractional part (`100`, not `100.0`).
    pub fn to_normalized_string(&self) -> String {
        match self {
            EnumCellValue::None => String::new(),
            EnumCellValue::String(s) => s.clone(),
            EnumCellValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            EnumCellValue::Boolean(b) => if *b { "True" } else { "False" }.to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            EnumCellValue::Number(_) => 0,
            EnumCellValue::Boolean(_) => 1,
            EnumCellValue::String(_) => 2,
            EnumCellValue::None => 3,
        }
    }

    /// Total ascending order: numbers < booleans < text < missing.
    pub fn cmp_for_sort(&self, other: &EnumCellValue) -> Ordering {
        match (self, other) {
            (EnumCellValue::Number(a), EnumCellValue::Number(b)) => a.total_cmp(b),
            (EnumCellValue::Boolean(a), EnumCellValue::Boolean(b)) => a.cmp(b),
            (EnumCellValue::String(a), EnumCellValue::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_normalized_string())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LayoutSpecification

/// Rectangular cell range, zero-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecCellRange {
    /// First row.
    pub row_first: u32,
    /// First column.
    pub col_first: u16,
    /// Last row.
    pub row_last: u32,
    /// Last column.
    pub col_last: u16,
}

impl SpecCellRange {
    /// Whether the range covers exactly one cell.
    pub fn is_single_cell(&self) -> bool {
        self.row_first == self.row_last && self.col_first == self.col_last
    }

    /// Whether `(row, col)` lies inside the range.
    pub fn contains(&self, row: u32, col: u16) -> bool {
        row >= self.row_first && row <= self.row_last && col >= self.col_first && col <= self.col_last
    }
}

impl fmt::Display for SpecCellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            crate::util::convert_col_to_letters(self.col_first),
            self.row_first + 1,
            crate::util::convert_col_to_letters(self.col_last),
            self.row_last + 1
        )
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Reader options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxReadOptions {
    /// Inputs at or above this size are parsed in row batches.
    pub size_streaming_min_bytes: u64,
    /// Rows per streaming batch.
    pub n_rows_batch: usize,
    /// Always use batch mode regardless of size.
    pub if_force_streaming: bool,
}

impl Default for SpecXlsxReadOptions {
    fn default() -> Self {
        Self {
            size_streaming_min_bytes: N_SIZE_STREAMING_MIN_BYTES,
            n_rows_batch: N_ROWS_BATCH_DEFAULT,
            if_force_streaming: false,
        }
    }
}

/// Writer options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxWriteOptions {
    /// Copy cell styles from the style source. When `false` only values are written.
    pub if_preserve_format: bool,
    /// Copy column widths and row heights (ignored without `if_preserve_format`).
    pub if_copy_dimensions: bool,
    /// Copy merged ranges (ignored without `if_preserve_format`).
    pub if_copy_merges: bool,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        Self {
            if_preserve_format: true,
            if_copy_dimensions: true,
            if_copy_merges: true,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet name emitted to the workbook.
    pub sheet_name: String,
    /// Data rows written (header excluded).
    pub n_rows: usize,
    /// Columns written.
    pub n_cols: usize,
    /// Merged ranges copied from the style source.
    pub n_merges: usize,
    /// Distinct styles applied (size of the writer's registry).
    pub n_styles: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Failures while loading a spreadsheet into a [`crate::model::WorkbookModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XlsxReadError {
    /// Requested sheet is absent.
    SheetNotFound {
        /// Input label (path or buffer name).
        path: String,
        /// Requested sheet name.
        sheet: String,
    },
    /// Not a readable XLSX package, or a required part is corrupt.
    UnsupportedFormat {
        /// Input label (path or buffer name).
        path: String,
        /// Parser message.
        message: String,
    },
    /// File-system failure.
    Io {
        /// Input label (path or buffer name).
        path: String,
        /// IO error text.
        message: String,
    },
}

impl fmt::Display for XlsxReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SheetNotFound { path, sheet } => {
                write!(f, "Sheet not found: {sheet:?} in {path}")
            }
            Self::UnsupportedFormat { path, message } => {
                write!(f, "Unsupported or corrupt spreadsheet {path}: {message}")
            }
            Self::Io { path, message } => write!(f, "Failed to read {path}: {message}"),
        }
    }
}

impl std::error::Error for XlsxReadError {}

/// Failures while emitting one output workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XlsxWriteError {
    /// Dataset does not fit an Excel worksheet.
    LimitExceeded(String),
    /// rust_xlsxwriter failure, including the final save.
    Xlsx(String),
}

impl fmt::Display for XlsxWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LimitExceeded(msg) => write!(f, "Excel limit exceeded: {msg}"),
            Self::Xlsx(msg) => write!(f, "xlsx write error: {msg}"),
        }
    }
}

impl std::error::Error for XlsxWriteError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{EnumCellValue, SpecCellRange};

    #[test]
    fn test_normalized_string_drops_integral_fraction() {
        assert_eq!(EnumCellValue::Number(100.0).to_normalized_string(), "100");
        assert_eq!(EnumCellValue::Number(1.5).to_normalized_string(), "1.5");
        assert_eq!(EnumCellValue::Boolean(true).to_normalized_string(), "True");
        assert_eq!(EnumCellValue::None.to_normalized_string(), "");
        assert_eq!(
            EnumCellValue::String("Sales".to_string()).to_normalized_string(),
            "Sales"
        );
    }

    #[test]
    fn test_cmp_for_sort_puts_missing_last() {
        let a = EnumCellValue::Number(3.0);
        let b = EnumCellValue::String("x".to_string());
        let c = EnumCellValue::None;
        assert_eq!(a.cmp_for_sort(&b), Ordering::Less);
        assert_eq!(b.cmp_for_sort(&c), Ordering::Less);
        assert_eq!(c.cmp_for_sort(&a), Ordering::Greater);
        assert_eq!(
            EnumCellValue::Number(2.0).cmp_for_sort(&EnumCellValue::Number(10.0)),
            Ordering::Less
        );
    }

    #[test]
    fn test_cell_range_display_and_contains() {
        let range = SpecCellRange {
            row_first: 0,
            col_first: 0,
            row_last: 2,
            col_last: 27,
        };
        assert_eq!(range.to_string(), "A1:AB3");
        assert!(range.contains(1, 5));
        assert!(!range.contains(3, 0));
        assert!(!range.is_single_cell());
    }
}
