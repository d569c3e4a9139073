//! In-memory sheet model and the datasets derived from it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::registry::{StyleHandle, StyleRegistry};
use crate::spec::{EnumCellValue, SpecCellRange, SpecCellStyle};

/// One sheet's schema, rows and positional style lookup.
///
/// Built once by [`crate::reader::XlsxReader`] and read-only afterwards, so it
/// can be shared across writer threads behind an [`Arc`].
#[derive(Debug, Clone, Default)]
pub struct WorkbookModel {
    /// Label of the input this sheet was read from.
    pub source_label: String,
    /// Sheet name inside the source document.
    pub sheet_name: String,
    /// Unique column names taken from sheet row 1.
    pub columns: Vec<String>,
    /// Data rows in column order, each padded to `columns.len()`.
    pub rows: Vec<Vec<EnumCellValue>>,
    /// Style handles of each data row, aligned with `rows`.
    pub l_row_styles: Vec<Vec<StyleHandle>>,
    /// Zero-based sheet row index of each data row.
    pub l_row_positions: Vec<u32>,
    /// Style handles of the header row.
    pub l_header_styles: Vec<StyleHandle>,
    /// Style handles of sheet row 2 (the data template row).
    pub l_template_styles: Vec<StyleHandle>,
    /// Registry owning every handle above.
    pub registry: StyleRegistry,
    /// Column widths in character units, keyed by zero-based column index.
    pub dict_col_widths: BTreeMap<u16, f64>,
    /// Row heights in points, keyed by zero-based sheet row index.
    pub dict_row_heights: BTreeMap<u32, f64>,
    /// Merged ranges in document order.
    pub l_merged_ranges: Vec<SpecCellRange>,
}

/// Shared, immutable style template for writers.
pub type StyleSource = Arc<WorkbookModel>;

impl WorkbookModel {
    /// Number of data rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Position of `name` in `columns`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Header style handle of column `col`.
    pub fn header_style_at(&self, col: usize) -> StyleHandle {
        self.l_header_styles
            .get(col)
            .copied()
            .unwrap_or(StyleHandle::DEFAULT)
    }

    /// Style handle of data cell (`row`, `col`), `row` counted from the first data row.
    pub fn cell_style_at(&self, row: usize, col: usize) -> StyleHandle {
        self.l_row_styles
            .get(row)
            .and_then(|l| l.get(col))
            .copied()
            .unwrap_or(StyleHandle::DEFAULT)
    }

    /// Template style of data column `col`: the style found at sheet row 2.
    pub fn template_style_at(&self, col: usize) -> StyleHandle {
        self.l_template_styles
            .get(col)
            .copied()
            .unwrap_or(StyleHandle::DEFAULT)
    }

    /// Resolve a handle issued by this model's registry.
    pub fn resolve_style(&self, handle: StyleHandle) -> &SpecCellStyle {
        self.registry.resolve_or_default(handle)
    }

    /// Column width in character units, if set in the source.
    pub fn column_width(&self, col: usize) -> Option<f64> {
        u16::try_from(col)
            .ok()
            .and_then(|c| self.dict_col_widths.get(&c).copied())
    }

    /// Row height in points of zero-based sheet row `row` (0 is the header).
    pub fn row_height(&self, row: usize) -> Option<f64> {
        u32::try_from(row)
            .ok()
            .and_then(|r| self.dict_row_heights.get(&r).copied())
    }

    /// Materialize all rows as a dataset.
    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows: self.rows.clone(),
        }
    }

    /// Values of column `col` in row order.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &EnumCellValue> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(col).unwrap_or(&EnumCellValue::None))
    }
}

/// Output rows of one partition or merge step; carries no styles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    /// Output column names.
    pub columns: Vec<String>,
    /// Output rows in final order.
    pub rows: Vec<Vec<EnumCellValue>>,
}

impl Dataset {
    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in `columns`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::WorkbookModel;
    use crate::registry::{StyleHandle, StyleRegistry};
    use crate::spec::{EnumCellValue, SpecCellStyle};

    #[test]
    fn test_style_lookup_falls_back_to_default() {
        let mut registry = StyleRegistry::new();
        let mut bold = SpecCellStyle::default();
        bold.font.bold = true;
        let h_bold = registry.intern(&bold);

        let model = WorkbookModel {
            columns: vec!["ID".to_string(), "Dept".to_string()],
            rows: vec![vec![EnumCellValue::Number(1.0), EnumCellValue::None]],
            l_row_styles: vec![vec![h_bold, StyleHandle::DEFAULT]],
            l_header_styles: vec![h_bold],
            l_template_styles: vec![h_bold],
            registry,
            dict_col_widths: BTreeMap::from([(1, 12.5)]),
            ..Default::default()
        };

        assert_eq!(model.header_style_at(0), h_bold);
        assert_eq!(model.header_style_at(1), StyleHandle::DEFAULT);
        assert_eq!(model.cell_style_at(5, 0), StyleHandle::DEFAULT);
        assert!(model.resolve_style(model.template_style_at(0)).font.bold);
        assert_eq!(model.column_width(1), Some(12.5));
        assert_eq!(model.column_width(0), None);
        assert_eq!(model.column_index("Dept"), Some(1));
    }
}
