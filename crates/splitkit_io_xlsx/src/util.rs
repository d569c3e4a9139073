//! Stateless helper utilities shared by the reader and writer kernels.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use rust_xlsxwriter::XlsxError;

use crate::conf::{
    C_LABEL_BLANK, N_LEN_EXCEL_SHEET_NAME_MAX, N_PX_COLUMN_PADDING, N_PX_MAX_DIGIT_WIDTH,
    TUP_EXCEL_ILLEGAL, TUP_PATH_UNSAFE,
};
use crate::spec::SpecCellRange;

static RE_CELL_REF: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$").ok());

////////////////////////////////////////////////////////////////////////////////
// #region NameNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Make a label safe to use as a file name component.
///
/// Path separators and `:` become `_`; an empty label becomes `(blank)`.
pub fn sanitize_label(label: &str) -> String {
    let mut c_label = label.to_string();
    for c_unsafe in TUP_PATH_UNSAFE {
        c_label = c_label.replace(c_unsafe, "_");
    }
    if c_label.trim().is_empty() {
        return C_LABEL_BLANK.to_string();
    }
    c_label
}

/// Turn raw header texts into unique column names.
///
/// Empty headers become `Unnamed: {idx}`; repeats get `.1`, `.2`, ... suffixes.
pub fn derive_unique_column_names(l_raw: &[String]) -> Vec<String> {
    let mut set_seen: BTreeSet<String> = BTreeSet::new();
    let mut l_names = Vec::with_capacity(l_raw.len());
    for (n_idx, c_raw) in l_raw.iter().enumerate() {
        let c_base = if c_raw.trim().is_empty() {
            format!("Unnamed: {n_idx}")
        } else {
            c_raw.clone()
        };
        let mut c_name = c_base.clone();
        let mut n_dup = 1;
        while set_seen.contains(&c_name) {
            c_name = format!("{c_base}.{n_dup}");
            n_dup += 1;
        }
        set_seen.insert(c_name.clone());
        l_names.push(c_name);
    }
    l_names
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellReference

/// Convert a zero-based column index to letters (`0` -> `A`, `27` -> `AB`).
pub fn convert_col_to_letters(col: u16) -> String {
    let mut n_col = col as u32 + 1;
    let mut l_chars = Vec::new();
    while n_col > 0 {
        let n_rem = (n_col - 1) % 26;
        l_chars.push((b'A' + n_rem as u8) as char);
        n_col = (n_col - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

/// Parse `A1`-style reference into zero-based `(row, col)`.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u16)> {
    let caps = RE_CELL_REF.as_ref()?.captures(cell_ref.trim())?;
    let c_letters = caps.get(1)?.as_str();
    let n_row: u32 = caps.get(2)?.as_str().parse().ok()?;
    if n_row == 0 {
        return None;
    }

    let mut n_col: u32 = 0;
    for ch in c_letters.bytes() {
        n_col = n_col * 26 + (ch.to_ascii_uppercase() - b'A') as u32 + 1;
    }
    let n_col = u16::try_from(n_col - 1).ok()?;
    Some((n_row - 1, n_col))
}

/// Parse `A1:C3` (or a single `A1`) into a normalized range.
pub fn parse_cell_range(c_range: &str) -> Option<SpecCellRange> {
    let (c_first, c_last) = c_range.split_once(':').unwrap_or((c_range, c_range));
    let (r1, c1) = parse_cell_ref(c_first)?;
    let (r2, c2) = parse_cell_ref(c_last)?;
    Some(SpecCellRange {
        row_first: r1.min(r2),
        col_first: c1.min(c2),
        row_last: r1.max(r2),
        col_last: c1.max(c2),
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Dimensions

/// Convert a `<col width>` attribute to Excel character units.
///
/// Inverse of the character-to-pixel conversion applied by `set_column_width`,
/// so widths survive a read/write round trip unchanged at the XML level.
pub fn convert_width_xml_to_chars(width_xml: f64) -> f64 {
    let n_px = (width_xml * N_PX_MAX_DIGIT_WIDTH).round();
    if n_px >= N_PX_MAX_DIGIT_WIDTH + N_PX_COLUMN_PADDING {
        (n_px - N_PX_COLUMN_PADDING) / N_PX_MAX_DIGIT_WIDTH
    } else {
        n_px / (N_PX_MAX_DIGIT_WIDTH + N_PX_COLUMN_PADDING)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Casting

/// Cast row index for rust_xlsxwriter.
pub fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

/// Cast column index for rust_xlsxwriter.
pub fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

/// Render rust_xlsxwriter errors as text.
pub fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_label_replaces_path_unsafe_chars() {
        assert_eq!(sanitize_label("R&D/QA"), "R&D_QA");
        assert_eq!(sanitize_label("a\\b:c"), "a_b_c");
        assert_eq!(sanitize_label(""), "(blank)");
    }

    #[test]
    fn test_sanitize_sheet_name_caps_length() {
        assert_eq!(sanitize_sheet_name("a[b]c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_derive_unique_column_names() {
        let l_raw = vec![
            "ID".to_string(),
            "".to_string(),
            "ID".to_string(),
            "ID".to_string(),
        ];
        assert_eq!(
            derive_unique_column_names(&l_raw),
            vec!["ID", "Unnamed: 1", "ID.1", "ID.2"]
        );
    }

    #[test]
    fn test_cell_ref_parse_and_letters() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("$AB$10"), Some((9, 27)));
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(convert_col_to_letters(0), "A");
        assert_eq!(convert_col_to_letters(25), "Z");
        assert_eq!(convert_col_to_letters(26), "AA");
        assert_eq!(convert_col_to_letters(16_383), "XFD");

        let range = parse_cell_range("C3:A1").unwrap();
        assert_eq!((range.row_first, range.col_first, range.row_last, range.col_last), (0, 0, 2, 2));
    }

    #[test]
    fn test_convert_width_xml_to_chars_inverts_writer_conversion() {
        // 12.5 chars -> 93 px -> stored as 13.28515625
        let n_chars = convert_width_xml_to_chars(13.28515625);
        let n_px = (n_chars * 7.0).round() + 5.0;
        assert_eq!(n_px, 93.0);
        assert!((convert_width_xml_to_chars(9.140625) - 8.43).abs() < 0.01);
    }
}
