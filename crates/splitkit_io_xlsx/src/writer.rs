//! XLSX writer kernel that emits one dataset as a styled single-sheet workbook.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatDiagonalBorder, FormatPattern, FormatUnderline,
    Url, Workbook, Worksheet,
};

use crate::conf::{
    C_NUM_FORMAT_GENERAL, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_INDEXED_COLORS,
    TUP_THEME_SHADE_TINTS,
};
use crate::model::{Dataset, WorkbookModel};
use crate::observe::{ObserveStep, StepTimer};
use crate::registry::{StyleHandle, StyleRegistry};
use crate::spec::{
    EnumCellValue, EnumColor, EnumUnderline, SpecBorderSide, SpecCellStyle, SpecXlsxReport,
    SpecXlsxWriteOptions, XlsxWriteError,
};
use crate::util::{cast_col_num, cast_row_num, derive_xlsx_error_text, sanitize_sheet_name};

/// Writer-local style cache: source styles are re-interned here and turned
/// into rust_xlsxwriter formats once per distinct style.
#[derive(Default)]
struct FormatCache {
    registry: StyleRegistry,
    dict_formats: HashMap<StyleHandle, Format>,
}

impl FormatCache {
    fn derive_format(&mut self, style: &SpecCellStyle) -> Format {
        let handle = self.registry.intern(style);
        self.dict_formats
            .entry(handle)
            .or_insert_with(|| derive_rust_xlsx_format(style))
            .clone()
    }
}

/// Resolved per-output-column write plan.
struct SpecColumnPlan {
    fmt_header: Format,
    link_header: Option<String>,
    fmt_data: Format,
    link_data: Option<String>,
}

/// Stateful single-sheet workbook writer bound to one output path.
///
/// Each writer owns its own [`StyleRegistry`], so writers running on
/// different threads never share mutable style state.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    write_options: SpecXlsxWriteOptions,
    cache: FormatCache,
    report: SpecXlsxReport,
    if_written: bool,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(path_file_out: impl Into<PathBuf>, write_options: SpecXlsxWriteOptions) -> Self {
        Self {
            path_file_out: path_file_out.into(),
            workbook: Workbook::new(),
            write_options,
            cache: FormatCache::default(),
            report: SpecXlsxReport::default(),
            if_written: false,
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Return snapshot of the write report.
    pub fn report(&self) -> SpecXlsxReport {
        self.report.clone()
    }

    /// Write `dataset` as the workbook's only sheet, styled after `style_source`.
    ///
    /// Order: dimensions, merged ranges, header row, data rows. Data cells take
    /// the style of the source's first data row in the same column.
    pub fn write_dataset(
        &mut self,
        dataset: &Dataset,
        style_source: &WorkbookModel,
        observer: &dyn ObserveStep,
    ) -> Result<(), XlsxWriteError> {
        if self.if_closed {
            return Err(XlsxWriteError::Xlsx("Cannot write after close().".to_string()));
        }
        if self.if_written {
            return Err(XlsxWriteError::Xlsx(
                "Writer already holds a sheet; one dataset per output.".to_string(),
            ));
        }
        validate_dataset_limits(dataset)?;

        let timer = StepTimer::start("write_dataset", observer);
        let if_preserve = self.write_options.if_preserve_format;
        let sheet_name = sanitize_sheet_name(&style_source.sheet_name, "_");

        let l_plans: Vec<SpecColumnPlan> = if if_preserve {
            dataset
                .columns
                .iter()
                .map(|c_name| derive_column_plan(&mut self.cache, style_source, c_name))
                .collect()
        } else {
            Vec::new()
        };

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name).map_err(map_xlsx_error)?;
        self.report.sheet_name = sheet_name;

        if if_preserve && self.write_options.if_copy_dimensions {
            copy_dimensions(worksheet, style_source, &mut self.report);
        }
        if if_preserve && self.write_options.if_copy_merges {
            copy_merged_ranges(worksheet, style_source, &mut self.cache, &mut self.report);
        }

        let mut n_links_failed = 0usize;
        for (n_col, c_name) in dataset.columns.iter().enumerate() {
            let value = EnumCellValue::String(c_name.clone());
            match l_plans.get(n_col) {
                Some(plan) => {
                    n_links_failed += write_cell(
                        worksheet,
                        0,
                        n_col,
                        &value,
                        Some(&plan.fmt_header),
                        plan.link_header.as_deref(),
                    )?
                }
                None => {
                    write_cell(worksheet, 0, n_col, &value, None, None)?;
                }
            }
        }

        for (n_idx_row, row) in dataset.rows.iter().enumerate() {
            for (n_col, value) in row.iter().enumerate().take(dataset.columns.len()) {
                let plan = l_plans.get(n_col);
                n_links_failed += write_cell(
                    worksheet,
                    n_idx_row + 1,
                    n_col,
                    value,
                    plan.map(|p| &p.fmt_data),
                    plan.and_then(|p| p.link_data.as_deref()),
                )?;
            }
        }
        if n_links_failed > 0 {
            self.report.warn(format!(
                "{n_links_failed} hyperlinks could not be written; values kept as text."
            ));
        }

        self.report.n_rows = dataset.n_rows();
        self.report.n_cols = dataset.columns.len();
        self.report.n_styles = self.cache.registry.len();
        self.if_written = true;
        timer.finish(&format!("{} rows={}", self.file_out(), dataset.n_rows()));
        Ok(())
    }

    /// Flush workbook to disk. Idempotent.
    ///
    /// A failed save removes any partially written file.
    pub fn close(&mut self) -> Result<SpecXlsxReport, XlsxWriteError> {
        if self.if_closed {
            return Ok(self.report());
        }
        if let Err(err) = self.workbook.save(&self.path_file_out) {
            if self.path_file_out.exists() {
                let _ = std::fs::remove_file(&self.path_file_out);
            }
            return Err(map_xlsx_error(err));
        }
        self.if_closed = true;
        Ok(self.report())
    }
}

/// Write `dataset` to `path_file_out` in one call.
pub fn write_dataset_file(
    dataset: &Dataset,
    style_source: &WorkbookModel,
    path_file_out: &Path,
    write_options: &SpecXlsxWriteOptions,
    observer: &dyn ObserveStep,
) -> Result<SpecXlsxReport, XlsxWriteError> {
    let mut writer = XlsxWriter::new(path_file_out, write_options.clone());
    writer.write_dataset(dataset, style_source, observer)?;
    writer.close()
}

fn validate_dataset_limits(dataset: &Dataset) -> Result<(), XlsxWriteError> {
    if dataset.columns.len() > N_NCOLS_EXCEL_MAX {
        return Err(XlsxWriteError::LimitExceeded(format!(
            "{} columns > {N_NCOLS_EXCEL_MAX}",
            dataset.columns.len()
        )));
    }
    if dataset.n_rows() + 1 > N_NROWS_EXCEL_MAX {
        return Err(XlsxWriteError::LimitExceeded(format!(
            "{} data rows + header > {N_NROWS_EXCEL_MAX}",
            dataset.n_rows()
        )));
    }
    Ok(())
}

fn derive_column_plan(cache: &mut FormatCache, style_source: &WorkbookModel, c_name: &str) -> SpecColumnPlan {
    let Some(n_col_src) = style_source.column_index(c_name) else {
        return SpecColumnPlan {
            fmt_header: Format::new(),
            link_header: None,
            fmt_data: Format::new(),
            link_data: None,
        };
    };
    let style_header = style_source.resolve_style(style_source.header_style_at(n_col_src));
    let style_data = style_source.resolve_style(style_source.template_style_at(n_col_src));
    SpecColumnPlan {
        fmt_header: cache.derive_format(style_header),
        link_header: style_header.hyperlink.clone(),
        fmt_data: cache.derive_format(style_data),
        link_data: style_data.hyperlink.clone(),
    }
}

fn copy_dimensions(worksheet: &mut Worksheet, style_source: &WorkbookModel, report: &mut SpecXlsxReport) {
    for (n_col, n_width) in &style_source.dict_col_widths {
        if let Err(err) = worksheet.set_column_width(*n_col, *n_width) {
            report.warn(format!("Column width of column {n_col} not copied: {err}"));
        }
    }
    for (n_row, n_height) in &style_source.dict_row_heights {
        if let Err(err) = worksheet.set_row_height(*n_row, *n_height) {
            report.warn(format!("Height of row {} not copied: {err}", n_row + 1));
        }
    }
}

/// Copy merged ranges verbatim; ranges past the last written row stay as-is.
fn copy_merged_ranges(
    worksheet: &mut Worksheet,
    style_source: &WorkbookModel,
    cache: &mut FormatCache,
    report: &mut SpecXlsxReport,
) {
    for range in &style_source.l_merged_ranges {
        if range.is_single_cell() {
            report.warn(format!("Single-cell merge {range} skipped."));
            continue;
        }
        let handle = match range.row_first {
            0 => style_source.header_style_at(range.col_first as usize),
            _ => style_source.template_style_at(range.col_first as usize),
        };
        let fmt = cache.derive_format(&style_source.resolve_style(handle).with_hyperlink(None));
        match worksheet.merge_range(
            range.row_first,
            range.col_first,
            range.row_last,
            range.col_last,
            "",
            &fmt,
        ) {
            Ok(_) => report.n_merges += 1,
            Err(err) => report.warn(format!("Merged range {range} not copied: {err}")),
        }
    }
}

/// Write one cell; returns `1` when a hyperlink had to be dropped.
fn write_cell(
    worksheet: &mut Worksheet,
    n_row: usize,
    n_col: usize,
    value: &EnumCellValue,
    format: Option<&Format>,
    link: Option<&str>,
) -> Result<usize, XlsxWriteError> {
    let row = cast_row_num(n_row).map_err(XlsxWriteError::LimitExceeded)?;
    let col = cast_col_num(n_col).map_err(XlsxWriteError::LimitExceeded)?;

    if let (Some(c_link), EnumCellValue::String(c_text), Some(fmt)) = (link, value, format) {
        let url = Url::new(c_link).set_text(c_text);
        if worksheet.write_url_with_format(row, col, url, fmt).is_ok() {
            return Ok(0);
        }
        worksheet
            .write_string_with_format(row, col, c_text, fmt)
            .map_err(map_xlsx_error)?;
        return Ok(1);
    }

    match (value, format) {
        (EnumCellValue::None, Some(fmt)) => {
            worksheet.write_blank(row, col, fmt).map_err(map_xlsx_error)?;
        }
        (EnumCellValue::None, None) => {}
        (EnumCellValue::String(val), Some(fmt)) => {
            worksheet
                .write_string_with_format(row, col, val, fmt)
                .map_err(map_xlsx_error)?;
        }
        (EnumCellValue::String(val), None) => {
            worksheet.write_string(row, col, val).map_err(map_xlsx_error)?;
        }
        (EnumCellValue::Number(val), Some(fmt)) => {
            worksheet
                .write_number_with_format(row, col, *val, fmt)
                .map_err(map_xlsx_error)?;
        }
        (EnumCellValue::Number(val), None) => {
            worksheet.write_number(row, col, *val).map_err(map_xlsx_error)?;
        }
        (EnumCellValue::Boolean(val), Some(fmt)) => {
            worksheet
                .write_boolean_with_format(row, col, *val, fmt)
                .map_err(map_xlsx_error)?;
        }
        (EnumCellValue::Boolean(val), None) => {
            worksheet.write_boolean(row, col, *val).map_err(map_xlsx_error)?;
        }
    }
    Ok(0)
}

fn map_xlsx_error(err: rust_xlsxwriter::XlsxError) -> XlsxWriteError {
    XlsxWriteError::Xlsx(derive_xlsx_error_text(err))
}

////////////////////////////////////////////////////////////////////////////////
// #region FormatConversion

/// Build a rust_xlsxwriter [`Format`] reproducing `style`.
pub fn derive_rust_xlsx_format(style: &SpecCellStyle) -> Format {
    let mut format = Format::new();

    let font = &style.font;
    if let Some(val) = &font.name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = font.size {
        format = format.set_font_size(val);
    }
    if font.bold {
        format = format.set_bold();
    }
    if font.italic {
        format = format.set_italic();
    }
    if let Some(underline) = derive_format_underline(font.underline) {
        format = format.set_underline(underline);
    }
    if font.strike {
        format = format.set_font_strikethrough();
    }
    if let Some(color) = font.color.as_ref().and_then(derive_rust_xlsx_color) {
        format = format.set_font_color(color);
    }

    if let Some(pattern) = style.fill.pattern.as_deref().and_then(derive_format_pattern) {
        format = format.set_pattern(pattern);
        if let Some(color) = style.fill.fg_color.as_ref().and_then(derive_rust_xlsx_color) {
            format = format.set_foreground_color(color);
        }
        // indexed 64 is the implicit system background of solid fills
        if let Some(color) = style
            .fill
            .bg_color
            .as_ref()
            .filter(|c| **c != EnumColor::Indexed(64))
            .and_then(derive_rust_xlsx_color)
        {
            format = format.set_background_color(color);
        }
    }

    let border = &style.border;
    if let Some((kind, color)) = derive_border_side(&border.left) {
        format = format.set_border_left(kind);
        if let Some(color) = color {
            format = format.set_border_left_color(color);
        }
    }
    if let Some((kind, color)) = derive_border_side(&border.right) {
        format = format.set_border_right(kind);
        if let Some(color) = color {
            format = format.set_border_right_color(color);
        }
    }
    if let Some((kind, color)) = derive_border_side(&border.top) {
        format = format.set_border_top(kind);
        if let Some(color) = color {
            format = format.set_border_top_color(color);
        }
    }
    if let Some((kind, color)) = derive_border_side(&border.bottom) {
        format = format.set_border_bottom(kind);
        if let Some(color) = color {
            format = format.set_border_bottom_color(color);
        }
    }
    let diagonal_type = match (border.diagonal_up, border.diagonal_down) {
        (true, true) => Some(FormatDiagonalBorder::BorderUpDown),
        (true, false) => Some(FormatDiagonalBorder::BorderUp),
        (false, true) => Some(FormatDiagonalBorder::BorderDown),
        (false, false) => None,
    };
    if let (Some(diagonal_type), Some((kind, color))) =
        (diagonal_type, derive_border_side(&border.diagonal))
    {
        format = format.set_border_diagonal(kind).set_border_diagonal_type(diagonal_type);
        if let Some(color) = color {
            format = format.set_border_diagonal_color(color);
        }
    }

    let alignment = &style.alignment;
    if let Some(align) = alignment.horizontal.as_deref().and_then(derive_format_align) {
        format = format.set_align(align);
    }
    if let Some(align) = alignment.vertical.as_deref().and_then(derive_format_valign) {
        format = format.set_align(align);
    }
    if alignment.wrap_text {
        format = format.set_text_wrap();
    }
    if alignment.rotation != 0 {
        format = format.set_rotation(derive_rotation(alignment.rotation));
    }
    if alignment.indent > 0 {
        format = format.set_indent(alignment.indent);
    }

    if let Some(n_index) = style.number_format_index {
        format = format.set_num_format_index(n_index);
    } else if style.number_format != C_NUM_FORMAT_GENERAL && !style.number_format.is_empty() {
        format = format.set_num_format(style.number_format.clone());
    }

    format
}

/// Map a stored colour to rust_xlsxwriter; `None` leaves the writer default.
pub fn derive_rust_xlsx_color(color: &EnumColor) -> Option<Color> {
    match color {
        EnumColor::Rgb(val) => Some(Color::RGB(*val)),
        EnumColor::Theme { id, tint } => {
            let n_id = u8::try_from(*id).ok().filter(|n| *n <= 9)?;
            let n_tint = tint
                .as_deref()
                .and_then(|t| t.trim().parse::<f64>().ok())
                .unwrap_or(0.0);
            Some(Color::Theme(n_id, derive_theme_shade(n_id, n_tint)))
        }
        // 64 and above are system colours, which are the writer defaults
        EnumColor::Indexed(n_idx) => TUP_INDEXED_COLORS
            .get(*n_idx as usize)
            .map(|val| Color::RGB(*val)),
        EnumColor::Auto => None,
    }
}

/// Nearest theme shade (0-5) for a tint; the two base text/background
/// colours use the darkening/lightening ladders of the Excel palette.
fn derive_theme_shade(n_id: u8, n_tint: f64) -> u8 {
    const TUP_TINTS_WHITE: [f64; 6] = [0.0, -0.05, -0.15, -0.25, -0.35, -0.5];
    const TUP_TINTS_BLACK: [f64; 6] = [0.0, 0.5, 0.35, 0.25, 0.15, 0.05];
    let l_tints = match n_id {
        0 => &TUP_TINTS_WHITE,
        1 => &TUP_TINTS_BLACK,
        _ => &TUP_THEME_SHADE_TINTS,
    };
    let mut n_best = 0usize;
    for (n_idx, n_candidate) in l_tints.iter().enumerate() {
        if (n_candidate - n_tint).abs() < (l_tints[n_best] - n_tint).abs() {
            n_best = n_idx;
        }
    }
    n_best as u8
}

fn derive_border_side(side: &SpecBorderSide) -> Option<(FormatBorder, Option<Color>)> {
    let kind = derive_format_border(side.style.as_deref()?)?;
    Some((kind, side.color.as_ref().and_then(derive_rust_xlsx_color)))
}

fn derive_format_border(border: &str) -> Option<FormatBorder> {
    match border {
        "thin" => Some(FormatBorder::Thin),
        "medium" => Some(FormatBorder::Medium),
        "dashed" => Some(FormatBorder::Dashed),
        "dotted" => Some(FormatBorder::Dotted),
        "thick" => Some(FormatBorder::Thick),
        "double" => Some(FormatBorder::Double),
        "hair" => Some(FormatBorder::Hair),
        "mediumDashed" => Some(FormatBorder::MediumDashed),
        "dashDot" => Some(FormatBorder::DashDot),
        "mediumDashDot" => Some(FormatBorder::MediumDashDot),
        "dashDotDot" => Some(FormatBorder::DashDotDot),
        "mediumDashDotDot" => Some(FormatBorder::MediumDashDotDot),
        "slantDashDot" => Some(FormatBorder::SlantDashDot),
        _ => None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align {
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "centerContinuous" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        _ => None,
    }
}

fn derive_format_valign(align: &str) -> Option<FormatAlign> {
    match align {
        "top" => Some(FormatAlign::Top),
        "center" => Some(FormatAlign::VerticalCenter),
        "bottom" => Some(FormatAlign::Bottom),
        "justify" => Some(FormatAlign::VerticalJustify),
        "distributed" => Some(FormatAlign::VerticalDistributed),
        _ => None,
    }
}

fn derive_format_pattern(pattern: &str) -> Option<FormatPattern> {
    match pattern {
        "solid" => Some(FormatPattern::Solid),
        "mediumGray" => Some(FormatPattern::MediumGray),
        "darkGray" => Some(FormatPattern::DarkGray),
        "lightGray" => Some(FormatPattern::LightGray),
        "darkHorizontal" => Some(FormatPattern::DarkHorizontal),
        "darkVertical" => Some(FormatPattern::DarkVertical),
        "darkDown" => Some(FormatPattern::DarkDown),
        "darkUp" => Some(FormatPattern::DarkUp),
        "darkGrid" => Some(FormatPattern::DarkGrid),
        "darkTrellis" => Some(FormatPattern::DarkTrellis),
        "lightHorizontal" => Some(FormatPattern::LightHorizontal),
        "lightVertical" => Some(FormatPattern::LightVertical),
        "lightDown" => Some(FormatPattern::LightDown),
        "lightUp" => Some(FormatPattern::LightUp),
        "lightGrid" => Some(FormatPattern::LightGrid),
        "lightTrellis" => Some(FormatPattern::LightTrellis),
        "gray125" => Some(FormatPattern::Gray125),
        "gray0625" => Some(FormatPattern::Gray0625),
        _ => None,
    }
}

fn derive_format_underline(underline: EnumUnderline) -> Option<FormatUnderline> {
    match underline {
        EnumUnderline::None => None,
        EnumUnderline::Single => Some(FormatUnderline::Single),
        EnumUnderline::Double => Some(FormatUnderline::Double),
        EnumUnderline::SingleAccounting => Some(FormatUnderline::SingleAccounting),
        EnumUnderline::DoubleAccounting => Some(FormatUnderline::DoubleAccounting),
    }
}

/// `textRotation` (0-90 up, 91-180 down, 255 stacked) to signed degrees.
fn derive_rotation(n_rotation: u16) -> i16 {
    match n_rotation {
        255 => 270,
        91..=180 => 90 - n_rotation as i16,
        n => n.min(90) as i16,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_xlsxwriter::{Color as XColor, Format as XFormat, FormatAlign as XAlign, FormatBorder as XBorder};
    use tempfile::tempdir;

    use super::*;
    use crate::observe::NoopObserver;
    use crate::reader::XlsxReader;
    use crate::spec::SpecXlsxReadOptions;

    fn build_source(path: &Path) {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Roster").unwrap();
        let fmt_header = XFormat::new()
            .set_bold()
            .set_font_size(12)
            .set_font_name("Arial")
            .set_background_color(XColor::RGB(0x4472C4))
            .set_font_color(XColor::RGB(0xFFFFFF))
            .set_align(XAlign::Center)
            .set_border(XBorder::Medium);
        let fmt_id = XFormat::new().set_align(XAlign::Right).set_italic();
        let fmt_name = XFormat::new()
            .set_text_wrap()
            .set_align(XAlign::Top)
            .set_border_bottom(XBorder::Dashed)
            .set_border_bottom_color(XColor::RGB(0xFF0000));
        let fmt_salary = XFormat::new().set_num_format("0.00%").set_indent(1);
        let fmt_other = XFormat::new().set_background_color(XColor::RGB(0xFFFF00));

        for (n_col, c_name) in ["ID", "Name", "Salary"].iter().enumerate() {
            worksheet.write_string_with_format(0, n_col as u16, *c_name, &fmt_header).unwrap();
        }
        worksheet.write_number_with_format(1, 0, 1, &fmt_id).unwrap();
        worksheet.write_string_with_format(1, 1, "Ann", &fmt_name).unwrap();
        worksheet.write_number_with_format(1, 2, 0.5, &fmt_salary).unwrap();
        worksheet.write_number_with_format(2, 0, 2, &fmt_other).unwrap();
        worksheet.write_string_with_format(2, 1, "Bob", &fmt_other).unwrap();
        worksheet.write_number_with_format(2, 2, 0.25, &fmt_other).unwrap();

        worksheet.set_column_width(0, 6).unwrap();
        worksheet.set_column_width(1, 20).unwrap();
        worksheet.set_row_height(0, 30).unwrap();
        worksheet.set_row_height(2, 18).unwrap();
        worksheet.merge_range(4, 0, 4, 2, "footer", &XFormat::new()).unwrap();
        workbook.save(path).unwrap();
    }

    fn read_first(path: &Path) -> WorkbookModel {
        XlsxReader::open(path)
            .unwrap()
            .read_sheet(None, &SpecXlsxReadOptions::default(), &NoopObserver)
            .unwrap()
    }

    #[test]
    fn test_write_dataset_copies_header_and_template_styles() {
        let dir = tempdir().unwrap();
        let path_src = dir.path().join("src.xlsx");
        let path_out = dir.path().join("out.xlsx");
        build_source(&path_src);
        let source = read_first(&path_src);

        // reordered projection, rows reversed
        let dataset = Dataset {
            columns: vec!["Salary".to_string(), "ID".to_string()],
            rows: vec![
                vec![EnumCellValue::Number(0.25), EnumCellValue::Number(2.0)],
                vec![EnumCellValue::Number(0.5), EnumCellValue::Number(1.0)],
            ],
        };
        let report = write_dataset_file(
            &dataset,
            &source,
            &path_out,
            &SpecXlsxWriteOptions::default(),
            &NoopObserver,
        )
        .unwrap();
        assert_eq!(report.sheet_name, "Roster");
        assert_eq!(report.n_rows, 2);
        assert_eq!(report.n_merges, 1);

        let output = read_first(&path_out);
        assert_eq!(output.columns, dataset.columns);
        assert_eq!(output.rows, dataset.rows[..].to_vec());

        for (n_col_out, c_name) in output.columns.iter().enumerate() {
            let n_col_src = source.column_index(c_name).unwrap();
            assert_eq!(
                output.resolve_style(output.header_style_at(n_col_out)),
                source.resolve_style(source.header_style_at(n_col_src))
            );
            for n_row in 0..output.n_rows() {
                assert_eq!(
                    output.resolve_style(output.cell_style_at(n_row, n_col_out)),
                    source.resolve_style(source.template_style_at(n_col_src)),
                );
            }
        }
    }

    #[test]
    fn test_write_dataset_copies_dimensions_and_merges_positionally() {
        let dir = tempdir().unwrap();
        let path_src = dir.path().join("src.xlsx");
        let path_out = dir.path().join("out.xlsx");
        build_source(&path_src);
        let source = read_first(&path_src);

        let dataset = Dataset {
            columns: source.columns.clone(),
            rows: vec![source.rows[0].clone()],
        };
        write_dataset_file(&dataset, &source, &path_out, &SpecXlsxWriteOptions::default(), &NoopObserver)
            .unwrap();
        let output = read_first(&path_out);

        assert_eq!(output.dict_col_widths, source.dict_col_widths);
        assert_eq!(output.dict_row_heights, source.dict_row_heights);
        assert_eq!(output.l_merged_ranges, source.l_merged_ranges);
    }

    #[test]
    fn test_write_dataset_without_format_writes_values_only() {
        let dir = tempdir().unwrap();
        let path_src = dir.path().join("src.xlsx");
        let path_out = dir.path().join("plain.xlsx");
        build_source(&path_src);
        let source = read_first(&path_src);

        let options = SpecXlsxWriteOptions {
            if_preserve_format: false,
            ..Default::default()
        };
        write_dataset_file(&source.to_dataset(), &source, &path_out, &options, &NoopObserver).unwrap();
        let output = read_first(&path_out);

        assert_eq!(output.rows[..2].to_vec(), source.rows[..2].to_vec());
        assert!(output.l_merged_ranges.is_empty());
        assert!(output.dict_col_widths.is_empty());
        assert!(!output.resolve_style(output.header_style_at(0)).font.bold);
    }

    #[test]
    fn test_writer_rejects_second_dataset_and_reports_styles() {
        let dir = tempdir().unwrap();
        let path_src = dir.path().join("src.xlsx");
        build_source(&path_src);
        let source = read_first(&path_src);

        let mut writer = XlsxWriter::new(dir.path().join("one.xlsx"), SpecXlsxWriteOptions::default());
        writer.write_dataset(&source.to_dataset(), &source, &NoopObserver).unwrap();
        assert!(writer.write_dataset(&source.to_dataset(), &source, &NoopObserver).is_err());
        let report = writer.close().unwrap();
        assert!(report.n_styles >= 4);
        assert!(dir.path().join("one.xlsx").exists());
        // idempotent
        assert!(writer.close().is_ok());
    }

    #[test]
    fn test_failed_save_is_reported() {
        let dir = tempdir().unwrap();
        let path_src = dir.path().join("src.xlsx");
        build_source(&path_src);
        let source = read_first(&path_src);

        let path_out = dir.path().join("missing_dir").join("out.xlsx");
        let err = write_dataset_file(
            &source.to_dataset(),
            &source,
            &path_out,
            &SpecXlsxWriteOptions::default(),
            &NoopObserver,
        )
        .unwrap_err();
        assert!(matches!(err, XlsxWriteError::Xlsx(_)));
        assert!(!path_out.exists());
    }

    #[test]
    fn test_builtin_number_formats_keep_their_ids() {
        let dir = tempdir().unwrap();
        let path_src = dir.path().join("dates.xlsx");
        let path_out = dir.path().join("out.xlsx");
        let l_ids: [u8; 4] = [14, 31, 44, 57];
        {
            let mut workbook = Workbook::new();
            let worksheet = workbook.add_worksheet();
            for (n_col, n_id) in l_ids.iter().enumerate() {
                let fmt = XFormat::new().set_num_format_index(*n_id);
                worksheet.write_string(0, n_col as u16, format!("F{n_id}")).unwrap();
                worksheet.write_number_with_format(1, n_col as u16, 45_000.5, &fmt).unwrap();
            }
            workbook.save(&path_src).unwrap();
        }
        let source = read_first(&path_src);
        for (n_col, n_id) in l_ids.iter().enumerate() {
            let style = source.resolve_style(source.template_style_at(n_col));
            assert_eq!(style.number_format_index, Some(*n_id));
            assert_ne!(style.number_format, "General");
        }
        assert_eq!(
            source.resolve_style(source.template_style_at(1)).number_format,
            "yyyy\"年\"m\"月\"d\"日\""
        );

        write_dataset_file(
            &source.to_dataset(),
            &source,
            &path_out,
            &SpecXlsxWriteOptions::default(),
            &NoopObserver,
        )
        .unwrap();
        let output = read_first(&path_out);
        for n_col in 0..l_ids.len() {
            assert_eq!(
                output.resolve_style(output.cell_style_at(0, n_col)),
                source.resolve_style(source.template_style_at(n_col))
            );
        }
    }

    #[test]
    fn test_derive_rotation_and_theme_shade() {
        assert_eq!(derive_rotation(45), 45);
        assert_eq!(derive_rotation(135), -45);
        assert_eq!(derive_rotation(255), 270);
        assert_eq!(derive_theme_shade(4, 0.59999389629810485), 2);
        assert_eq!(derive_theme_shade(4, -0.249977111117893), 4);
        assert_eq!(derive_theme_shade(0, -0.1499984740745262), 2);
        assert_eq!(derive_theme_shade(1, 0.0), 0);
    }
}
