//! XLSX reader kernel that loads one sheet into a [`WorkbookModel`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::conf::N_NCOLS_EXCEL_MAX;
use crate::model::WorkbookModel;
use crate::observe::{ObserveStep, StepTimer};
use crate::parse::{
    SpecRelationship, SpecSheetEntry, attr_f64, attr_string, attr_string_qualified, attr_u32,
    parse_relationships, parse_shared_strings, parse_styles, parse_workbook_sheets,
    resolve_part_path,
};
use crate::registry::{StyleHandle, StyleRegistry};
use crate::spec::{EnumCellValue, SpecCellRange, SpecCellStyle, SpecXlsxReadOptions, XlsxReadError};
use crate::util::{
    convert_width_xml_to_chars, derive_unique_column_names, parse_cell_range, parse_cell_ref,
};

trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

enum EnumXlsxSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

/// Sheet listed in the workbook with its resolved part path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetPart {
    /// Display name.
    pub name: String,
    /// Part path inside the package, e.g. `xl/worksheets/sheet1.xml`.
    pub path_part: String,
}

/// Read-only spreadsheet reader bound to a file path or an in-memory buffer.
///
/// Opening parses the workbook-level parts once; each [`Self::read_sheet`] call
/// re-opens the package and parses only the requested worksheet.
pub struct XlsxReader {
    label: String,
    source: EnumXlsxSource,
    n_size_bytes: u64,
    l_sheets: Vec<SpecSheetPart>,
    l_shared_strings: Vec<String>,
    l_xf_styles: Vec<SpecCellStyle>,
}

impl XlsxReader {
    /// Open a spreadsheet file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, XlsxReadError> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let n_size_bytes = std::fs::metadata(path)
            .map_err(|err| XlsxReadError::Io {
                path: label.clone(),
                message: err.to_string(),
            })?
            .len();
        Self::init(label, EnumXlsxSource::Path(path.to_path_buf()), n_size_bytes)
    }

    /// Open a spreadsheet held in memory; `label` names it in errors and logs.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, label: impl Into<String>) -> Result<Self, XlsxReadError> {
        let v_bytes: Arc<[u8]> = Arc::from(bytes.into());
        let n_size_bytes = v_bytes.len() as u64;
        Self::init(label.into(), EnumXlsxSource::Bytes(v_bytes), n_size_bytes)
    }

    fn init(label: String, source: EnumXlsxSource, n_size_bytes: u64) -> Result<Self, XlsxReadError> {
        let mut reader = Self {
            label,
            source,
            n_size_bytes,
            l_sheets: Vec::new(),
            l_shared_strings: Vec::new(),
            l_xf_styles: Vec::new(),
        };
        let mut archive = reader.open_archive()?;

        let l_entries: Vec<SpecSheetEntry> = reader
            .parse_part(&mut archive, "xl/workbook.xml", parse_workbook_sheets)?
            .ok_or_else(|| reader.derive_format_error("missing xl/workbook.xml"))?;
        let dict_rels: HashMap<String, SpecRelationship> = reader
            .parse_part(&mut archive, "xl/_rels/workbook.xml.rels", parse_relationships)?
            .unwrap_or_default();

        reader.l_sheets = l_entries
            .into_iter()
            .map(|entry| {
                let path_part = dict_rels
                    .get(&entry.rel_id)
                    .map(|rel| resolve_part_path("xl", &rel.target))
                    .unwrap_or_default();
                SpecSheetPart {
                    name: entry.name,
                    path_part,
                }
            })
            .collect();

        let c_path_shared = derive_related_part(&dict_rels, "sharedStrings")
            .unwrap_or_else(|| "xl/sharedStrings.xml".to_string());
        reader.l_shared_strings = reader
            .parse_part(&mut archive, &c_path_shared, parse_shared_strings)?
            .unwrap_or_default();

        let c_path_styles =
            derive_related_part(&dict_rels, "styles").unwrap_or_else(|| "xl/styles.xml".to_string());
        reader.l_xf_styles = reader
            .parse_part(&mut archive, &c_path_styles, parse_styles)?
            .unwrap_or_default();

        log::debug!(
            "Opened {} ({} bytes, {} sheets, {} shared strings, {} cell formats)",
            reader.label,
            reader.n_size_bytes,
            reader.l_sheets.len(),
            reader.l_shared_strings.len(),
            reader.l_xf_styles.len()
        );
        Ok(reader)
    }

    /// Input label (path or buffer name).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Size of the underlying document in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.n_size_bytes
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.l_sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Whether the workbook has a sheet called `sheet_name`.
    pub fn has_sheet(&self, sheet_name: &str) -> bool {
        self.l_sheets.iter().any(|s| s.name == sheet_name)
    }

    /// Read one sheet (`None` selects the first) into a [`WorkbookModel`].
    ///
    /// Inputs at or above `options.size_streaming_min_bytes` are parsed straight
    /// from the compressed stream and appended in batches of
    /// `options.n_rows_batch` rows.
    pub fn read_sheet(
        &self,
        sheet_name: Option<&str>,
        options: &SpecXlsxReadOptions,
        observer: &dyn ObserveStep,
    ) -> Result<WorkbookModel, XlsxReadError> {
        let timer = StepTimer::start("read_sheet", observer);
        let sheet = match sheet_name {
            Some(c_name) => self.l_sheets.iter().find(|s| s.name == c_name),
            None => self.l_sheets.first(),
        }
        .ok_or_else(|| XlsxReadError::SheetNotFound {
            path: self.label.clone(),
            sheet: sheet_name.unwrap_or("<first>").to_string(),
        })?;
        if sheet.path_part.is_empty() {
            return Err(self.derive_format_error(&format!(
                "sheet {:?} has no worksheet part",
                sheet.name
            )));
        }

        let mut archive = self.open_archive()?;
        let (c_dir, c_file) = sheet
            .path_part
            .rsplit_once('/')
            .unwrap_or(("", sheet.path_part.as_str()));
        let c_path_rels = format!("{c_dir}/_rels/{c_file}.rels");
        let dict_sheet_rels = self
            .parse_part(&mut archive, &c_path_rels, parse_relationships)?
            .unwrap_or_default();

        let if_streaming =
            options.if_force_streaming || self.n_size_bytes >= options.size_streaming_min_bytes;
        let n_rows_batch = if if_streaming {
            options.n_rows_batch.max(1)
        } else {
            usize::MAX
        };
        if if_streaming {
            log::info!(
                "Streaming sheet {:?} of {} ({:.1} MB) in batches of {} rows",
                sheet.name,
                self.label,
                self.n_size_bytes as f64 / (1024.0 * 1024.0),
                n_rows_batch
            );
        }

        let mut builder = SheetBuilder::new(
            &self.l_shared_strings,
            &self.l_xf_styles,
            &dict_sheet_rels,
            n_rows_batch,
        );
        builder.model.source_label = self.label.clone();
        builder.model.sheet_name = sheet.name.clone();

        let entry = archive
            .by_name(&sheet.path_part)
            .map_err(|err| self.derive_zip_error(&sheet.path_part, err))?;
        if if_streaming {
            builder
                .consume(BufReader::new(entry))
                .map_err(|msg| self.derive_format_error(&msg))?;
        } else {
            let mut v_buf = Vec::new();
            let mut entry = entry;
            entry.read_to_end(&mut v_buf).map_err(|err| XlsxReadError::Io {
                path: self.label.clone(),
                message: err.to_string(),
            })?;
            builder
                .consume(v_buf.as_slice())
                .map_err(|msg| self.derive_format_error(&msg))?;
        }

        let model = builder.finish();
        timer.finish(&format!(
            "{}:{} rows={} cols={}",
            self.label,
            model.sheet_name,
            model.n_rows(),
            model.columns.len()
        ));
        Ok(model)
    }

    fn open_archive(&self) -> Result<ZipArchive<Box<dyn ReadSeek>>, XlsxReadError> {
        let inner: Box<dyn ReadSeek> = match &self.source {
            EnumXlsxSource::Path(path) => {
                let file = File::open(path).map_err(|err| XlsxReadError::Io {
                    path: self.label.clone(),
                    message: err.to_string(),
                })?;
                Box::new(BufReader::new(file))
            }
            EnumXlsxSource::Bytes(v_bytes) => Box::new(Cursor::new(Arc::clone(v_bytes))),
        };
        ZipArchive::new(inner).map_err(|err| self.derive_format_error(&format!("not a zip package: {err}")))
    }

    /// Parse an optional part; `Ok(None)` when the part is absent.
    fn parse_part<T>(
        &self,
        archive: &mut ZipArchive<Box<dyn ReadSeek>>,
        c_part: &str,
        parser: impl FnOnce(Cursor<Vec<u8>>) -> Result<T, String>,
    ) -> Result<Option<T>, XlsxReadError> {
        let mut entry = match archive.by_name(c_part) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(self.derive_zip_error(c_part, err)),
        };
        let mut v_buf = Vec::new();
        entry.read_to_end(&mut v_buf).map_err(|err| XlsxReadError::Io {
            path: self.label.clone(),
            message: format!("{c_part}: {err}"),
        })?;
        parser(Cursor::new(v_buf))
            .map(Some)
            .map_err(|msg| self.derive_format_error(&msg))
    }

    fn derive_format_error(&self, message: &str) -> XlsxReadError {
        XlsxReadError::UnsupportedFormat {
            path: self.label.clone(),
            message: message.to_string(),
        }
    }

    fn derive_zip_error(&self, c_part: &str, err: ZipError) -> XlsxReadError {
        match err {
            ZipError::Io(err) => XlsxReadError::Io {
                path: self.label.clone(),
                message: format!("{c_part}: {err}"),
            },
            other => self.derive_format_error(&format!("{c_part}: {other}")),
        }
    }
}

/// Open `path` and read one sheet.
pub fn read_workbook_model(
    path: impl AsRef<Path>,
    sheet_name: Option<&str>,
    options: &SpecXlsxReadOptions,
    observer: &dyn ObserveStep,
) -> Result<WorkbookModel, XlsxReadError> {
    XlsxReader::open(path)?.read_sheet(sheet_name, options, observer)
}

fn derive_related_part(dict_rels: &HashMap<String, SpecRelationship>, suffix: &str) -> Option<String> {
    dict_rels
        .values()
        .find(|rel| {
            rel.target
                .rsplit('/')
                .next()
                .is_some_and(|c_name| c_name.starts_with(suffix))
        })
        .map(|rel| resolve_part_path("xl", &rel.target))
}

////////////////////////////////////////////////////////////////////////////////
// #region SheetBuilder

#[derive(Debug, Default)]
struct SpecRawCell {
    n_col: u16,
    c_type: Option<String>,
    n_xf: u32,
    c_value: Option<String>,
    c_inline: Option<String>,
}

#[derive(Debug)]
struct SpecRawRow {
    n_row: u32,
    l_values: Vec<EnumCellValue>,
    l_styles: Vec<StyleHandle>,
}

/// Incremental worksheet parser that appends rows in bounded batches.
struct SheetBuilder<'a> {
    l_shared_strings: &'a [String],
    l_xf_styles: &'a [SpecCellStyle],
    dict_sheet_rels: &'a HashMap<String, SpecRelationship>,
    dict_xf_handles: HashMap<u32, StyleHandle>,
    n_rows_batch: usize,
    n_cols: usize,
    if_header_seen: bool,
    l_batch: Vec<SpecRawRow>,
    n_batches: usize,
    n_cells_truncated: usize,
    l_hyperlinks: Vec<(SpecCellRange, String)>,
    model: WorkbookModel,
}

impl<'a> SheetBuilder<'a> {
    fn new(
        l_shared_strings: &'a [String],
        l_xf_styles: &'a [SpecCellStyle],
        dict_sheet_rels: &'a HashMap<String, SpecRelationship>,
        n_rows_batch: usize,
    ) -> Self {
        Self {
            l_shared_strings,
            l_xf_styles,
            dict_sheet_rels,
            dict_xf_handles: HashMap::new(),
            n_rows_batch,
            n_cols: 0,
            if_header_seen: false,
            l_batch: Vec::new(),
            n_batches: 0,
            n_cells_truncated: 0,
            l_hyperlinks: Vec::new(),
            model: WorkbookModel {
                registry: StyleRegistry::new(),
                ..Default::default()
            },
        }
    }

    /// Handle of cell format `n_xf`; formats missing from `styles.xml` fall back to the default style.
    fn derive_xf_handle(&mut self, n_xf: u32) -> StyleHandle {
        if let Some(handle) = self.dict_xf_handles.get(&n_xf) {
            return *handle;
        }
        let handle = match self.l_xf_styles.get(n_xf as usize) {
            Some(style) => self.model.registry.intern(style),
            None => StyleHandle::DEFAULT,
        };
        self.dict_xf_handles.insert(n_xf, handle);
        handle
    }

    fn consume<R: BufRead>(&mut self, reader: R) -> Result<(), String> {
        let mut xml = Reader::from_reader(reader);
        let mut buf = Vec::new();

        let mut n_row_next: u32 = 0;
        let mut current_row: Option<(u32, Vec<SpecRawCell>)> = None;
        let mut current_cell: Option<SpecRawCell> = None;
        let mut if_in_v = false;
        let mut if_in_inline_t = false;

        loop {
            match xml.read_event_into(&mut buf) {
                Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                    let if_empty = matches!(event, Event::Empty(_));
                    match e.local_name().as_ref() {
                        b"col" => {
                            if let (Some(n_min), Some(n_max), Some(n_width)) =
                                (attr_u32(e, b"min"), attr_u32(e, b"max"), attr_f64(e, b"width"))
                            {
                                let n_chars = convert_width_xml_to_chars(n_width);
                                let n_max = n_max.min(N_NCOLS_EXCEL_MAX as u32);
                                for n_col in n_min.max(1)..=n_max {
                                    self.model.dict_col_widths.insert((n_col - 1) as u16, n_chars);
                                }
                            }
                        }
                        b"row" => {
                            let n_row = attr_u32(e, b"r").map(|r| r.saturating_sub(1)).unwrap_or(n_row_next);
                            n_row_next = n_row + 1;
                            if let Some(n_height) = attr_f64(e, b"ht") {
                                self.model.dict_row_heights.insert(n_row, n_height);
                            }
                            if if_empty {
                                self.push_row(n_row, Vec::new());
                            } else {
                                current_row = Some((n_row, Vec::new()));
                            }
                        }
                        b"c" => {
                            let n_col_prev = current_row
                                .as_ref()
                                .and_then(|(_, l)| l.last().map(|c| c.n_col as u32 + 1))
                                .unwrap_or(0);
                            let n_col = attr_string(e, b"r")
                                .and_then(|r| parse_cell_ref(&r))
                                .map(|(_, c)| c)
                                .unwrap_or(n_col_prev as u16);
                            let cell = SpecRawCell {
                                n_col,
                                c_type: attr_string(e, b"t"),
                                n_xf: attr_u32(e, b"s").unwrap_or(0),
                                ..Default::default()
                            };
                            if if_empty {
                                if let Some((_, l_cells)) = current_row.as_mut() {
                                    l_cells.push(cell);
                                }
                            } else {
                                current_cell = Some(cell);
                            }
                        }
                        b"v" if current_cell.is_some() && !if_empty => if_in_v = true,
                        b"t" if current_cell.is_some() && !if_empty => if_in_inline_t = true,
                        b"mergeCell" => {
                            if let Some(range) = attr_string(e, b"ref").and_then(|r| parse_cell_range(&r)) {
                                self.model.l_merged_ranges.push(range);
                            }
                        }
                        b"hyperlink" => {
                            if let Some(range) = attr_string(e, b"ref").and_then(|r| parse_cell_range(&r))
                                && let Some(c_target) = self.derive_hyperlink_target(e)
                            {
                                self.l_hyperlinks.push((range, c_target));
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Text(ref t)) if if_in_v || if_in_inline_t => {
                    let c_text = t.unescape().map_err(|err| format!("worksheet: {err}"))?;
                    if let Some(cell) = current_cell.as_mut() {
                        let slot = if if_in_v { &mut cell.c_value } else { &mut cell.c_inline };
                        slot.get_or_insert_with(String::new).push_str(&c_text);
                    }
                }
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"v" => if_in_v = false,
                    b"t" => if_in_inline_t = false,
                    b"c" => {
                        if let (Some(cell), Some((_, l_cells))) = (current_cell.take(), current_row.as_mut()) {
                            l_cells.push(cell);
                        }
                    }
                    b"row" => {
                        if let Some((n_row, l_cells)) = current_row.take() {
                            self.push_row(n_row, l_cells);
                        }
                    }
                    b"sheetData" => self.flush_batch(),
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(err) => return Err(format!("worksheet: {err}")),
                _ => {}
            }
            buf.clear();
        }
        self.flush_batch();
        Ok(())
    }

    fn derive_hyperlink_target(&self, e: &quick_xml::events::BytesStart) -> Option<String> {
        let c_location = attr_string(e, b"location").filter(|l| !l.is_empty());
        let c_rel_target = attr_string_qualified(e, b"r:id")
            .or_else(|| attr_string(e, b"id"))
            .and_then(|c_id| self.dict_sheet_rels.get(&c_id))
            .map(|rel| rel.target.clone());
        match (c_rel_target, c_location) {
            (Some(c_target), Some(c_location)) => Some(format!("{c_target}#{c_location}")),
            (Some(c_target), None) => Some(c_target),
            (None, Some(c_location)) => Some(format!("internal:{c_location}")),
            (None, None) => None,
        }
    }

    /// Cell value; empty text counts as missing.
    fn derive_value(&self, cell: &SpecRawCell) -> EnumCellValue {
        match self.derive_raw_value(cell) {
            EnumCellValue::String(c) if c.is_empty() => EnumCellValue::None,
            value => value,
        }
    }

    fn derive_raw_value(&self, cell: &SpecRawCell) -> EnumCellValue {
        let c_type = cell.c_type.as_deref().unwrap_or("n");
        if c_type == "inlineStr" {
            return cell
                .c_inline
                .clone()
                .map(EnumCellValue::String)
                .unwrap_or(EnumCellValue::None);
        }
        let Some(c_raw) = cell.c_value.as_deref() else {
            return EnumCellValue::None;
        };
        match c_type {
            "s" => c_raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n_idx| self.l_shared_strings.get(n_idx))
                .map(|c| EnumCellValue::String(c.clone()))
                .unwrap_or(EnumCellValue::None),
            "b" => EnumCellValue::Boolean(matches!(c_raw.trim(), "1" | "true")),
            "str" | "e" | "d" => EnumCellValue::String(c_raw.to_string()),
            _ => {
                if c_raw.trim().is_empty() {
                    return EnumCellValue::None;
                }
                match c_raw.trim().parse::<f64>() {
                    Ok(n_value) => EnumCellValue::Number(n_value),
                    Err(_) => EnumCellValue::String(c_raw.to_string()),
                }
            }
        }
    }

    fn push_row(&mut self, n_row: u32, l_cells: Vec<SpecRawCell>) {
        let h_base = self.derive_xf_handle(0);

        if n_row == 0 {
            self.if_header_seen = true;
            let mut l_values: Vec<(u16, EnumCellValue, StyleHandle)> = Vec::with_capacity(l_cells.len());
            for cell in &l_cells {
                let value = self.derive_value(cell);
                l_values.push((cell.n_col, value, self.derive_xf_handle(cell.n_xf)));
            }
            self.n_cols = l_values
                .iter()
                .filter(|(_, v, _)| !v.is_none())
                .map(|(n_col, _, _)| *n_col as usize + 1)
                .max()
                .unwrap_or(0);
            let mut l_raw_names = vec![String::new(); self.n_cols];
            let mut l_styles = vec![h_base; self.n_cols];
            for (n_col, value, handle) in l_values {
                let n_col = n_col as usize;
                if n_col < self.n_cols {
                    l_raw_names[n_col] = value.to_normalized_string();
                    l_styles[n_col] = handle;
                }
            }
            self.model.columns = derive_unique_column_names(&l_raw_names);
            self.model.l_header_styles = l_styles;
            return;
        }

        let mut l_values = vec![EnumCellValue::None; self.n_cols];
        let mut l_styles = vec![h_base; self.n_cols];
        for cell in &l_cells {
            let n_col = cell.n_col as usize;
            if n_col >= self.n_cols {
                if self.derive_value(cell) != EnumCellValue::None {
                    self.n_cells_truncated += 1;
                }
                continue;
            }
            l_values[n_col] = self.derive_value(cell);
            l_styles[n_col] = self.derive_xf_handle(cell.n_xf);
        }

        if n_row == 1 {
            self.model.l_template_styles = l_styles.clone();
        }
        if l_values.iter().all(EnumCellValue::is_none) {
            return;
        }

        self.l_batch.push(SpecRawRow {
            n_row,
            l_values,
            l_styles,
        });
        if self.l_batch.len() >= self.n_rows_batch {
            self.flush_batch();
        }
    }

    fn flush_batch(&mut self) {
        if self.l_batch.is_empty() {
            return;
        }
        let n_rows = self.l_batch.len();
        for raw in self.l_batch.drain(..) {
            self.model.l_row_positions.push(raw.n_row);
            self.model.rows.push(raw.l_values);
            self.model.l_row_styles.push(raw.l_styles);
        }
        self.n_batches += 1;
        if self.n_rows_batch != usize::MAX {
            log::debug!(
                "Batch {} appended {} rows ({} total)",
                self.n_batches,
                n_rows,
                self.model.rows.len()
            );
            self.l_batch.shrink_to_fit();
        }
    }

    fn finish(mut self) -> WorkbookModel {
        self.flush_batch();

        let h_base = self.derive_xf_handle(0);
        if self.model.l_template_styles.len() < self.n_cols {
            self.model.l_template_styles.resize(self.n_cols, h_base);
        }
        if !self.if_header_seen {
            log::warn!(
                "Sheet {:?} of {} has no header row",
                self.model.sheet_name,
                self.model.source_label
            );
        }
        if self.n_cells_truncated > 0 {
            log::warn!(
                "Sheet {:?} of {}: {} values right of the last header column were ignored",
                self.model.sheet_name,
                self.model.source_label,
                self.n_cells_truncated
            );
        }

        for (range, c_target) in std::mem::take(&mut self.l_hyperlinks) {
            self.apply_hyperlink(&range, &c_target);
        }
        self.model
    }

    fn apply_hyperlink(&mut self, range: &SpecCellRange, c_target: &str) {
        let n_col_last = (range.col_last as usize).min(self.n_cols.saturating_sub(1));
        if self.n_cols == 0 || range.col_first as usize > n_col_last {
            return;
        }
        for n_row in range.row_first..=range.row_last {
            for n_col in range.col_first as usize..=n_col_last {
                if n_row == 0 {
                    let handle = self.model.l_header_styles[n_col];
                    self.model.l_header_styles[n_col] = self.derive_linked_handle(handle, c_target);
                    continue;
                }
                if n_row == 1 {
                    let handle = self.model.l_template_styles[n_col];
                    self.model.l_template_styles[n_col] = self.derive_linked_handle(handle, c_target);
                }
                if let Ok(n_idx) = self.model.l_row_positions.binary_search(&n_row) {
                    let handle = self.model.l_row_styles[n_idx][n_col];
                    self.model.l_row_styles[n_idx][n_col] = self.derive_linked_handle(handle, c_target);
                }
            }
        }
    }

    fn derive_linked_handle(&mut self, handle: StyleHandle, c_target: &str) -> StyleHandle {
        let style = self
            .model
            .registry
            .resolve_or_default(handle)
            .with_hyperlink(Some(c_target.to_string()));
        self.model.registry.intern(&style)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
