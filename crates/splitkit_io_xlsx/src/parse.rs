//! Parsers for workbook-level XLSX parts: workbook, relationships, shared strings, styles.
//!
//! Every parser takes a `BufRead` so parts can be streamed straight out of the
//! zip archive.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::conf::{C_NUM_FORMAT_GENERAL, N_NUM_FORMAT_ID_CUSTOM_MIN, TUP_BUILTIN_NUM_FORMATS};
use crate::spec::{
    EnumColor, EnumUnderline, SpecAlignment, SpecBorder, SpecBorderSide, SpecCellStyle, SpecFill,
    SpecFont,
};

////////////////////////////////////////////////////////////////////////////////
// #region AttributeHelpers

/// Attribute value by local name (namespace prefix ignored), unescaped.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Attribute value by its full (prefixed) name.
pub fn attr_string_qualified(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Unsigned attribute.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Float attribute.
pub fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Boolean attribute (`1`/`true`); `None` when absent.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.trim(), "1" | "true"))
}

/// Parse `rgb`/`theme`/`tint`/`indexed`/`auto` colour attributes.
pub fn parse_color(e: &BytesStart) -> Option<EnumColor> {
    if let Some(c_rgb) = attr_string(e, b"rgb") {
        let c_hex = c_rgb.trim();
        let c_hex = if c_hex.len() == 8 { &c_hex[2..] } else { c_hex };
        return u32::from_str_radix(c_hex, 16).ok().map(EnumColor::Rgb);
    }
    if let Some(n_theme) = attr_u32(e, b"theme") {
        return Some(EnumColor::Theme {
            id: n_theme,
            tint: attr_string(e, b"tint").filter(|t| t.trim().parse::<f64>() != Ok(0.0)),
        });
    }
    if let Some(n_indexed) = attr_u32(e, b"indexed") {
        return Some(EnumColor::Indexed(n_indexed));
    }
    if attr_bool(e, b"auto").unwrap_or(false) {
        return Some(EnumColor::Auto);
    }
    None
}

fn derive_xml_error_text(part: &str, err: impl std::fmt::Display) -> String {
    format!("{part}: {err}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkbookParts

/// Sheet listed in `xl/workbook.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetEntry {
    /// Display name.
    pub name: String,
    /// Relationship id pointing into the workbook rels.
    pub rel_id: String,
}

/// One `<Relationship>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRelationship {
    /// Raw target.
    pub target: String,
    /// `TargetMode="External"`.
    pub if_external: bool,
}

/// Parse the ordered sheet list of `xl/workbook.xml`.
pub fn parse_workbook_sheets<R: BufRead>(reader: R) -> Result<Vec<SpecSheetEntry>, String> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut l_sheets = Vec::new();
    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) if e.local_name().as_ref() == b"sheet" => {
                let c_name = attr_string(e, b"name").unwrap_or_default();
                let c_rel_id = attr_string_qualified(e, b"r:id")
                    .or_else(|| attr_string(e, b"id"))
                    .unwrap_or_default();
                l_sheets.push(SpecSheetEntry {
                    name: c_name,
                    rel_id: c_rel_id,
                });
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(derive_xml_error_text("xl/workbook.xml", err)),
            _ => {}
        }
        buf.clear();
    }
    Ok(l_sheets)
}

/// Parse a `.rels` part into `Id -> relationship`.
pub fn parse_relationships<R: BufRead>(
    reader: R,
) -> Result<HashMap<String, SpecRelationship>, String> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut dict_rels = HashMap::new();
    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(c_id), Some(c_target)) = (attr_string(e, b"Id"), attr_string(e, b"Target"))
                {
                    let if_external = attr_string(e, b"TargetMode")
                        .map(|m| m.eq_ignore_ascii_case("external"))
                        .unwrap_or(false);
                    dict_rels.insert(
                        c_id,
                        SpecRelationship {
                            target: c_target,
                            if_external,
                        },
                    );
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(derive_xml_error_text("relationships", err)),
            _ => {}
        }
        buf.clear();
    }
    Ok(dict_rels)
}

/// Resolve a relationship target relative to the directory of its source part.
///
/// `("xl", "worksheets/sheet1.xml")` -> `xl/worksheets/sheet1.xml`;
/// absolute targets (`/xl/...`) are taken from the package root.
pub fn resolve_part_path(base_dir: &str, target: &str) -> String {
    if let Some(c_abs) = target.strip_prefix('/') {
        return c_abs.to_string();
    }
    let mut l_parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for c_seg in target.split('/') {
        match c_seg {
            "" | "." => {}
            ".." => {
                l_parts.pop();
            }
            _ => l_parts.push(c_seg),
        }
    }
    l_parts.join("/")
}

/// Parse `xl/sharedStrings.xml`; rich-text runs are concatenated, phonetic runs skipped.
pub fn parse_shared_strings<R: BufRead>(reader: R) -> Result<Vec<String>, String> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut l_strings = Vec::new();
    let mut c_current = String::new();
    let mut if_in_si = false;
    let mut if_in_t = false;
    let mut if_in_phonetic = false;
    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    if_in_si = true;
                    c_current.clear();
                }
                b"rPh" => if_in_phonetic = true,
                b"t" if if_in_si && !if_in_phonetic => if_in_t = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                l_strings.push(String::new());
            }
            Ok(Event::Text(ref t)) if if_in_t => {
                let c_text = t
                    .unescape()
                    .map_err(|err| derive_xml_error_text("xl/sharedStrings.xml", err))?;
                c_current.push_str(&c_text);
            }
            Ok(Event::CData(ref t)) if if_in_t => {
                c_current.push_str(&String::from_utf8_lossy(t));
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    if_in_si = false;
                    l_strings.push(std::mem::take(&mut c_current));
                }
                b"rPh" => if_in_phonetic = false,
                b"t" => if_in_t = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(derive_xml_error_text("xl/sharedStrings.xml", err)),
            _ => {}
        }
        buf.clear();
    }
    Ok(l_strings)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Styles

#[derive(Debug, Default, Clone, Copy)]
struct SpecRawXf {
    n_num_fmt_id: u32,
    n_font_id: usize,
    n_fill_id: usize,
    n_border_id: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumStyleSection {
    Other,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

fn derive_underline(val: Option<&str>) -> EnumUnderline {
    match val.unwrap_or("single") {
        "none" => EnumUnderline::None,
        "double" => EnumUnderline::Double,
        "singleAccounting" => EnumUnderline::SingleAccounting,
        "doubleAccounting" => EnumUnderline::DoubleAccounting,
        _ => EnumUnderline::Single,
    }
}

fn derive_toggle(e: &BytesStart) -> bool {
    attr_bool(e, b"val").unwrap_or(true)
}

fn select_border_side<'a>(border: &'a mut SpecBorder, name: &[u8]) -> Option<&'a mut SpecBorderSide> {
    match name {
        b"left" | b"start" => Some(&mut border.left),
        b"right" | b"end" => Some(&mut border.right),
        b"top" => Some(&mut border.top),
        b"bottom" => Some(&mut border.bottom),
        b"diagonal" => Some(&mut border.diagonal),
        _ => None,
    }
}

/// Parse `xl/styles.xml` into one resolved [`SpecCellStyle`] per `cellXfs` entry.
///
/// The returned vector is indexed by the cell `s` attribute.
pub fn parse_styles<R: BufRead>(reader: R) -> Result<Vec<SpecCellStyle>, String> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();

    let mut dict_num_fmts: HashMap<u32, String> = TUP_BUILTIN_NUM_FORMATS
        .iter()
        .map(|(n_id, c_code)| (*n_id, c_code.to_string()))
        .collect();
    let mut set_num_fmt_ids_defined: HashSet<u32> = HashSet::new();
    let mut l_fonts: Vec<SpecFont> = Vec::new();
    let mut l_fills: Vec<SpecFill> = Vec::new();
    let mut l_borders: Vec<SpecBorder> = Vec::new();
    let mut l_xfs: Vec<(SpecRawXf, SpecAlignment)> = Vec::new();

    let mut section = EnumStyleSection::Other;
    let mut current_font: Option<SpecFont> = None;
    let mut current_fill: Option<SpecFill> = None;
    let mut current_border: Option<SpecBorder> = None;
    let mut current_side: Option<Vec<u8>> = None;
    let mut current_xf: Option<(SpecRawXf, SpecAlignment)> = None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let if_empty = matches!(event, Event::Empty(_));
                let name = e.local_name();
                match name.as_ref() {
                    b"numFmt" => {
                        if let (Some(n_id), Some(c_code)) =
                            (attr_u32(e, b"numFmtId"), attr_string(e, b"formatCode"))
                        {
                            dict_num_fmts.insert(n_id, c_code);
                            set_num_fmt_ids_defined.insert(n_id);
                        }
                    }
                    b"fonts" if !if_empty => section = EnumStyleSection::Fonts,
                    b"fills" if !if_empty => section = EnumStyleSection::Fills,
                    b"borders" if !if_empty => section = EnumStyleSection::Borders,
                    b"cellXfs" if !if_empty => section = EnumStyleSection::CellXfs,
                    b"cellStyleXfs" | b"dxfs" | b"cellStyles" if !if_empty => {
                        section = EnumStyleSection::Other
                    }

                    b"font" if section == EnumStyleSection::Fonts => {
                        if if_empty {
                            l_fonts.push(SpecFont::default());
                        } else {
                            current_font = Some(SpecFont::default());
                        }
                    }
                    b"name" | b"rFont" => {
                        if let Some(font) = current_font.as_mut() {
                            font.name = attr_string(e, b"val");
                        }
                    }
                    b"sz" => {
                        if let Some(font) = current_font.as_mut() {
                            font.size = attr_f64(e, b"val");
                        }
                    }
                    b"b" => {
                        if let Some(font) = current_font.as_mut() {
                            font.bold = derive_toggle(e);
                        }
                    }
                    b"i" => {
                        if let Some(font) = current_font.as_mut() {
                            font.italic = derive_toggle(e);
                        }
                    }
                    b"strike" => {
                        if let Some(font) = current_font.as_mut() {
                            font.strike = derive_toggle(e);
                        }
                    }
                    b"u" => {
                        if let Some(font) = current_font.as_mut() {
                            font.underline = derive_underline(attr_string(e, b"val").as_deref());
                        }
                    }

                    b"fill" if section == EnumStyleSection::Fills => {
                        if if_empty {
                            l_fills.push(SpecFill::default());
                        } else {
                            current_fill = Some(SpecFill::default());
                        }
                    }
                    b"patternFill" => {
                        if let Some(fill) = current_fill.as_mut() {
                            fill.pattern = attr_string(e, b"patternType").filter(|p| p != "none");
                        }
                    }
                    b"fgColor" => {
                        if let Some(fill) = current_fill.as_mut() {
                            fill.fg_color = parse_color(e);
                        }
                    }
                    b"bgColor" => {
                        if let Some(fill) = current_fill.as_mut() {
                            fill.bg_color = parse_color(e);
                        }
                    }

                    b"border" if section == EnumStyleSection::Borders => {
                        let border = SpecBorder {
                            diagonal_up: attr_bool(e, b"diagonalUp").unwrap_or(false),
                            diagonal_down: attr_bool(e, b"diagonalDown").unwrap_or(false),
                            ..Default::default()
                        };
                        if if_empty {
                            l_borders.push(border);
                        } else {
                            current_border = Some(border);
                        }
                    }
                    b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom" | b"diagonal"
                        if current_border.is_some() =>
                    {
                        if let Some(border) = current_border.as_mut()
                            && let Some(side) = select_border_side(border, name.as_ref())
                        {
                            side.style = attr_string(e, b"style").filter(|s| s != "none");
                        }
                        if !if_empty {
                            current_side = Some(name.as_ref().to_vec());
                        }
                    }

                    b"color" => {
                        if let Some(font) = current_font.as_mut() {
                            font.color = parse_color(e);
                        } else if let (Some(border), Some(c_side)) =
                            (current_border.as_mut(), current_side.as_deref())
                            && let Some(side) = select_border_side(border, c_side)
                        {
                            side.color = parse_color(e);
                        }
                    }

                    b"xf" if section == EnumStyleSection::CellXfs => {
                        let raw = SpecRawXf {
                            n_num_fmt_id: attr_u32(e, b"numFmtId").unwrap_or(0),
                            n_font_id: attr_u32(e, b"fontId").unwrap_or(0) as usize,
                            n_fill_id: attr_u32(e, b"fillId").unwrap_or(0) as usize,
                            n_border_id: attr_u32(e, b"borderId").unwrap_or(0) as usize,
                        };
                        if if_empty {
                            l_xfs.push((raw, SpecAlignment::default()));
                        } else {
                            current_xf = Some((raw, SpecAlignment::default()));
                        }
                    }
                    b"alignment" => {
                        if let Some((_, alignment)) = current_xf.as_mut() {
                            alignment.horizontal =
                                attr_string(e, b"horizontal").filter(|h| h != "general");
                            alignment.vertical = attr_string(e, b"vertical");
                            alignment.wrap_text = attr_bool(e, b"wrapText").unwrap_or(false);
                            alignment.rotation = attr_u32(e, b"textRotation")
                                .and_then(|r| u16::try_from(r).ok())
                                .unwrap_or(0);
                            alignment.indent = attr_u32(e, b"indent")
                                .and_then(|r| u8::try_from(r).ok())
                                .unwrap_or(0);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"font" => {
                    if let Some(font) = current_font.take() {
                        l_fonts.push(font);
                    }
                }
                b"fill" => {
                    if let Some(fill) = current_fill.take() {
                        l_fills.push(fill);
                    }
                }
                b"border" => {
                    if let Some(border) = current_border.take() {
                        l_borders.push(border);
                    }
                    current_side = None;
                }
                b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom" | b"diagonal" => {
                    current_side = None;
                }
                b"xf" => {
                    if let Some(xf) = current_xf.take() {
                        l_xfs.push(xf);
                    }
                }
                b"fonts" | b"fills" | b"borders" | b"cellXfs" => section = EnumStyleSection::Other,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(derive_xml_error_text("xl/styles.xml", err)),
            _ => {}
        }
        buf.clear();
    }

    let l_styles = l_xfs
        .into_iter()
        .map(|(raw, alignment)| SpecCellStyle {
            font: l_fonts.get(raw.n_font_id).cloned().unwrap_or_default(),
            fill: derive_normalized_fill(l_fills.get(raw.n_fill_id).cloned().unwrap_or_default()),
            border: l_borders.get(raw.n_border_id).cloned().unwrap_or_default(),
            alignment,
            number_format: dict_num_fmts
                .get(&raw.n_num_fmt_id)
                .cloned()
                .unwrap_or_else(|| C_NUM_FORMAT_GENERAL.to_string()),
            number_format_index: derive_builtin_num_format_index(
                raw.n_num_fmt_id,
                &set_num_fmt_ids_defined,
            ),
            hyperlink: None,
        })
        .collect();
    Ok(l_styles)
}

/// Built-in ids are kept so the writer can emit the same id, including
/// locale formats whose code differs between Excel installations.
fn derive_builtin_num_format_index(n_id: u32, set_defined: &HashSet<u32>) -> Option<u8> {
    if n_id == 0 || n_id >= N_NUM_FORMAT_ID_CUSTOM_MIN || set_defined.contains(&n_id) {
        return None;
    }
    u8::try_from(n_id).ok()
}

// Colours of a fill without pattern are never rendered.
fn derive_normalized_fill(fill: SpecFill) -> SpecFill {
    if fill.pattern.is_none() {
        return SpecFill::default();
    }
    fill
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const C_STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="0.000"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/></font>
    <font><b/><i val="0"/><u val="double"/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor theme="4" tint="0.59999389629810485"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border diagonalUp="1"><left style="thin"><color auto="1"/></left><right/><top/><bottom style="double"><color indexed="10"/></bottom><diagonal style="hair"/></border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="1" fillId="2" borderId="1"/></cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="164" fontId="1" fillId="2" borderId="1" xfId="0" applyAlignment="1"><alignment horizontal="center" vertical="top" wrapText="1" textRotation="45" indent="2"/></xf>
    <xf numFmtId="14" fontId="0" fillId="1" borderId="0" xfId="0"/>
  </cellXfs>
  <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#;

    #[test]
    fn test_parse_styles_resolves_cell_xfs() {
        let l_styles = parse_styles(C_STYLES_XML.as_bytes()).unwrap();
        assert_eq!(l_styles.len(), 3);

        let base = &l_styles[0];
        assert_eq!(base.font.name.as_deref(), Some("Calibri"));
        assert_eq!(base.font.size, Some(11.0));
        assert_eq!(base.font.color, Some(EnumColor::Theme { id: 1, tint: None }));
        assert_eq!(base.fill, SpecFill::default());
        assert_eq!(base.number_format, "General");

        let fancy = &l_styles[1];
        assert!(fancy.font.bold);
        assert!(!fancy.font.italic);
        assert_eq!(fancy.font.underline, EnumUnderline::Double);
        assert_eq!(fancy.font.color, Some(EnumColor::Rgb(0xFF0000)));
        assert_eq!(fancy.fill.pattern.as_deref(), Some("solid"));
        assert_eq!(
            fancy.fill.fg_color,
            Some(EnumColor::Theme {
                id: 4,
                tint: Some("0.59999389629810485".to_string())
            })
        );
        assert_eq!(fancy.fill.bg_color, Some(EnumColor::Indexed(64)));
        assert_eq!(fancy.border.left.style.as_deref(), Some("thin"));
        assert_eq!(fancy.border.left.color, Some(EnumColor::Auto));
        assert_eq!(fancy.border.bottom.color, Some(EnumColor::Indexed(10)));
        assert_eq!(fancy.border.diagonal.style.as_deref(), Some("hair"));
        assert!(fancy.border.diagonal_up);
        assert_eq!(fancy.alignment.horizontal.as_deref(), Some("center"));
        assert_eq!(fancy.alignment.vertical.as_deref(), Some("top"));
        assert!(fancy.alignment.wrap_text);
        assert_eq!(fancy.alignment.rotation, 45);
        assert_eq!(fancy.alignment.indent, 2);
        assert_eq!(fancy.number_format, "0.000");

        assert_eq!(l_styles[2].number_format, "m/d/yy");
        assert_eq!(l_styles[2].number_format_index, Some(14));
        assert_eq!(fancy.number_format_index, None);
        assert_eq!(base.number_format_index, None);
        assert_eq!(l_styles[2].fill.pattern.as_deref(), Some("gray125"));
    }

    #[test]
    fn test_parse_styles_resolves_builtin_ids_without_num_fmt() {
        let c_xml = r#"<styleSheet><fonts count="1"><font/></fonts><fills count="1"><fill/></fills>
<borders count="1"><border/></borders>
<cellXfs count="4"><xf numFmtId="31"/><xf numFmtId="44"/><xf numFmtId="57"/><xf numFmtId="70"/></cellXfs></styleSheet>"#;
        let l_styles = parse_styles(c_xml.as_bytes()).unwrap();
        assert_eq!(l_styles[0].number_format, "yyyy\"年\"m\"月\"d\"日\"");
        assert_eq!(l_styles[0].number_format_index, Some(31));
        assert!(l_styles[1].number_format.starts_with("_(\"$\"*"));
        assert_eq!(l_styles[1].number_format_index, Some(44));
        assert_eq!(l_styles[2].number_format_index, Some(57));
        // unknown locale id: code unknown, id kept
        assert_eq!(l_styles[3].number_format, "General");
        assert_eq!(l_styles[3].number_format_index, Some(70));
    }

    #[test]
    fn test_parse_shared_strings_concatenates_runs() {
        let c_xml = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<si><t>Sales</t></si>
<si><r><t>Hello </t></r><r><rPr><b/></rPr><t>World</t></r><rPh><t>skip</t></rPh></si>
<si><t xml:space="preserve"> a &amp; b </t></si>
<si/>
</sst>"#;
        let l_strings = parse_shared_strings(c_xml.as_bytes()).unwrap();
        assert_eq!(l_strings, vec!["Sales", "Hello World", " a & b ", ""]);
    }

    #[test]
    fn test_parse_workbook_and_relationships() {
        let c_workbook = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Data" sheetId="1" r:id="rId1"/><sheet name="Other" sheetId="2" r:id="rId2"/></sheets></workbook>"#;
        let l_sheets = parse_workbook_sheets(c_workbook.as_bytes()).unwrap();
        assert_eq!(
            l_sheets,
            vec![
                SpecSheetEntry {
                    name: "Data".to_string(),
                    rel_id: "rId1".to_string()
                },
                SpecSheetEntry {
                    name: "Other".to_string(),
                    rel_id: "rId2".to_string()
                },
            ]
        );

        let c_rels = r#"<Relationships><Relationship Id="rId1" Type="x" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId9" Type="h" Target="https://example.com" TargetMode="External"/></Relationships>"#;
        let dict_rels = parse_relationships(c_rels.as_bytes()).unwrap();
        assert_eq!(dict_rels["rId1"].target, "worksheets/sheet1.xml");
        assert!(!dict_rels["rId1"].if_external);
        assert!(dict_rels["rId9"].if_external);
    }

    #[test]
    fn test_resolve_part_path() {
        assert_eq!(resolve_part_path("xl", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_part_path("xl/worksheets", "../sharedStrings.xml"), "xl/sharedStrings.xml");
        assert_eq!(resolve_part_path("xl", "/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
    }
}
