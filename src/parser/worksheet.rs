//! Decoding of individual worksheet parts into `Sheet` structs.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::{parse_cell_ref_bytes_or_default, parse_cell_range};
use crate::error::Result;
use crate::types::{CellValue, MergeRange, Sheet};

/// Sheet name and package part path from workbook.xml.
pub(super) struct SheetEntry {
    pub name: String,
    pub path: String,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone)]
enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        Some(num)
    } else {
        None
    }
}

/// Column count cap for one `<col>` range.
///
/// Full-sheet definitions (`max="16384"`) would otherwise flood the
/// width table; widths past the cap fall back to the sheet default.
const COL_RANGE_CAP: u32 = 10_000;

/// Which headerFooter child is currently open.
#[derive(Copy, Clone)]
enum HeaderFooterPart {
    Header,
    Footer,
}

/// Parse a single worksheet part.
#[allow(clippy::too_many_lines)]
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    entry: &SheetEntry,
    shared_strings: &[String],
) -> Result<Sheet> {
    let file = archive.by_name(&entry.path)?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut sheet = Sheet::new(entry.name.clone());
    let mut buf = Vec::new();
    let mut cell_buf = Vec::new();
    let mut current_row: u32 = 0;
    let mut in_row_breaks = false;
    let mut hf_part: Option<HeaderFooterPart> = None;
    let mut hf_text = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(_) | Event::Empty(_))) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start_event = matches!(event, Event::Start(_));
                let local_name = e.local_name();

                match local_name.as_ref() {
                    b"sheetFormatPr" => {
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"defaultColWidth" => {
                                    if let Some(w) = std::str::from_utf8(&attr.value)
                                        .ok()
                                        .and_then(|s| s.parse::<f64>().ok())
                                    {
                                        // Character units in the file, 1/256 units in the model
                                        sheet.default_col_width = w * 256.0;
                                    }
                                }
                                b"defaultRowHeight" => {
                                    if let Some(h) = std::str::from_utf8(&attr.value)
                                        .ok()
                                        .and_then(|s| s.parse::<f64>().ok())
                                    {
                                        sheet.default_row_height = h;
                                    }
                                }
                                _ => {}
                            }
                        }
                    }

                    b"row" => {
                        let mut row_height: Option<f64> = None;

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    // 1-based in the file
                                    current_row = std::str::from_utf8(&attr.value)
                                        .ok()
                                        .and_then(|s| s.parse::<u32>().ok())
                                        .unwrap_or(0)
                                        .saturating_sub(1);
                                }
                                b"ht" => {
                                    row_height = std::str::from_utf8(&attr.value)
                                        .ok()
                                        .and_then(|s| s.parse().ok());
                                }
                                _ => {}
                            }
                        }

                        if let Some(ht) = row_height {
                            sheet.get_or_create_row(current_row).height = Some(ht);
                        }
                    }

                    b"c" => {
                        let mut col: u32 = 0;
                        let mut row: u32 = current_row;
                        let mut tag = CellTypeTag::Default;
                        let mut style_idx: Option<u32> = None;

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    let (c, r) = parse_cell_ref_bytes_or_default(&attr.value);
                                    col = c;
                                    row = r;
                                }
                                b"t" => {
                                    tag = parse_cell_type_tag(&attr.value);
                                }
                                b"s" => {
                                    style_idx = parse_u32_bytes(&attr.value);
                                }
                                _ => {}
                            }
                        }

                        // Self-closing cells like <c r="A1"/> carry no children
                        let mut value_text: Option<String> = None;
                        let mut formula_text: Option<String> = None;
                        let mut inline_text: Option<String> = None;
                        if is_start_event {
                            loop {
                                cell_buf.clear();
                                match xml.read_event_into(&mut cell_buf) {
                                    Ok(Event::Start(ref inner)) => {
                                        match inner.local_name().as_ref() {
                                            b"v" => {
                                                value_text =
                                                    Some(read_element_text(&mut xml, b"v")?);
                                            }
                                            b"f" => {
                                                formula_text =
                                                    Some(read_element_text(&mut xml, b"f")?);
                                            }
                                            b"is" => {
                                                inline_text =
                                                    Some(read_inline_string(&mut xml)?);
                                            }
                                            _ => {}
                                        }
                                    }
                                    Ok(Event::End(ref inner)) => {
                                        if inner.local_name().as_ref() == b"c" {
                                            break;
                                        }
                                    }
                                    Ok(Event::Eof) => break,
                                    Err(err) => return Err(err.into()),
                                    _ => {}
                                }
                            }
                        }

                        let value = resolve_cell_value(
                            tag,
                            value_text,
                            inline_text,
                            formula_text,
                            shared_strings,
                        );

                        // Cells with no value and no style carry nothing;
                        // recording them would inflate the sheet extent.
                        if style_idx.is_some() || value != CellValue::Blank {
                            let cell = sheet.get_or_create_cell(row, col);
                            cell.value = value;
                            cell.style = style_idx;
                        }
                    }

                    b"col" => {
                        let mut min: u32 = 0;
                        let mut max: u32 = 0;
                        let mut width: Option<f64> = None;

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"min" => {
                                    min = parse_u32_bytes(&attr.value).unwrap_or(0);
                                }
                                b"max" => {
                                    max = parse_u32_bytes(&attr.value).unwrap_or(0);
                                }
                                b"width" => {
                                    width = std::str::from_utf8(&attr.value)
                                        .ok()
                                        .and_then(|s| s.parse().ok());
                                }
                                _ => {}
                            }
                        }

                        if let Some(w) = width {
                            if min > 0 && max >= min {
                                let capped = if max - min >= COL_RANGE_CAP {
                                    log::warn!(
                                        "column range {min}..={max} capped at {COL_RANGE_CAP} entries"
                                    );
                                    min + COL_RANGE_CAP - 1
                                } else {
                                    max
                                };
                                for index in min..=capped {
                                    sheet.set_column_width(index - 1, w * 256.0);
                                }
                            }
                        }
                    }

                    b"mergeCell" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"ref" {
                                if let Ok(ref_str) = std::str::from_utf8(&attr.value) {
                                    if let Some((sr, sc, er, ec)) = parse_cell_range(ref_str) {
                                        sheet.add_merged_region(MergeRange::new(sr, sc, er, ec));
                                    }
                                }
                            }
                        }
                    }

                    b"rowBreaks" if is_start_event => in_row_breaks = true,

                    // <brk> also appears under colBreaks; only row breaks
                    // participate in the page model.
                    b"brk" if in_row_breaks => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"id" {
                                // id is the 1-based row after which the page ends
                                if let Some(id) = parse_u32_bytes(&attr.value) {
                                    if id > 0 {
                                        sheet.set_row_break(id - 1);
                                    }
                                }
                            }
                        }
                    }

                    b"oddHeader" if is_start_event => {
                        hf_part = Some(HeaderFooterPart::Header);
                        hf_text.clear();
                    }

                    b"oddFooter" if is_start_event => {
                        hf_part = Some(HeaderFooterPart::Footer);
                        hf_text.clear();
                    }

                    _ => {}
                }
            }

            Ok(Event::Text(ref t)) if hf_part.is_some() => {
                if let Ok(text) = t.unescape() {
                    hf_text.push_str(&text);
                }
            }

            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"rowBreaks" => in_row_breaks = false,
                b"oddHeader" | b"oddFooter" => {
                    if let Some(part) = hf_part.take() {
                        if !hf_text.is_empty() {
                            let text = std::mem::take(&mut hf_text);
                            match part {
                                HeaderFooterPart::Header => {
                                    sheet.header_footer.odd_header = Some(text);
                                }
                                HeaderFooterPart::Footer => {
                                    sheet.header_footer.odd_footer = Some(text);
                                }
                            }
                        }
                    }
                }
                _ => {}
            },

            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }

        buf.clear();
    }

    Ok(sheet)
}

/// Accumulate text content until the closing tag of `tag`.
fn read_element_text<B: BufRead>(xml: &mut Reader<B>, tag: &[u8]) -> Result<String> {
    let mut out = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Text(ref t)) => {
                if let Ok(text) = t.unescape() {
                    out.push_str(&text);
                }
            }
            Ok(Event::End(ref end)) if end.local_name().as_ref() == tag => break,
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
    }
    Ok(out)
}

/// Concatenate all `<t>` runs inside an `<is>` inline string container.
fn read_inline_string<B: BufRead>(xml: &mut Reader<B>) -> Result<String> {
    let mut out = String::new();
    let mut buf = Vec::new();
    let mut in_t = false;
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"t" => in_t = true,
            Ok(Event::Text(ref t)) if in_t => {
                if let Ok(text) = t.unescape() {
                    out.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"is" => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
    }
    Ok(out)
}

fn resolve_cell_value(
    tag: CellTypeTag,
    value_text: Option<String>,
    inline_text: Option<String>,
    formula_text: Option<String>,
    shared_strings: &[String],
) -> CellValue {
    if let Some(expr) = formula_text.filter(|f| !f.is_empty()) {
        let cached = value_text
            .as_deref()
            .and_then(|v| v.trim().parse::<f64>().ok());
        return CellValue::Formula { expr, cached };
    }

    match tag {
        CellTypeTag::Shared => {
            let resolved = value_text
                .as_deref()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .and_then(|idx| shared_strings.get(idx));
            match resolved {
                Some(s) => CellValue::Text(s.clone()),
                None => {
                    log::warn!("unresolvable shared string reference: {value_text:?}");
                    CellValue::Blank
                }
            }
        }
        CellTypeTag::Inline => CellValue::Text(inline_text.unwrap_or_default()),
        CellTypeTag::Str => CellValue::Text(value_text.unwrap_or_default()),
        CellTypeTag::Bool => {
            CellValue::Boolean(value_text.as_deref().map(str::trim) == Some("1"))
        }
        CellTypeTag::Error => {
            log::warn!("error cell value dropped to blank: {value_text:?}");
            CellValue::Blank
        }
        CellTypeTag::Default => match value_text {
            None => CellValue::Blank,
            Some(v) => {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    CellValue::Blank
                } else {
                    match trimmed.parse::<f64>() {
                        Ok(n) => CellValue::Number(n),
                        // Untyped non-numeric values survive as text
                        Err(_) => CellValue::Text(v),
                    }
                }
            }
        },
    }
}
