//! Decoding of xl/styles.xml into the workbook font and style tables.
//!
//! Fill and border entries are folded into each style record during
//! resolution, so indices in `cellXfs` map one to one onto the returned
//! style table.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::error::Result;
use crate::types::{BorderStyle, CellStyle, Font, HAlign, UnderlineStyle, VAlign, VertAlign};

/// A fill entry as stored in the file: pattern name plus optional colors.
#[derive(Default, Clone)]
struct RawFill {
    pattern: Option<String>,
    fg: Option<String>,
    bg: Option<String>,
}

/// Line styles for the four sides of one `<border>` entry.
#[derive(Default, Clone, Copy)]
struct RawBorder {
    top: BorderStyle,
    right: BorderStyle,
    bottom: BorderStyle,
    left: BorderStyle,
}

/// One `<xf>` record from `cellXfs` before fill and border lookup.
#[derive(Default, Clone)]
struct RawXf {
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    align_h: HAlign,
    align_v: VAlign,
    wrap_text: bool,
    indent: u32,
    rotation: i32,
}

/// Read the `rgb` attribute of a color element as `#RRGGBB`.
///
/// File colors are ARGB (8 hex digits); the alpha byte is dropped.
/// Theme and indexed color references resolve to `None`.
fn rgb_attr(e: &BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"rgb" {
            if let Ok(rgb) = std::str::from_utf8(&attr.value) {
                let hex = if rgb.len() == 8 {
                    rgb.get(2..).unwrap_or(rgb)
                } else {
                    rgb
                };
                return Some(format!("#{hex}"));
            }
        }
    }
    None
}

fn val_attr(e: &BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"val" {
            return std::str::from_utf8(&attr.value)
                .ok()
                .map(ToString::to_string);
        }
    }
    None
}

/// Parse the style part into font and cell style tables.
///
/// A missing part yields empty tables; callers fall back to the
/// workbook defaults in that case.
#[allow(clippy::too_many_lines)]
pub(super) fn parse_style_tables<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Result<(Vec<Font>, Vec<CellStyle>)> {
    let styles_path = path.unwrap_or("xl/styles.xml");
    let Ok(file) = archive.by_name(styles_path) else {
        return Ok((Vec::new(), Vec::new()));
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut fonts: Vec<Font> = Vec::new();
    let mut fills: Vec<RawFill> = Vec::new();
    let mut borders: Vec<RawBorder> = Vec::new();
    let mut xfs: Vec<RawXf> = Vec::new();

    let mut buf = Vec::new();

    // Section tracking
    let mut in_fonts = false;
    let mut in_fills = false;
    let mut in_borders = false;
    let mut in_cell_xfs = false;

    let mut current_font: Option<Font> = None;
    let mut current_fill: Option<RawFill> = None;
    let mut current_border: Option<RawBorder> = None;
    let mut current_xf: Option<RawXf> = None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.local_name();
                let name_str = std::str::from_utf8(name.as_ref()).unwrap_or("");

                match name_str {
                    "fonts" => in_fonts = true,
                    "fills" => in_fills = true,
                    "borders" => in_borders = true,
                    "cellXfs" => in_cell_xfs = true,

                    "font" if in_fonts => {
                        let font = Font::default();
                        if is_empty {
                            fonts.push(font);
                        } else {
                            current_font = Some(font);
                        }
                    }

                    "sz" if current_font.is_some() => {
                        if let Some(ref mut font) = current_font {
                            if let Some(size) = val_attr(e).and_then(|v| v.parse().ok()) {
                                font.size = size;
                            }
                        }
                    }

                    "name" if current_font.is_some() => {
                        if let Some(ref mut font) = current_font {
                            if let Some(name) = val_attr(e) {
                                font.name = name;
                            }
                        }
                    }

                    "b" if current_font.is_some() => {
                        if let Some(ref mut font) = current_font {
                            font.bold = true;
                        }
                    }

                    "i" if current_font.is_some() => {
                        if let Some(ref mut font) = current_font {
                            font.italic = true;
                        }
                    }

                    "strike" if current_font.is_some() => {
                        if let Some(ref mut font) = current_font {
                            font.strikeout = true;
                        }
                    }

                    "u" if current_font.is_some() => {
                        if let Some(ref mut font) = current_font {
                            // <u/> without a val attribute means single underline
                            font.underline = match val_attr(e) {
                                Some(val) => UnderlineStyle::from_xml(&val),
                                None => UnderlineStyle::Single,
                            };
                        }
                    }

                    "vertAlign" if current_font.is_some() => {
                        if let Some(ref mut font) = current_font {
                            if let Some(val) = val_attr(e) {
                                font.vert_align = VertAlign::from_xml(&val);
                            }
                        }
                    }

                    "color" if current_font.is_some() => {
                        if let Some(ref mut font) = current_font {
                            font.color = rgb_attr(e);
                        }
                    }

                    "fill" if in_fills => {
                        current_fill = Some(RawFill::default());
                    }

                    "patternFill" if current_fill.is_some() => {
                        if let Some(ref mut fill) = current_fill {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"patternType" {
                                    fill.pattern = std::str::from_utf8(&attr.value)
                                        .ok()
                                        .map(ToString::to_string);
                                }
                            }
                        }
                    }

                    "fgColor" if current_fill.is_some() => {
                        if let Some(ref mut fill) = current_fill {
                            fill.fg = rgb_attr(e);
                        }
                    }

                    "bgColor" if current_fill.is_some() => {
                        if let Some(ref mut fill) = current_fill {
                            fill.bg = rgb_attr(e);
                        }
                    }

                    "border" if in_borders => {
                        let border = RawBorder::default();
                        // Self-closing <border/> tags get no End event
                        if is_empty {
                            borders.push(border);
                        } else {
                            current_border = Some(border);
                        }
                    }

                    "left" | "right" | "top" | "bottom" if current_border.is_some() => {
                        let mut style = BorderStyle::None;
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"style" {
                                if let Ok(s) = std::str::from_utf8(&attr.value) {
                                    style = BorderStyle::from_xml(s);
                                }
                            }
                        }
                        if let Some(ref mut border) = current_border {
                            match name_str {
                                "left" => border.left = style,
                                "right" => border.right = style,
                                "top" => border.top = style,
                                _ => border.bottom = style,
                            }
                        }
                    }

                    "xf" if in_cell_xfs => {
                        let mut xf = RawXf::default();

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"fontId" => {
                                    xf.font_id = std::str::from_utf8(&attr.value)
                                        .ok()
                                        .and_then(|s| s.parse().ok())
                                        .unwrap_or(0);
                                }
                                b"fillId" => {
                                    xf.fill_id = std::str::from_utf8(&attr.value)
                                        .ok()
                                        .and_then(|s| s.parse().ok())
                                        .unwrap_or(0);
                                }
                                b"borderId" => {
                                    xf.border_id = std::str::from_utf8(&attr.value)
                                        .ok()
                                        .and_then(|s| s.parse().ok())
                                        .unwrap_or(0);
                                }
                                _ => {}
                            }
                        }

                        // Self-closing <xf/> tags get no End event
                        if is_empty {
                            xfs.push(xf);
                        } else {
                            current_xf = Some(xf);
                        }
                    }

                    "alignment" if current_xf.is_some() => {
                        if let Some(ref mut xf) = current_xf {
                            for attr in e.attributes().flatten() {
                                match attr.key.as_ref() {
                                    b"horizontal" => {
                                        if let Ok(v) = std::str::from_utf8(&attr.value) {
                                            xf.align_h = HAlign::from_xml(v);
                                        }
                                    }
                                    b"vertical" => {
                                        if let Ok(v) = std::str::from_utf8(&attr.value) {
                                            xf.align_v = VAlign::from_xml(v);
                                        }
                                    }
                                    b"wrapText" => {
                                        xf.wrap_text =
                                            std::str::from_utf8(&attr.value).unwrap_or("0") == "1";
                                    }
                                    b"indent" => {
                                        xf.indent = std::str::from_utf8(&attr.value)
                                            .ok()
                                            .and_then(|s| s.parse().ok())
                                            .unwrap_or(0);
                                    }
                                    b"textRotation" => {
                                        xf.rotation = std::str::from_utf8(&attr.value)
                                            .ok()
                                            .and_then(|s| s.parse().ok())
                                            .unwrap_or(0);
                                    }
                                    _ => {}
                                }
                            }
                        }
                    }

                    _ => {}
                }
            }

            Ok(Event::End(ref e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"fonts" => in_fonts = false,
                    b"fills" => in_fills = false,
                    b"borders" => in_borders = false,
                    b"cellXfs" => in_cell_xfs = false,

                    b"font" => {
                        if let Some(font) = current_font.take() {
                            fonts.push(font);
                        }
                    }
                    b"fill" => {
                        if let Some(fill) = current_fill.take() {
                            fills.push(fill);
                        }
                    }
                    b"border" => {
                        if let Some(border) = current_border.take() {
                            borders.push(border);
                        }
                    }
                    // cellStyleXfs shares the <xf> element name; the section
                    // flag keeps those records out of the cell style table.
                    b"xf" => {
                        if let Some(xf) = current_xf.take() {
                            if in_cell_xfs {
                                xfs.push(xf);
                            }
                        }
                    }
                    _ => {}
                }
            }

            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }

        buf.clear();
    }

    let styles = xfs
        .iter()
        .map(|xf| resolve_xf(xf, &fonts, &fills, &borders))
        .collect();

    Ok((fonts, styles))
}

fn resolve_xf(xf: &RawXf, fonts: &[Font], fills: &[RawFill], borders: &[RawBorder]) -> CellStyle {
    let border = borders
        .get(xf.border_id as usize)
        .copied()
        .unwrap_or_default();
    let (fill_fg, fill_bg) = fills
        .get(xf.fill_id as usize)
        .map(fill_colors)
        .unwrap_or((None, None));
    let font_id = if (xf.font_id as usize) < fonts.len() {
        xf.font_id
    } else {
        0
    };

    CellStyle {
        font_id,
        align_h: xf.align_h,
        align_v: xf.align_v,
        border_top: border.top,
        border_right: border.right,
        border_bottom: border.bottom,
        border_left: border.left,
        fill_fg,
        fill_bg,
        wrap_text: xf.wrap_text,
        indent: xf.indent,
        rotation: xf.rotation,
    }
}

/// Colors carried by a fill, or none when the pattern is `none`.
fn fill_colors(fill: &RawFill) -> (Option<String>, Option<String>) {
    match fill.pattern.as_deref() {
        None | Some("none") => (None, None),
        _ => (fill.fg.clone(), fill.bg.clone()),
    }
}
