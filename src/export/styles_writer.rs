//! styles.xml generation.
//!
//! The flat style table maps back onto the part's indirect layout: fonts
//! write one-to-one, while fills and borders are collected into deduplicated
//! tables that the `<xf>` records reference by index.

use crate::types::{BorderStyle, CellStyle, Font, Workbook};

use super::xml_escape;

/// Fill slots 0 and 1 are reserved for the fixed none/gray125 entries.
const FIRST_SOLID_FILL: usize = 2;

/// Render the workbook style tables as a complete styles.xml part.
pub(super) fn write_styles_xml(workbook: &Workbook) -> String {
    let mut xml = String::with_capacity(1024 + workbook.styles.len() * 128);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(
        r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );

    write_fonts(&mut xml, &workbook.fonts);

    let fills = collect_fills(&workbook.styles);
    write_fills(&mut xml, &fills);

    let borders = collect_borders(&workbook.styles);
    write_borders(&mut xml, &borders);

    // A single pass-through record keeps xfId references valid
    xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

    write_cell_xfs(&mut xml, &workbook.styles, &fills, &borders);

    xml.push_str(
        r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    );
    xml.push_str("</styleSheet>");

    xml
}

fn write_fonts(xml: &mut String, fonts: &[Font]) {
    xml.push_str(&format!(r#"<fonts count="{}">"#, fonts.len()));

    for font in fonts {
        xml.push_str("<font>");
        if font.bold {
            xml.push_str("<b/>");
        }
        if font.italic {
            xml.push_str("<i/>");
        }
        if font.strikeout {
            xml.push_str("<strike/>");
        }
        if let Some(u) = font.underline.as_xml() {
            if u == "single" {
                xml.push_str("<u/>");
            } else {
                xml.push_str(&format!(r#"<u val="{u}"/>"#));
            }
        }
        if let Some(va) = font.vert_align.as_xml() {
            xml.push_str(&format!(r#"<vertAlign val="{va}"/>"#));
        }
        xml.push_str(&format!(r#"<sz val="{}"/>"#, font.size));
        if let Some(rgb) = color_to_argb(font.color.as_deref()) {
            xml.push_str(&format!(r#"<color rgb="{rgb}"/>"#));
        }
        xml.push_str(&format!(r#"<name val="{}"/>"#, xml_escape(&font.name)));
        xml.push_str("</font>");
    }

    xml.push_str("</fonts>");
}

/// Deduplicated solid fills, keyed by (foreground, background).
fn collect_fills(styles: &[CellStyle]) -> Vec<(Option<String>, Option<String>)> {
    let mut fills = Vec::new();
    for style in styles {
        if style.fill_fg.is_none() && style.fill_bg.is_none() {
            continue;
        }
        let key = (style.fill_fg.clone(), style.fill_bg.clone());
        if !fills.contains(&key) {
            fills.push(key);
        }
    }
    fills
}

fn write_fills(xml: &mut String, fills: &[(Option<String>, Option<String>)]) {
    xml.push_str(&format!(
        r#"<fills count="{}">"#,
        fills.len() + FIRST_SOLID_FILL
    ));
    // Consumers expect the two reserved entries in these exact slots
    xml.push_str(r#"<fill><patternFill patternType="none"/></fill>"#);
    xml.push_str(r#"<fill><patternFill patternType="gray125"/></fill>"#);

    for (fg, bg) in fills {
        xml.push_str(r#"<fill><patternFill patternType="solid">"#);
        if let Some(rgb) = color_to_argb(fg.as_deref()) {
            xml.push_str(&format!(r#"<fgColor rgb="{rgb}"/>"#));
        }
        if let Some(rgb) = color_to_argb(bg.as_deref()) {
            xml.push_str(&format!(r#"<bgColor rgb="{rgb}"/>"#));
        }
        xml.push_str("</patternFill></fill>");
    }

    xml.push_str("</fills>");
}

type BorderKey = (BorderStyle, BorderStyle, BorderStyle, BorderStyle);

/// Deduplicated borders as (left, right, top, bottom), with the empty
/// border pinned at index 0.
fn collect_borders(styles: &[CellStyle]) -> Vec<BorderKey> {
    let empty = (
        BorderStyle::None,
        BorderStyle::None,
        BorderStyle::None,
        BorderStyle::None,
    );
    let mut borders = vec![empty];
    for style in styles {
        let key = (
            style.border_left,
            style.border_right,
            style.border_top,
            style.border_bottom,
        );
        if !borders.contains(&key) {
            borders.push(key);
        }
    }
    borders
}

fn write_borders(xml: &mut String, borders: &[BorderKey]) {
    xml.push_str(&format!(r#"<borders count="{}">"#, borders.len()));

    for (left, right, top, bottom) in borders {
        xml.push_str("<border>");
        write_border_side(xml, "left", *left);
        write_border_side(xml, "right", *right);
        write_border_side(xml, "top", *top);
        write_border_side(xml, "bottom", *bottom);
        xml.push_str("<diagonal/>");
        xml.push_str("</border>");
    }

    xml.push_str("</borders>");
}

fn write_border_side(xml: &mut String, side: &str, style: BorderStyle) {
    match style.as_xml() {
        Some(name) => xml.push_str(&format!(r#"<{side} style="{name}"/>"#)),
        None => xml.push_str(&format!("<{side}/>")),
    }
}

fn write_cell_xfs(
    xml: &mut String,
    styles: &[CellStyle],
    fills: &[(Option<String>, Option<String>)],
    borders: &[BorderKey],
) {
    xml.push_str(&format!(r#"<cellXfs count="{}">"#, styles.len()));

    for style in styles {
        let fill_id = if style.fill_fg.is_none() && style.fill_bg.is_none() {
            0
        } else {
            let key = (style.fill_fg.clone(), style.fill_bg.clone());
            fills
                .iter()
                .position(|f| *f == key)
                .map(|i| i + FIRST_SOLID_FILL)
                .unwrap_or(0)
        };

        let border_key = (
            style.border_left,
            style.border_right,
            style.border_top,
            style.border_bottom,
        );
        let border_id = borders.iter().position(|b| *b == border_key).unwrap_or(0);

        xml.push_str(&format!(
            r#"<xf numFmtId="0" fontId="{}" fillId="{fill_id}" borderId="{border_id}" xfId="0""#,
            style.font_id
        ));
        if style.font_id != 0 {
            xml.push_str(r#" applyFont="1""#);
        }
        if fill_id != 0 {
            xml.push_str(r#" applyFill="1""#);
        }
        if border_id != 0 {
            xml.push_str(r#" applyBorder="1""#);
        }

        let alignment = alignment_attrs(style);
        if alignment.is_empty() {
            xml.push_str("/>");
        } else {
            xml.push_str(r#" applyAlignment="1">"#);
            xml.push_str(&format!("<alignment{alignment}/>"));
            xml.push_str("</xf>");
        }
    }

    xml.push_str("</cellXfs>");
}

/// Alignment attribute string, empty when every field is at its default.
fn alignment_attrs(style: &CellStyle) -> String {
    let mut attrs = String::new();
    if let Some(h) = style.align_h.as_xml() {
        attrs.push_str(&format!(r#" horizontal="{h}""#));
    }
    if let Some(v) = style.align_v.as_xml() {
        attrs.push_str(&format!(r#" vertical="{v}""#));
    }
    if style.wrap_text {
        attrs.push_str(r#" wrapText="1""#);
    }
    if style.indent > 0 {
        attrs.push_str(&format!(r#" indent="{}""#, style.indent));
    }
    if style.rotation != 0 {
        attrs.push_str(&format!(r#" textRotation="{}""#, style.rotation));
    }
    attrs
}

/// Convert a "#RRGGBB" model color to the part's ARGB form.
fn color_to_argb(color: Option<&str>) -> Option<String> {
    let color = color?;
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.is_empty() {
        return None;
    }
    Some(format!("FF{}", hex.to_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::types::{HAlign, UnderlineStyle, VAlign};

    fn workbook_with(styles: Vec<CellStyle>, fonts: Vec<Font>) -> Workbook {
        let mut wb = Workbook::new();
        if !fonts.is_empty() {
            wb.fonts = fonts;
        }
        if !styles.is_empty() {
            wb.styles = styles;
        }
        wb
    }

    #[test]
    fn default_workbook_writes_reserved_entries() {
        let xml = write_styles_xml(&Workbook::new());

        assert!(xml.contains(r#"<fills count="2">"#));
        assert!(xml.contains(r#"<patternFill patternType="none"/>"#));
        assert!(xml.contains(r#"<patternFill patternType="gray125"/>"#));
        assert!(xml.contains(r#"<borders count="1">"#));
        assert!(xml.contains(r#"<cellXfs count="1">"#));
        assert!(xml.contains(r#"<cellStyle name="Normal" xfId="0" builtinId="0"/>"#));
    }

    #[test]
    fn fonts_write_their_flags_and_color() {
        let font = Font {
            name: "Arial".to_string(),
            size: 14.0,
            bold: true,
            italic: false,
            strikeout: false,
            underline: UnderlineStyle::Double,
            color: Some("#336699".to_string()),
            vert_align: crate::types::VertAlign::Baseline,
        };
        let xml = write_styles_xml(&workbook_with(vec![CellStyle::default()], vec![font]));

        assert!(xml.contains("<b/>"));
        assert!(xml.contains(r#"<u val="double"/>"#));
        assert!(xml.contains(r#"<sz val="14"/>"#));
        assert!(xml.contains(r#"<color rgb="FF336699"/>"#));
        assert!(xml.contains(r#"<name val="Arial"/>"#));
    }

    #[test]
    fn equal_fills_share_one_table_entry() {
        let yellow = CellStyle {
            fill_fg: Some("#FFFF00".to_string()),
            ..CellStyle::default()
        };
        let styles = vec![CellStyle::default(), yellow.clone(), yellow];
        let xml = write_styles_xml(&workbook_with(styles, Vec::new()));

        assert!(xml.contains(r#"<fills count="3">"#));
        assert_eq!(xml.matches(r#"<fgColor rgb="FFFFFF00"/>"#).count(), 1);
        assert_eq!(xml.matches(r#"fillId="2""#).count(), 2);
    }

    #[test]
    fn borders_deduplicate_and_keep_empty_first() {
        let boxed = CellStyle {
            border_top: BorderStyle::Thin,
            border_right: BorderStyle::Thin,
            border_bottom: BorderStyle::Thin,
            border_left: BorderStyle::Thin,
            ..CellStyle::default()
        };
        let styles = vec![CellStyle::default(), boxed.clone(), boxed];
        let xml = write_styles_xml(&workbook_with(styles, Vec::new()));

        assert!(xml.contains(r#"<borders count="2">"#));
        assert_eq!(xml.matches(r#"<top style="thin"/>"#).count(), 1);
        assert_eq!(xml.matches(r#"borderId="1""#).count(), 2);
    }

    #[test]
    fn alignment_writes_only_non_defaults() {
        let aligned = CellStyle {
            align_h: HAlign::Center,
            align_v: VAlign::Top,
            wrap_text: true,
            indent: 2,
            rotation: 45,
            ..CellStyle::default()
        };
        let xml = write_styles_xml(&workbook_with(
            vec![CellStyle::default(), aligned],
            Vec::new(),
        ));

        assert!(xml.contains(
            r#"<alignment horizontal="center" vertical="top" wrapText="1" indent="2" textRotation="45"/>"#
        ));
        // The default style carries no alignment element
        assert_eq!(xml.matches("<alignment").count(), 1);
    }
}
