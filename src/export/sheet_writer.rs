//! Worksheet and comments part generation.

use crate::cell_ref::format_cell_ref;
use crate::types::{CellValue, Row, Sheet};

use super::xml_escape;

/// Render one sheet as a complete worksheet part.
///
/// Child elements follow the schema order: sheetFormatPr, cols, sheetData,
/// mergeCells, headerFooter, rowBreaks.
pub(super) fn write_sheet_xml(sheet: &Sheet) -> String {
    let mut xml = String::with_capacity(1024 + sheet.rows.len() * 64);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );

    xml.push_str(&format!(
        r#"<sheetFormatPr defaultRowHeight="{}" defaultColWidth="{}"/>"#,
        sheet.default_row_height,
        sheet.default_col_width / 256.0
    ));

    write_cols(&mut xml, sheet);
    write_sheet_data(&mut xml, sheet);

    if !sheet.merged_regions.is_empty() {
        xml.push_str(&format!(
            r#"<mergeCells count="{}">"#,
            sheet.merged_regions.len()
        ));
        for region in &sheet.merged_regions {
            xml.push_str(&format!(
                r#"<mergeCell ref="{}:{}"/>"#,
                format_cell_ref(region.start_row, region.start_col),
                format_cell_ref(region.end_row, region.end_col)
            ));
        }
        xml.push_str("</mergeCells>");
    }

    if !sheet.header_footer.is_empty() {
        xml.push_str("<headerFooter>");
        if let Some(header) = &sheet.header_footer.odd_header {
            xml.push_str(&format!("<oddHeader>{}</oddHeader>", xml_escape(header)));
        }
        if let Some(footer) = &sheet.header_footer.odd_footer {
            xml.push_str(&format!("<oddFooter>{}</oddFooter>", xml_escape(footer)));
        }
        xml.push_str("</headerFooter>");
    }

    if !sheet.row_breaks.is_empty() {
        let count = sheet.row_breaks.len();
        xml.push_str(&format!(
            r#"<rowBreaks count="{count}" manualBreakCount="{count}">"#
        ));
        for &row in &sheet.row_breaks {
            // brk id is the 1-based row after which the page ends
            xml.push_str(&format!(r#"<brk id="{}" man="1" max="16383"/>"#, row + 1));
        }
        xml.push_str("</rowBreaks>");
    }

    xml.push_str("</worksheet>");
    xml
}

/// Write custom column widths, coalescing equal-width neighbor runs.
fn write_cols(xml: &mut String, sheet: &Sheet) {
    if sheet.col_widths.is_empty() {
        return;
    }

    xml.push_str("<cols>");

    let mut run: Option<(u32, u32, f64)> = None;
    for (&col, &width) in &sheet.col_widths {
        match run {
            Some((start, end, w)) if col == end + 1 && w.to_bits() == width.to_bits() => {
                run = Some((start, col, w));
            }
            Some((start, end, w)) => {
                write_col_run(xml, start, end, w);
                run = Some((col, col, width));
            }
            None => run = Some((col, col, width)),
        }
    }
    if let Some((start, end, w)) = run {
        write_col_run(xml, start, end, w);
    }

    xml.push_str("</cols>");
}

fn write_col_run(xml: &mut String, start: u32, end: u32, width: f64) {
    xml.push_str(&format!(
        r#"<col min="{}" max="{}" width="{}" customWidth="1"/>"#,
        start + 1,
        end + 1,
        width / 256.0
    ));
}

fn write_sheet_data(xml: &mut String, sheet: &Sheet) {
    if sheet.rows.is_empty() {
        xml.push_str("<sheetData/>");
        return;
    }

    xml.push_str("<sheetData>");
    for (&row_index, row) in &sheet.rows {
        if row.height.is_none() && !row_has_content(row) {
            continue;
        }

        xml.push_str(&format!(r#"<row r="{}""#, row_index + 1));
        if let Some(height) = row.height {
            xml.push_str(&format!(r#" ht="{height}" customHeight="1""#));
        }
        xml.push('>');

        for (&col, cell) in &row.cells {
            if cell.style.is_none() && cell.is_blank() {
                continue;
            }
            write_cell(xml, row_index, col, cell);
        }

        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");
}

fn row_has_content(row: &Row) -> bool {
    row.cells
        .values()
        .any(|cell| cell.style.is_some() || !cell.is_blank())
}

fn write_cell(xml: &mut String, row: u32, col: u32, cell: &crate::types::Cell) {
    let cell_ref = format_cell_ref(row, col);
    let style_attr = match cell.style {
        Some(s) => format!(r#" s="{s}""#),
        None => String::new(),
    };

    match &cell.value {
        CellValue::Blank => {
            xml.push_str(&format!(r#"<c r="{cell_ref}"{style_attr}/>"#));
        }
        CellValue::Number(n) => {
            xml.push_str(&format!(r#"<c r="{cell_ref}"{style_attr}><v>"#));
            push_number(xml, *n);
            xml.push_str("</v></c>");
        }
        CellValue::Boolean(b) => {
            xml.push_str(&format!(
                r#"<c r="{cell_ref}"{style_attr} t="b"><v>{}</v></c>"#,
                u8::from(*b)
            ));
        }
        CellValue::Text(text) => {
            xml.push_str(&format!(
                r#"<c r="{cell_ref}"{style_attr} t="inlineStr"><is>"#
            ));
            push_text_run(xml, text);
            xml.push_str("</is></c>");
        }
        CellValue::Formula { expr, cached } => {
            xml.push_str(&format!(
                r#"<c r="{cell_ref}"{style_attr}><f>{}</f>"#,
                xml_escape(expr)
            ));
            if let Some(value) = cached {
                xml.push_str("<v>");
                push_number(xml, *value);
                xml.push_str("</v>");
            }
            xml.push_str("</c>");
        }
    }
}

fn push_number(xml: &mut String, n: f64) {
    if n.is_finite() {
        xml.push_str(&format!("{n}"));
    } else {
        log::warn!("non-finite number written as 0");
        xml.push('0');
    }
}

/// Write a `<t>` run, preserving edge whitespace.
fn push_text_run(xml: &mut String, text: &str) {
    if text.trim() == text {
        xml.push_str(&format!("<t>{}</t>", xml_escape(text)));
    } else {
        xml.push_str(&format!(
            r#"<t xml:space="preserve">{}</t>"#,
            xml_escape(text)
        ));
    }
}

/// Render a sheet's cell comments as a comments part.
///
/// Callers are expected to check for comments first; a sheet without any
/// yields a part with an empty comment list.
pub(super) fn write_comments_xml(sheet: &Sheet) -> String {
    let mut authors: Vec<&str> = Vec::new();
    let mut entries: Vec<(String, usize, &str)> = Vec::new();

    for (&row_index, row) in &sheet.rows {
        for (&col, cell) in &row.cells {
            let Some(comment) = &cell.comment else {
                continue;
            };
            let author = comment.author.as_deref().unwrap_or("");
            let author_id = match authors.iter().position(|a| *a == author) {
                Some(id) => id,
                None => {
                    authors.push(author);
                    authors.len() - 1
                }
            };
            entries.push((format_cell_ref(row_index, col), author_id, &comment.text));
        }
    }

    let mut xml = String::with_capacity(256 + entries.len() * 96);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(
        r#"<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );

    xml.push_str("<authors>");
    for author in &authors {
        xml.push_str(&format!("<author>{}</author>", xml_escape(author)));
    }
    xml.push_str("</authors>");

    xml.push_str("<commentList>");
    for (cell_ref, author_id, text) in &entries {
        xml.push_str(&format!(
            r#"<comment ref="{cell_ref}" authorId="{author_id}"><text><r>"#
        ));
        push_text_run(&mut xml, text);
        xml.push_str("</r></text></comment>");
    }
    xml.push_str("</commentList>");

    xml.push_str("</comments>");
    xml
}

/// Whether the sheet carries any cell comments.
pub(super) fn has_comments(sheet: &Sheet) -> bool {
    sheet
        .rows
        .values()
        .any(|row| row.cells.values().any(|cell| cell.comment.is_some()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use super::*;
    use crate::types::{Cell, Comment, MergeRange};

    fn sheet_with_cells(cells: &[(u32, u32, CellValue)]) -> Sheet {
        let mut sheet = Sheet::new("Test");
        for (row, col, value) in cells {
            sheet.get_or_create_cell(*row, *col).value = value.clone();
        }
        sheet
    }

    #[test]
    fn values_render_with_their_types() {
        let sheet = sheet_with_cells(&[
            (0, 0, CellValue::Number(42.5)),
            (0, 1, CellValue::Boolean(true)),
            (0, 2, CellValue::Text("hi & bye".to_string())),
            (
                0,
                3,
                CellValue::Formula {
                    expr: "A1<B1".to_string(),
                    cached: Some(1.0),
                },
            ),
        ]);

        let xml = write_sheet_xml(&sheet);

        assert!(xml.contains(r#"<c r="A1"><v>42.5</v></c>"#));
        assert!(xml.contains(r#"<c r="B1" t="b"><v>1</v></c>"#));
        assert!(xml.contains(r#"<c r="C1" t="inlineStr"><is><t>hi &amp; bye</t></is></c>"#));
        assert!(xml.contains(r#"<c r="D1"><f>A1&lt;B1</f><v>1</v></c>"#));
    }

    #[test]
    fn blank_styled_cells_survive_but_bare_blanks_do_not() {
        let mut sheet = Sheet::new("Test");
        sheet.get_or_create_cell(0, 0).style = Some(3);
        sheet.get_or_create_cell(0, 1);

        let xml = write_sheet_xml(&sheet);

        assert!(xml.contains(r#"<c r="A1" s="3"/>"#));
        assert!(!xml.contains(r#"<c r="B1""#));
    }

    #[test]
    fn text_preserves_edge_whitespace() {
        let sheet = sheet_with_cells(&[(0, 0, CellValue::Text("  padded ".to_string()))]);
        let xml = write_sheet_xml(&sheet);
        assert!(xml.contains(r#"<t xml:space="preserve">  padded </t>"#));
    }

    #[test]
    fn non_finite_numbers_degrade_to_zero() {
        let sheet = sheet_with_cells(&[(0, 0, CellValue::Number(f64::NAN))]);
        let xml = write_sheet_xml(&sheet);
        assert!(xml.contains(r#"<c r="A1"><v>0</v></c>"#));
    }

    #[test]
    fn layout_renders_widths_heights_merges_and_breaks() {
        let mut sheet = Sheet::new("Test");
        sheet.get_or_create_cell(0, 0).value = CellValue::Number(1.0);
        sheet.get_or_create_row(1).height = Some(30.0);
        sheet.set_column_width(0, 5120.0);
        sheet.set_column_width(1, 5120.0);
        sheet.set_column_width(3, 2560.0);
        sheet.add_merged_region(MergeRange::new(0, 0, 1, 1));
        sheet.set_row_break(4);
        sheet.header_footer.odd_footer = Some("&RPage &P of &N".to_string());

        let xml = write_sheet_xml(&sheet);

        // Adjacent equal widths coalesce into one col element
        assert!(xml.contains(r#"<col min="1" max="2" width="20" customWidth="1"/>"#));
        assert!(xml.contains(r#"<col min="4" max="4" width="10" customWidth="1"/>"#));
        assert!(xml.contains(r#"<row r="2" ht="30" customHeight="1">"#));
        assert!(xml.contains(r#"<mergeCells count="1"><mergeCell ref="A1:B2"/></mergeCells>"#));
        assert!(xml.contains(r#"<rowBreaks count="1" manualBreakCount="1">"#));
        assert!(xml.contains(r#"<brk id="5" man="1" max="16383"/>"#));
        assert!(xml.contains("<oddFooter>&amp;RPage &amp;P of &amp;N</oddFooter>"));
    }

    #[test]
    fn empty_sheet_collapses_sheet_data() {
        let xml = write_sheet_xml(&Sheet::new("Empty"));
        assert!(xml.contains("<sheetData/>"));
        assert!(!xml.contains("<mergeCells"));
        assert!(!xml.contains("<rowBreaks"));
    }

    #[test]
    fn comments_share_authors_by_name() {
        let mut sheet = Sheet::new("Test");
        sheet.get_or_create_cell(0, 0).comment = Some(Comment {
            author: Some("Ana".to_string()),
            text: "first".to_string(),
        });
        sheet.get_or_create_cell(2, 1).comment = Some(Comment {
            author: Some("Ana".to_string()),
            text: "second".to_string(),
        });
        sheet.get_or_create_cell(3, 0).comment = Some(Comment {
            author: None,
            text: "unsigned".to_string(),
        });

        assert!(has_comments(&sheet));
        let xml = write_comments_xml(&sheet);

        assert_eq!(xml.matches("<author>Ana</author>").count(), 1);
        assert!(xml.contains(r#"<comment ref="A1" authorId="0">"#));
        assert!(xml.contains(r#"<comment ref="B3" authorId="0">"#));
        assert!(xml.contains(r#"<comment ref="A4" authorId="1">"#));
        assert!(xml.contains("<t>unsigned</t>"));
    }

    #[test]
    fn comment_free_sheet_reports_none() {
        let sheet = sheet_with_cells(&[(0, 0, CellValue::Number(1.0))]);
        assert!(!has_comments(&sheet));
    }

    fn cell_with_value(value: CellValue) -> Cell {
        Cell {
            value,
            style: None,
            comment: None,
        }
    }

    #[test]
    fn height_only_rows_are_kept() {
        let mut sheet = Sheet::new("Test");
        sheet.get_or_create_row(5).height = Some(22.5);
        let xml = write_sheet_xml(&sheet);
        assert!(xml.contains(r#"<row r="6" ht="22.5" customHeight="1"></row>"#));
    }

    #[test]
    fn formula_without_cache_omits_value() {
        let mut sheet = Sheet::new("Test");
        *sheet.get_or_create_cell(0, 0) = cell_with_value(CellValue::Formula {
            expr: "SUM(B1:B9)".to_string(),
            cached: None,
        });
        let xml = write_sheet_xml(&sheet);
        assert!(xml.contains(r#"<c r="A1"><f>SUM(B1:B9)</f></c>"#));
    }
}
