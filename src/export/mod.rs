//! XLSX package encoding.
//!
//! Builds a complete package from scratch: content types, package and
//! workbook relationships, the style part, one worksheet part per sheet,
//! and a comments part for each sheet that carries comments.

mod sheet_writer;
mod styles_writer;

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::Result;
use crate::types::Workbook;

/// Encode a workbook as XLSX bytes.
pub fn write_workbook(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    write_part(
        &mut writer,
        options,
        "[Content_Types].xml",
        &content_types_xml(workbook),
    )?;
    write_part(&mut writer, options, "_rels/.rels", PACKAGE_RELS)?;
    write_part(&mut writer, options, "xl/workbook.xml", &workbook_xml(workbook))?;
    write_part(
        &mut writer,
        options,
        "xl/_rels/workbook.xml.rels",
        &workbook_rels_xml(workbook),
    )?;
    write_part(
        &mut writer,
        options,
        "xl/styles.xml",
        &styles_writer::write_styles_xml(workbook),
    )?;

    for (index, sheet) in workbook.sheets.iter().enumerate() {
        let number = index + 1;
        write_part(
            &mut writer,
            options,
            &format!("xl/worksheets/sheet{number}.xml"),
            &sheet_writer::write_sheet_xml(sheet),
        )?;

        if sheet_writer::has_comments(sheet) {
            write_part(
                &mut writer,
                options,
                &format!("xl/worksheets/_rels/sheet{number}.xml.rels"),
                &sheet_rels_xml(number),
            )?;
            write_part(
                &mut writer,
                options,
                &format!("xl/comments{number}.xml"),
                &sheet_writer::write_comments_xml(sheet),
            )?;
        }
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

fn write_part<W: Write + std::io::Seek>(
    writer: &mut ZipWriter<W>,
    options: FileOptions,
    path: &str,
    content: &str,
) -> Result<()> {
    writer.start_file(path, options)?;
    writer.write_all(content.as_bytes())?;
    Ok(())
}

const PACKAGE_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    "</Relationships>"
);

fn content_types_xml(workbook: &Workbook) -> String {
    let mut xml = String::with_capacity(512 + workbook.sheets.len() * 128);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(
        r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    xml.push_str(
        r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    );

    for (index, sheet) in workbook.sheets.iter().enumerate() {
        let number = index + 1;
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{number}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        if sheet_writer::has_comments(sheet) {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/comments{number}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml"/>"#
            ));
        }
    }

    xml.push_str("</Types>");
    xml
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut xml = String::with_capacity(256 + workbook.sheets.len() * 80);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    xml.push_str("<sheets>");
    for (index, sheet) in workbook.sheets.iter().enumerate() {
        let number = index + 1;
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{number}" r:id="rId{number}"/>"#,
            xml_escape(&sheet.name)
        ));
    }
    xml.push_str("</sheets>");

    if !workbook.defined_names.is_empty() {
        xml.push_str("<definedNames>");
        for defined in &workbook.defined_names {
            xml.push_str(&format!(
                r#"<definedName name="{}">{}</definedName>"#,
                xml_escape(&defined.name),
                xml_escape(&defined.reference)
            ));
        }
        xml.push_str("</definedNames>");
    }

    xml.push_str("</workbook>");
    xml
}

fn workbook_rels_xml(workbook: &Workbook) -> String {
    let mut xml = String::with_capacity(256 + workbook.sheets.len() * 160);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );

    for index in 0..workbook.sheets.len() {
        let number = index + 1;
        xml.push_str(&format!(
            r#"<Relationship Id="rId{number}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{number}.xml"/>"#
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        workbook.sheets.len() + 1
    ));

    xml.push_str("</Relationships>");
    xml
}

fn sheet_rels_xml(number: usize) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments" Target="../comments{number}.xml"/>"#,
            "</Relationships>"
        ),
        number = number
    )
}

/// Escape text for XML content and attribute values.
pub(crate) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

    use super::*;
    use crate::parser::parse_workbook;
    use crate::types::{
        BorderStyle, CellStyle, CellValue, Comment, Font, HAlign, MergeRange, Sheet,
        UnderlineStyle, VAlign,
    };
    use zip::ZipArchive;

    fn sample_workbook() -> Workbook {
        let mut wb = Workbook::new();
        wb.fonts.push(Font {
            name: "Arial".to_string(),
            size: 14.0,
            bold: true,
            italic: false,
            strikeout: false,
            underline: UnderlineStyle::Single,
            color: Some("#336699".to_string()),
            vert_align: crate::types::VertAlign::Baseline,
        });
        wb.styles.push(CellStyle {
            font_id: 1,
            align_h: HAlign::Center,
            align_v: VAlign::Top,
            border_top: BorderStyle::Thin,
            border_right: BorderStyle::Thin,
            border_bottom: BorderStyle::Thick,
            border_left: BorderStyle::Thin,
            fill_fg: Some("#FFFF00".to_string()),
            fill_bg: None,
            wrap_text: true,
            indent: 1,
            rotation: 0,
        });

        let mut sheet = Sheet::new("Report & Summary");
        sheet.get_or_create_cell(0, 0).value = CellValue::Text("title".to_string());
        sheet.get_or_create_cell(0, 0).style = Some(1);
        sheet.get_or_create_cell(1, 0).value = CellValue::Number(3.25);
        sheet.get_or_create_cell(1, 1).value = CellValue::Boolean(false);
        sheet.get_or_create_cell(2, 0).value = CellValue::Formula {
            expr: "A2*2".to_string(),
            cached: Some(6.5),
        };
        sheet.get_or_create_cell(1, 0).comment = Some(Comment {
            author: Some("QA".to_string()),
            text: "verify".to_string(),
        });
        sheet.get_or_create_row(2).height = Some(28.0);
        sheet.set_column_width(0, 4096.0);
        sheet.add_merged_region(MergeRange::new(0, 0, 0, 1));
        sheet.set_row_break(1);
        sheet.header_footer.odd_footer = Some("&C&P".to_string());
        wb.sheets.push(sheet);

        let mut second = Sheet::new("Plain");
        second.get_or_create_cell(0, 0).value = CellValue::Number(7.0);
        wb.sheets.push(second);

        wb.make_named_cell("Start", "Report & Summary", 0, 0);
        wb
    }

    #[test]
    fn package_contains_expected_parts() {
        let bytes = write_workbook(&sample_workbook()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "xl/workbook.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/styles.xml",
            "xl/worksheets/sheet1.xml",
            "xl/worksheets/sheet2.xml",
            "xl/worksheets/_rels/sheet1.xml.rels",
            "xl/comments1.xml",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing part {part}");
        }
        // The second sheet has no comments, so no rels or comments part
        assert!(archive.by_name("xl/comments2.xml").is_err());
    }

    #[test]
    fn round_trip_preserves_content_and_layout() {
        let original = sample_workbook();
        let bytes = write_workbook(&original).unwrap();
        let decoded = parse_workbook(&bytes).unwrap();

        assert_eq!(decoded.sheets.len(), 2);
        let sheet = &decoded.sheets[0];
        assert_eq!(sheet.name, "Report & Summary");
        assert_eq!(
            sheet.cell(0, 0).unwrap().value,
            CellValue::Text("title".to_string())
        );
        assert_eq!(sheet.cell(0, 0).unwrap().style, Some(1));
        assert_eq!(sheet.cell(1, 0).unwrap().value, CellValue::Number(3.25));
        assert_eq!(
            sheet.cell(1, 1).unwrap().value,
            CellValue::Boolean(false)
        );
        assert_eq!(
            sheet.cell(2, 0).unwrap().value,
            CellValue::Formula {
                expr: "A2*2".to_string(),
                cached: Some(6.5),
            }
        );
        assert_eq!(
            sheet.cell(1, 0).unwrap().comment,
            Some(Comment {
                author: Some("QA".to_string()),
                text: "verify".to_string(),
            })
        );
        assert_eq!(sheet.row(2).unwrap().height, Some(28.0));
        assert_eq!(sheet.column_width(0), 4096.0);
        assert_eq!(sheet.merged_regions, vec![MergeRange::new(0, 0, 0, 1)]);
        assert!(sheet.row_breaks.contains(&1));
        assert_eq!(
            sheet.header_footer.odd_footer.as_deref(),
            Some("&C&P")
        );

        assert_eq!(decoded.fonts, original.fonts);
        assert_eq!(decoded.styles, original.styles);
        assert_eq!(decoded.defined_names, original.defined_names);
    }

    #[test]
    fn escaping_is_symmetric() {
        assert_eq!(
            xml_escape(r#"a<b>&"c"'d'"#),
            "a&lt;b&gt;&amp;&quot;c&quot;&apos;d&apos;"
        );
    }
}
