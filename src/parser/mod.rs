//! XLSX package decoding.
//!
//! Opens the ZIP container, resolves part paths through the package
//! relationships, and assembles a [`Workbook`] from the style, shared
//! string, worksheet, and comment parts.

mod styles;
mod worksheet;

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Cursor, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref;
use crate::error::{CollateError, Result};
use crate::types::{Comment, DefinedName, Sheet, Workbook};

use worksheet::SheetEntry;

/// Paths of the shared package parts, resolved from
/// xl/_rels/workbook.xml.rels.
#[derive(Default, Debug)]
struct PackageRelationships {
    /// rId -> full worksheet part path, e.g. "rId1" -> "xl/worksheets/sheet1.xml".
    worksheets: HashMap<String, String>,
    shared_strings: Option<String>,
    styles: Option<String>,
}

/// Decode an XLSX document from bytes.
///
/// Recognized content: sheet names and order, cell values and styles,
/// row heights, column widths, merged regions, manual row breaks,
/// header/footer text, defined names, and cell comments. Anything else
/// in the package is ignored.
pub fn parse_workbook(bytes: &[u8]) -> Result<Workbook> {
    let cursor = Cursor::new(bytes);
    let mut archive = ZipArchive::new(cursor)?;

    let relationships = parse_package_relationships(&mut archive);
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());
    let (fonts, styles) =
        styles::parse_style_tables(&mut archive, relationships.styles.as_deref())?;
    let (entries, defined_names) = read_workbook_part(&mut archive, &relationships.worksheets)?;

    let mut workbook = Workbook::new();
    if !fonts.is_empty() {
        workbook.fonts = fonts;
    }
    if !styles.is_empty() {
        workbook.styles = styles;
    }
    workbook.defined_names = defined_names;

    for entry in &entries {
        let mut sheet = worksheet::parse_sheet(&mut archive, entry, &shared_strings)?;
        attach_comments(&mut archive, entry, &mut sheet);
        workbook.sheets.push(sheet);
    }
    drop_dangling_style_ids(&mut workbook);

    log::debug!(
        "decoded workbook: {} sheets, {} fonts, {} styles",
        workbook.sheets.len(),
        workbook.fonts.len(),
        workbook.styles.len()
    );

    Ok(workbook)
}

/// Null out cell style ids with no entry in the parsed style table.
/// Worksheet parts carry the ids verbatim; the table bound is only known
/// once every part is read.
fn drop_dangling_style_ids(workbook: &mut Workbook) {
    let len = workbook.styles.len();
    for sheet in &mut workbook.sheets {
        for row in sheet.rows.values_mut() {
            for cell in row.cells.values_mut() {
                match cell.style {
                    Some(id) if (id as usize) >= len => {
                        log::warn!("cell style {id} has no entry in the style table; dropping it");
                        cell.style = None;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Parse workbook relationships from xl/_rels/workbook.xml.rels.
fn parse_package_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> PackageRelationships {
    let mut rels = PackageRelationships::default();

    // The relationships part is optional; defaults cover its absence
    let Ok(file) = archive.by_name("xl/_rels/workbook.xml.rels") else {
        return rels;
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id = String::new();
                    let mut target = String::new();
                    let mut rel_type = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => {
                                id = std::str::from_utf8(&attr.value).unwrap_or("").to_string();
                            }
                            b"Target" => {
                                target =
                                    std::str::from_utf8(&attr.value).unwrap_or("").to_string();
                            }
                            b"Type" => {
                                rel_type =
                                    std::str::from_utf8(&attr.value).unwrap_or("").to_string();
                            }
                            _ => {}
                        }
                    }

                    // Targets are relative to xl/ unless rooted
                    let full_path = if let Some(stripped) = target.strip_prefix('/') {
                        stripped.to_string()
                    } else {
                        format!("xl/{target}")
                    };

                    if rel_type.contains("worksheet") && !id.is_empty() && !target.is_empty() {
                        rels.worksheets.insert(id, full_path);
                    } else if rel_type.contains("sharedStrings") {
                        rels.shared_strings = Some(full_path);
                    } else if rel_type.contains("/styles") {
                        rels.styles = Some(full_path);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    rels
}

/// Read sheet names, part paths, and defined names from xl/workbook.xml.
fn read_workbook_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    relationships: &HashMap<String, String>,
) -> Result<(Vec<SheetEntry>, Vec<DefinedName>)> {
    let file = archive
        .by_name("xl/workbook.xml")
        .map_err(|_| CollateError::Decode("missing xl/workbook.xml part".to_string()))?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut entries = Vec::new();
    let mut defined_names = Vec::new();
    let mut buf = Vec::new();

    let mut current_name: Option<String> = None;
    let mut current_reference = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                let local_name = e.local_name();
                match local_name.as_ref() {
                    b"sheet" => {
                        let mut name = String::new();
                        let mut r_id = String::new();

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"name" => {
                                    name = std::str::from_utf8(&attr.value)
                                        .unwrap_or("")
                                        .to_string();
                                }
                                // r:id carries a namespace prefix
                                key if key.ends_with(b":id") || key == b"id" => {
                                    r_id = std::str::from_utf8(&attr.value)
                                        .unwrap_or("")
                                        .to_string();
                                }
                                _ => {}
                            }
                        }

                        if !name.is_empty() {
                            let path = relationships.get(&r_id).cloned().unwrap_or_else(|| {
                                let index = entries.len() + 1;
                                format!("xl/worksheets/sheet{index}.xml")
                            });
                            entries.push(SheetEntry { name, path });
                        }
                    }
                    b"definedName" => {
                        let mut name = String::new();
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"name" {
                                name =
                                    std::str::from_utf8(&attr.value).unwrap_or("").to_string();
                            }
                        }
                        if !name.is_empty() {
                            current_name = Some(name);
                            current_reference.clear();
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref t)) if current_name.is_some() => {
                if let Ok(text) = t.unescape() {
                    current_reference.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"definedName" {
                    if let Some(name) = current_name.take() {
                        if !current_reference.is_empty() {
                            defined_names.push(DefinedName {
                                name,
                                reference: std::mem::take(&mut current_reference),
                            });
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok((entries, defined_names))
}

/// Parse shared strings from the shared strings part.
fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<String> {
    let sst_path = path.unwrap_or("xl/sharedStrings.xml");
    let Ok(file) = archive.by_name(sst_path) else {
        return Vec::new();
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si => in_t = true,
                _ => {}
            },
            Ok(Event::Text(ref t)) if in_t => {
                if let Ok(text) = t.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(current.clone());
                    in_si = false;
                }
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    strings
}

/// Attach comments from the sheet's comments part, if one is linked.
fn attach_comments<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    entry: &SheetEntry,
    sheet: &mut Sheet,
) {
    let Some(comments_path) = comments_part_path(archive, &entry.path) else {
        return;
    };

    for (cell_ref, comment) in parse_comments_part(archive, &comments_path) {
        let Some((col, row)) = parse_cell_ref(&cell_ref) else {
            continue;
        };
        sheet.get_or_create_cell(row, col).comment = Some(comment);
    }
}

/// Find the comments part linked from a sheet's relationship file.
///
/// "xl/worksheets/sheet1.xml" relates through
/// "xl/worksheets/_rels/sheet1.xml.rels".
fn comments_part_path<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet_path: &str,
) -> Option<String> {
    let rels_path = match sheet_path.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{sheet_path}.rels"),
    };

    let file = archive.by_name(&rels_path).ok()?;
    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut target = String::new();
                    let mut rel_type = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Target" => {
                                target =
                                    std::str::from_utf8(&attr.value).unwrap_or("").to_string();
                            }
                            b"Type" => {
                                rel_type =
                                    std::str::from_utf8(&attr.value).unwrap_or("").to_string();
                            }
                            _ => {}
                        }
                    }

                    if rel_type.contains("comments") && !target.is_empty() {
                        let sheet_dir = match sheet_path.rsplit_once('/') {
                            Some((dir, _)) => format!("{dir}/"),
                            None => String::new(),
                        };
                        return Some(resolve_relative_path(&sheet_dir, &target));
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    None
}

/// Resolve a relationship target against a base directory.
///
/// Handles rooted targets ("/xl/comments1.xml") and parent traversal
/// ("../comments1.xml").
fn resolve_relative_path(base_dir: &str, relative: &str) -> String {
    if let Some(stripped) = relative.strip_prefix('/') {
        stripped.to_string()
    } else if let Some(stripped) = relative.strip_prefix("../") {
        let parent = match base_dir.trim_end_matches('/').rsplit_once('/') {
            Some((head, _)) => format!("{head}/"),
            None => String::new(),
        };
        resolve_relative_path(&parent, stripped)
    } else {
        format!("{base_dir}{relative}")
    }
}

/// Parse a comments part into (cell reference, comment) pairs.
fn parse_comments_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    comments_path: &str,
) -> Vec<(String, Comment)> {
    let Ok(file) = archive.by_name(comments_path) else {
        return Vec::new();
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut out = Vec::new();
    let mut authors: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    let mut in_authors = false;
    let mut in_author = false;
    let mut in_comment = false;
    let mut in_t = false;

    let mut current_author = String::new();
    let mut current_ref = String::new();
    let mut current_author_id: Option<u32> = None;
    let mut current_text = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"authors" => in_authors = true,
                b"author" if in_authors => {
                    in_author = true;
                    current_author.clear();
                }
                b"comment" => {
                    in_comment = true;
                    current_ref.clear();
                    current_author_id = None;
                    current_text.clear();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"ref" => {
                                current_ref =
                                    std::str::from_utf8(&attr.value).unwrap_or("").to_string();
                            }
                            b"authorId" => {
                                current_author_id = std::str::from_utf8(&attr.value)
                                    .ok()
                                    .and_then(|s| s.parse().ok());
                            }
                            _ => {}
                        }
                    }
                }
                b"t" if in_comment => in_t = true,
                _ => {}
            },
            Ok(Event::Text(ref t)) => {
                if in_author {
                    if let Ok(text) = t.unescape() {
                        current_author.push_str(&text);
                    }
                } else if in_t {
                    if let Ok(text) = t.unescape() {
                        current_text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"authors" => in_authors = false,
                b"author" => {
                    if in_author {
                        authors.push(current_author.clone());
                        in_author = false;
                    }
                }
                b"t" => in_t = false,
                b"comment" => {
                    if in_comment && !current_ref.is_empty() {
                        let author = current_author_id
                            .and_then(|id| authors.get(id as usize))
                            .filter(|a| !a.is_empty())
                            .cloned();
                        out.push((
                            current_ref.clone(),
                            Comment {
                                author,
                                text: std::mem::take(&mut current_text),
                            },
                        ));
                    }
                    in_comment = false;
                }
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use super::*;
    use crate::types::CellValue;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, content) in parts {
            writer.start_file(*path, FileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const WORKBOOK_XML: &str = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
<sheet name="First" sheetId="1" r:id="rId1"/>
<sheet name="Second" sheetId="2" r:id="rId2"/>
</sheets>
<definedNames>
<definedName name="Total">'First'!$B$2</definedName>
</definedNames>
</workbook>"#;

    const WORKBOOK_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
<Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

    #[test]
    fn assembles_sheets_strings_and_names() {
        let bytes = package(&[
            ("xl/workbook.xml", WORKBOOK_XML),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            (
                "xl/sharedStrings.xml",
                r#"<sst><si><t>alpha</t></si><si><r><t>be</t></r><r><t>ta</t></r></si></sst>"#,
            ),
            (
                "xl/styles.xml",
                r#"<styleSheet>
<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
<cellXfs count="1"><xf fontId="0" fillId="0" borderId="0"/></cellXfs>
</styleSheet>"#,
            ),
            (
                "xl/worksheets/sheet1.xml",
                r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="B2"><v>10</v></c></row>
</sheetData></worksheet>"#,
            ),
            (
                "xl/worksheets/sheet2.xml",
                r#"<worksheet><sheetData>
<row r="1"><c r="A1"><v>2</v></c></row>
</sheetData></worksheet>"#,
            ),
        ]);

        let workbook = parse_workbook(&bytes).unwrap();

        assert_eq!(workbook.sheets.len(), 2);
        assert_eq!(workbook.sheets[0].name, "First");
        assert_eq!(workbook.sheets[1].name, "Second");
        assert_eq!(
            workbook.sheets[0].cell(0, 0).unwrap().value,
            CellValue::Text("alpha".to_string())
        );
        // Rich text runs concatenate
        assert_eq!(
            workbook.sheets[0].cell(0, 1).unwrap().value,
            CellValue::Text("beta".to_string())
        );
        assert_eq!(workbook.defined_names.len(), 1);
        assert_eq!(workbook.defined_names[0].name, "Total");
        assert_eq!(workbook.defined_names[0].reference, "'First'!$B$2");
        assert_eq!(
            workbook.named_cell("Total").unwrap().value,
            CellValue::Number(10.0)
        );
    }

    #[test]
    fn comments_attach_to_their_cells() {
        let bytes = package(&[
            (
                "xl/workbook.xml",
                r#"<workbook><sheets><sheet name="Data" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<Relationships>
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#,
            ),
            (
                "xl/worksheets/sheet1.xml",
                r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData></worksheet>"#,
            ),
            (
                "xl/worksheets/_rels/sheet1.xml.rels",
                r#"<Relationships>
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments" Target="../comments1.xml"/>
</Relationships>"#,
            ),
            (
                "xl/comments1.xml",
                r#"<comments>
<authors><author>Reviewer</author></authors>
<commentList>
<comment ref="A1" authorId="0"><text><r><t>check this</t></r></text></comment>
</commentList>
</comments>"#,
            ),
        ]);

        let workbook = parse_workbook(&bytes).unwrap();
        let comment = workbook.sheets[0].cell(0, 0).unwrap().comment.clone();

        assert_eq!(
            comment,
            Some(Comment {
                author: Some("Reviewer".to_string()),
                text: "check this".to_string(),
            })
        );
    }

    #[test]
    fn missing_workbook_part_is_a_decode_error() {
        let bytes = package(&[("xl/styles.xml", "<styleSheet/>")]);
        let err = parse_workbook(&bytes).unwrap_err();
        assert!(matches!(err, CollateError::Decode(_)));
    }

    #[test]
    fn garbage_bytes_are_a_zip_error() {
        let err = parse_workbook(b"not an archive").unwrap_err();
        assert!(matches!(err, CollateError::Zip(_)));
    }

    #[test]
    fn sheet_paths_fall_back_without_relationships() {
        let bytes = package(&[
            (
                "xl/workbook.xml",
                r#"<workbook><sheets><sheet name="Only" sheetId="1" r:id="rId9"/></sheets></workbook>"#,
            ),
            (
                "xl/worksheets/sheet1.xml",
                r#"<worksheet><sheetData><row r="1"><c r="A1"><v>5</v></c></row></sheetData></worksheet>"#,
            ),
        ]);

        let workbook = parse_workbook(&bytes).unwrap();
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(
            workbook.sheets[0].cell(0, 0).unwrap().value,
            CellValue::Number(5.0)
        );
    }

    #[test]
    fn relative_paths_resolve_through_parents() {
        assert_eq!(
            resolve_relative_path("xl/worksheets/", "../comments1.xml"),
            "xl/comments1.xml"
        );
        assert_eq!(
            resolve_relative_path("xl/worksheets/", "comments1.xml"),
            "xl/worksheets/comments1.xml"
        );
        assert_eq!(
            resolve_relative_path("xl/worksheets/", "/xl/comments1.xml"),
            "xl/comments1.xml"
        );
    }
}
