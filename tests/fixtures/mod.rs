//! Document builders shared by the integration tests.
//!
//! Everything here produces finished packages (byte buffers), since the
//! integration suite exercises the byte-level entry points. Model-level
//! variants are exposed too for tests that need to tweak a workbook
//! before encoding it.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

use xlcollate::{write_workbook, CellStyle, CellValue, Font, Workbook};

/// Serialize a model workbook, panicking on failure.
pub fn encode(workbook: &Workbook) -> Vec<u8> {
    write_workbook(workbook).unwrap()
}

/// A one-sheet workbook holding a `rows` x `cols` numeric grid.
///
/// Cell `(r, c)` holds `base + r * cols + c`, so every cell value is
/// unique and its source position recoverable in assertions.
pub fn grid_workbook(rows: u32, cols: u32, base: f64) -> Workbook {
    let mut wb = Workbook::new();
    let index = wb.add_sheet("Data");
    let sheet = wb.sheet_mut(index).unwrap();
    for row in 0..rows {
        for col in 0..cols {
            let value = base + f64::from(row * cols + col);
            sheet.get_or_create_cell(row, col).value = CellValue::Number(value);
        }
    }
    wb
}

/// [`grid_workbook`] serialized to package bytes.
pub fn grid_source(rows: u32, cols: u32, base: f64) -> Vec<u8> {
    encode(&grid_workbook(rows, cols, base))
}

/// A one-cell workbook whose cell carries a bold font and a solid fill.
///
/// Two calls with the same `fill` produce structurally identical styles,
/// which is what the deduplication tests need.
pub fn styled_workbook(fill: &str, text: &str) -> Workbook {
    let mut wb = Workbook::new();
    let font_id = wb.add_font(Font {
        bold: true,
        ..Font::default()
    });
    let style_id = wb.add_style(CellStyle {
        font_id,
        fill_fg: Some(fill.to_string()),
        ..CellStyle::default()
    });
    let index = wb.add_sheet("Styled");
    let sheet = wb.sheet_mut(index).unwrap();
    let cell = sheet.get_or_create_cell(0, 0);
    cell.value = CellValue::Text(text.to_string());
    cell.style = Some(style_id);
    wb
}

/// [`styled_workbook`] serialized to package bytes.
pub fn styled_source(fill: &str, text: &str) -> Vec<u8> {
    encode(&styled_workbook(fill, text))
}

/// Assemble a package from literal parts, the way a foreign producer
/// would write it. No part content is validated or rewritten.
pub fn raw_package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (path, content) in parts {
        writer.start_file(*path, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
