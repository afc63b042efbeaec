//! Decoding and assertion helpers shared by the integration tests.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use xlcollate::{parse_workbook, CellValue, Workbook};

/// Decode bytes that the test expects to be a valid package.
pub fn decode(bytes: &[u8]) -> Workbook {
    parse_workbook(bytes).unwrap()
}

/// The value at `(row, col)` of the document's first sheet.
pub fn value_at(workbook: &Workbook, row: u32, col: u32) -> CellValue {
    workbook
        .sheet(0)
        .unwrap()
        .cell(row, col)
        .unwrap_or_else(|| panic!("no cell at ({row}, {col})"))
        .value
        .clone()
}

/// Like [`value_at`], but insists the value is a number.
pub fn number_at(workbook: &Workbook, row: u32, col: u32) -> f64 {
    match value_at(workbook, row, col) {
        CellValue::Number(n) => n,
        other => panic!("expected a number at ({row}, {col}), found {other:?}"),
    }
}

/// The first sheet's manual row breaks in ascending order.
pub fn breaks(workbook: &Workbook) -> Vec<u32> {
    workbook
        .sheet(0)
        .unwrap()
        .row_breaks
        .iter()
        .copied()
        .collect()
}
