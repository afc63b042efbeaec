use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{Cell, MergeRange};

/// Column width in 1/256ths of a character, matching the storage unit of
/// the width attribute scaled by 256. 2048 is the stock 8-character column.
pub const DEFAULT_COLUMN_WIDTH: f64 = 2048.0;

/// Row height in points.
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// A single worksheet: sparse rows plus sheet-level layout state.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: String,
    /// Sparse rows keyed by 0-based row index.
    pub rows: BTreeMap<u32, Row>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_regions: Vec<MergeRange>,
    /// Manual page breaks; each entry breaks after that 0-based row.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub row_breaks: BTreeSet<u32>,
    /// Explicit column widths in 1/256ths of a character.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub col_widths: BTreeMap<u32, f64>,
    pub default_col_width: f64,
    pub default_row_height: f64,
    #[serde(default, skip_serializing_if = "HeaderFooter::is_empty")]
    pub header_footer: HeaderFooter,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            merged_regions: Vec::new(),
            row_breaks: BTreeSet::new(),
            col_widths: BTreeMap::new(),
            default_col_width: DEFAULT_COLUMN_WIDTH,
            default_row_height: DEFAULT_ROW_HEIGHT,
            header_footer: HeaderFooter::default(),
        }
    }

    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows.get(&index)
    }

    pub fn get_or_create_row(&mut self, index: u32) -> &mut Row {
        self.rows.entry(index).or_default()
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.rows.get(&row)?.cell(col)
    }

    pub fn get_or_create_cell(&mut self, row: u32, col: u32) -> &mut Cell {
        self.get_or_create_row(row).get_or_create_cell(col)
    }

    /// True when the sheet has no rows at all, not even empty ones.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when at least one row holds at least one cell.
    pub fn has_cells(&self) -> bool {
        self.rows.values().any(|row| !row.cells.is_empty())
    }

    /// Index of the last occupied row, `None` for an empty sheet.
    pub fn last_row_index(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    /// First row index past the current content; 0 for an empty sheet.
    pub fn next_row_index(&self) -> u32 {
        self.last_row_index().map_or(0, |last| last.saturating_add(1))
    }

    /// Number of columns spanned by cell content: one past the highest
    /// occupied column index, 0 when no cells exist.
    pub fn column_span(&self) -> u32 {
        self.rows
            .values()
            .filter_map(Row::last_cell_index)
            .max()
            .map_or(0, |col| col.saturating_add(1))
    }

    /// Width of one column, falling back to the sheet default.
    pub fn column_width(&self, col: u32) -> f64 {
        self.col_widths
            .get(&col)
            .copied()
            .unwrap_or(self.default_col_width)
    }

    pub fn set_column_width(&mut self, col: u32, width: f64) {
        self.col_widths.insert(col, width);
    }

    /// Total width of the first `columns` columns.
    pub fn span_width(&self, columns: u32) -> f64 {
        (0..columns).map(|col| self.column_width(col)).sum()
    }

    /// Total width of every column touched by cell content.
    pub fn content_width(&self) -> f64 {
        self.span_width(self.column_span())
    }

    /// Height of one row in points. Rows without an explicit height, and
    /// gap rows with no entry at all, take the sheet default.
    pub fn row_height(&self, index: u32) -> f64 {
        self.rows
            .get(&index)
            .and_then(|row| row.height)
            .unwrap_or(self.default_row_height)
    }

    /// Total height of rows `first..=last` in points, counting gap rows
    /// at the default height.
    pub fn height_between(&self, first: u32, last: u32) -> f64 {
        if last < first {
            return 0.0;
        }
        (first..=last).map(|row| self.row_height(row)).sum()
    }

    /// Printed height of all content, from row 0 through the last row.
    pub fn content_height(&self) -> f64 {
        self.last_row_index()
            .map_or(0.0, |last| self.height_between(0, last))
    }

    /// Record a manual page break after `row`. Duplicates collapse.
    pub fn set_row_break(&mut self, row: u32) {
        self.row_breaks.insert(row);
    }

    pub fn last_row_break(&self) -> Option<u32> {
        self.row_breaks.iter().next_back().copied()
    }

    pub fn add_merged_region(&mut self, region: MergeRange) {
        self.merged_regions.push(region);
    }

    /// Install a right-aligned "Page N of M" footer on every page.
    pub fn set_page_number_footer(&mut self) {
        self.header_footer.odd_footer = Some("&RPage &P of &N".to_string());
    }
}

/// A sparse row: optional explicit height plus cells keyed by column.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Explicit height in points; `None` means the sheet default applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub cells: BTreeMap<u32, Cell>,
}

impl Row {
    pub fn cell(&self, col: u32) -> Option<&Cell> {
        self.cells.get(&col)
    }

    pub fn get_or_create_cell(&mut self, col: u32) -> &mut Cell {
        self.cells.entry(col).or_default()
    }

    /// Highest occupied column index in this row.
    pub fn last_cell_index(&self) -> Option<u32> {
        self.cells.keys().next_back().copied()
    }
}

/// Page header and footer text in the encoded control format
/// (`&L`/`&C`/`&R` section markers, `&P` page number, `&N` page count).
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFooter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odd_header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odd_footer: Option<String>,
}

impl HeaderFooter {
    pub fn is_empty(&self) -> bool {
        self.odd_header.is_none() && self.odd_footer.is_none()
    }
}
