//! Cell and row copying between documents.
//!
//! All cross-document content movement funnels through [`CellCopier`] so
//! styles dedupe through one registry and column widths are claimed once
//! per target column for the whole run.

use std::collections::HashSet;

use crate::registry::StyleRegistry;
use crate::types::{CellValue, Workbook};

/// How cell values translate on copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueCopy {
    /// Preserve each value as its own kind: text stays text, formulas stay
    /// formulas with their cached result.
    #[default]
    Typed,
    /// Collapse text and formula cells to their numeric display value.
    /// Reproduces the behavior of legacy consolidation pipelines that read
    /// every cell through a numeric accessor; text that does not parse as
    /// a number becomes 0.
    NumericDisplay,
}

impl ValueCopy {
    fn convert(self, value: &CellValue) -> CellValue {
        match self {
            Self::Typed => value.clone(),
            Self::NumericDisplay => match value {
                CellValue::Blank => CellValue::Blank,
                CellValue::Boolean(b) => CellValue::Boolean(*b),
                CellValue::Number(n) => CellValue::Number(*n),
                CellValue::Text(_) | CellValue::Formula { .. } => {
                    CellValue::Number(value.numeric())
                }
            },
        }
    }
}

/// Copies cells into one target sheet, deduplicating styles as it goes.
///
/// Scoped to a single run: the width-claim set and the style registry both
/// live exactly as long as the copier.
#[derive(Debug)]
pub struct CellCopier {
    registry: StyleRegistry,
    sizing: ColumnSizing,
    value_copy: ValueCopy,
    target_sheet: usize,
}

impl CellCopier {
    pub fn new(target: &Workbook, target_sheet: usize, value_copy: ValueCopy) -> Self {
        Self {
            registry: StyleRegistry::for_workbook(target),
            sizing: ColumnSizing::default(),
            value_copy,
            target_sheet,
        }
    }

    /// Copy one cell from `at = (row, col)` in the source sheet to
    /// `to = (row, col)` in the target sheet. Absent source cells are a
    /// no-op.
    ///
    /// The source column's width travels along the first time each target
    /// column receives a cell; later cells in that column leave the width
    /// alone, since it is a sheet-level property that must not be rewritten
    /// by every row.
    pub fn copy_cell(
        &mut self,
        source: &Workbook,
        source_sheet: usize,
        at: (u32, u32),
        target: &mut Workbook,
        to: (u32, u32),
    ) {
        let (source_row, source_col) = at;
        let (target_row, target_col) = to;
        let Some(sheet) = source.sheet(source_sheet) else {
            return;
        };
        let Some(cell) = sheet.cell(source_row, source_col) else {
            return;
        };

        let width = self
            .sizing
            .claim(target_col)
            .then(|| sheet.column_width(source_col));
        let style = self.registry.copy_style(source, cell.style, target);
        let value = self.value_copy.convert(&cell.value);
        let comment = cell.comment.clone();

        let Some(target_sheet) = target.sheet_mut(self.target_sheet) else {
            return;
        };
        if let Some(width) = width {
            target_sheet.set_column_width(target_col, width);
        }
        let target_cell = target_sheet.get_or_create_cell(target_row, target_col);
        target_cell.value = value;
        if style.is_some() {
            target_cell.style = style;
        }
        if comment.is_some() {
            target_cell.comment = comment;
        }
    }

    /// Copy one row: its effective height (resolved against the source
    /// sheet's default, pinned explicitly on the target, whose own default
    /// may differ), then every populated cell with its column shifted by
    /// `col_offset`. Absent source rows are a no-op; a present but
    /// cell-less source row still creates the target row so its height
    /// carries over.
    pub fn copy_row(
        &mut self,
        source: &Workbook,
        source_sheet: usize,
        source_row: u32,
        target: &mut Workbook,
        target_row: u32,
        col_offset: u32,
    ) {
        let Some(sheet) = source.sheet(source_sheet) else {
            return;
        };
        let Some(row) = sheet.row(source_row) else {
            return;
        };
        let height = Some(sheet.row_height(source_row));
        let cols: Vec<u32> = row.cells.keys().copied().collect();

        if let Some(sheet) = target.sheet_mut(self.target_sheet) {
            sheet.get_or_create_row(target_row).height = height;
        }
        for col in cols {
            self.copy_cell(
                source,
                source_sheet,
                (source_row, col),
                target,
                (target_row, col_offset.saturating_add(col)),
            );
        }
    }
}

/// Tracks which target columns already received a width this run.
#[derive(Debug, Default)]
struct ColumnSizing {
    seen: HashSet<u32>,
}

impl ColumnSizing {
    /// True the first time a column is claimed.
    fn claim(&mut self, col: u32) -> bool {
        self.seen.insert(col)
    }
}
