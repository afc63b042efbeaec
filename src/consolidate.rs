//! The placement and pagination engine.
//!
//! Consolidation lays the sheets of many source documents into one target
//! sheet: items go left-to-right within a row of items, rows of items go
//! top-to-bottom, and explicit row breaks mark page boundaries so the
//! result paginates correctly when printed. Placement is greedy and
//! single-pass; it makes no attempt at optimal packing.

use crate::copy::{CellCopier, ValueCopy};
use crate::error::{CollateError, Result};
use crate::parser::parse_workbook;
use crate::regions;
use crate::registry::StyleRegistry;
use crate::types::{Sheet, Workbook};

/// Default page height budget in points (an A4 page).
pub const DEFAULT_MAX_PAGE_HEIGHT: f64 = 842.0;

/// Default page width budget in column width units (1/256ths of a
/// character), roughly 107 characters.
pub const DEFAULT_MAX_PAGE_WIDTH: f64 = 27500.0;

/// Layout budgets for one consolidation run.
#[derive(Debug, Clone)]
pub struct ConsolidateOptions {
    /// Items allowed on a page before a break is recorded; `None` means
    /// pages are bounded by height alone.
    pub max_items_per_page: Option<u32>,
    /// Items allowed in one row of items; `None` means rows are bounded
    /// by width alone.
    pub max_items_per_row: Option<u32>,
    /// Give every item its own row of items and its own page.
    pub force_page_breaks: bool,
    /// Page height budget in points.
    pub max_page_height: f64,
    /// Page width budget in column width units.
    pub max_page_width: f64,
    pub value_copy: ValueCopy,
}

impl Default for ConsolidateOptions {
    fn default() -> Self {
        Self {
            max_items_per_page: None,
            max_items_per_row: None,
            force_page_breaks: false,
            max_page_height: DEFAULT_MAX_PAGE_HEIGHT,
            max_page_width: DEFAULT_MAX_PAGE_WIDTH,
            value_copy: ValueCopy::default(),
        }
    }
}

impl ConsolidateOptions {
    /// Reject budgets the placement arithmetic cannot act on.
    fn validate(&self) -> Result<()> {
        if self.max_items_per_page == Some(0) {
            return Err(CollateError::Config(
                "max_items_per_page must be at least 1".to_string(),
            ));
        }
        if self.max_items_per_row == Some(0) {
            return Err(CollateError::Config(
                "max_items_per_row must be at least 1".to_string(),
            ));
        }
        if !self.max_page_height.is_finite() || self.max_page_height <= 0.0 {
            return Err(CollateError::Config(
                "max_page_height must be a positive number".to_string(),
            ));
        }
        if !self.max_page_width.is_finite() || self.max_page_width <= 0.0 {
            return Err(CollateError::Config(
                "max_page_width must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the next item lands in the target sheet.
///
/// `row_offset` and `column_offset` are the next free coordinates;
/// `items_in_row` and `items_in_page` drive the break decisions. Offsets
/// never decrease within a run; `column_offset` and `items_in_row` reset
/// to 0 when a new row of items starts, `items_in_page` when a new page
/// starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementState {
    pub row_offset: u32,
    pub column_offset: u32,
    pub items_in_row: u32,
    pub items_in_page: u32,
}

impl PlacementState {
    /// Decide where an item of the given size goes, mutating offsets and
    /// counters. Returns the row to mark with a page break when one is due;
    /// the caller records it before copying the item.
    ///
    /// A new row of items starts when the item would push the current
    /// row's accumulated width past the budget, when the per-row item
    /// count is exceeded, or unconditionally under forced breaks. The page
    /// decision only runs on that transition: the page is full when the
    /// per-page item count is reached, the accumulated page height plus
    /// this item's height overflows, or breaks are forced. Nothing is
    /// recorded while the target is still empty, so the first item never
    /// opens with a spurious break.
    pub fn advance(
        &mut self,
        target: &Sheet,
        item_width: f64,
        item_height: f64,
        options: &ConsolidateOptions,
    ) -> Option<u32> {
        self.items_in_row = self.items_in_row.saturating_add(1);

        let row_width = target.span_width(self.column_offset);
        let row_full = item_width + row_width > options.max_page_width
            || options
                .max_items_per_row
                .is_some_and(|max| self.items_in_row > max)
            || options.force_page_breaks;
        if !row_full {
            return None;
        }

        self.row_offset = target.next_row_index();
        self.column_offset = 0;
        self.items_in_row = 0;
        self.items_in_page = self.items_in_page.saturating_add(1);

        let used_height = match target.last_row_break() {
            Some(after) => target
                .last_row_index()
                .map_or(0.0, |last| target.height_between(after.saturating_add(1), last)),
            None => target.content_height(),
        };
        let page_full = options
            .max_items_per_page
            .is_some_and(|max| self.items_in_page == max)
            || options.force_page_breaks
            || used_height + item_height > options.max_page_height;
        if !page_full {
            return None;
        }

        self.items_in_page = 0;
        target.last_row_index()
    }

    /// Claim `columns` columns for the item just placed, so the next item
    /// in the same row of items lands to its right.
    pub fn occupy(&mut self, columns: u32) {
        self.column_offset = self.column_offset.saturating_add(columns);
    }
}

/// Merge the sheets of every source document into one paginated document.
///
/// Sources are decoded up front; any buffer that is not a valid document
/// aborts the whole call with no partial result.
pub fn consolidate<B: AsRef<[u8]>>(
    sources: &[B],
    options: &ConsolidateOptions,
) -> Result<Workbook> {
    options.validate()?;
    let mut decoded = Vec::with_capacity(sources.len());
    for bytes in sources {
        decoded.push(parse_workbook(bytes.as_ref())?);
    }
    consolidate_workbooks(&decoded, options)
}

/// [`consolidate`] followed by serialization of the result.
pub fn consolidate_to_bytes<B: AsRef<[u8]>>(
    sources: &[B],
    options: &ConsolidateOptions,
) -> Result<Vec<u8>> {
    let target = consolidate(sources, options)?;
    crate::export::write_workbook(&target)
}

/// Core of [`consolidate`] for already-decoded documents.
pub fn consolidate_workbooks(
    sources: &[Workbook],
    options: &ConsolidateOptions,
) -> Result<Workbook> {
    options.validate()?;

    let mut target = Workbook::new();
    // the style table fills completely before any cell is written; some
    // viewers corrupt workbooks whose style table grows interleaved with
    // data writes
    collect_styles_into(sources, &mut target);

    let target_sheet = target.add_sheet("Sheet1");
    let mut copier = CellCopier::new(&target, target_sheet, options.value_copy);
    let mut state = PlacementState::default();

    for source in sources {
        for sheet_index in 0..source.sheets.len() {
            place_sheet(
                source,
                sheet_index,
                &mut target,
                target_sheet,
                &mut copier,
                &mut state,
                options,
            );
        }
    }
    Ok(target)
}

/// Merge only the font and style tables of the sources into a target
/// document (a fresh one when none is supplied), placing no content.
pub fn collect_styles_only<B: AsRef<[u8]>>(
    sources: &[B],
    target: Option<Workbook>,
) -> Result<Workbook> {
    let mut target = target.unwrap_or_default();
    let mut decoded = Vec::with_capacity(sources.len());
    for bytes in sources {
        decoded.push(parse_workbook(bytes.as_ref())?);
    }
    collect_styles_into(&decoded, &mut target);
    Ok(target)
}

fn collect_styles_into(sources: &[Workbook], target: &mut Workbook) {
    let mut registry = StyleRegistry::for_workbook(target);
    for source in sources {
        // every font travels, referenced by a style or not
        for font in &source.fonts {
            registry.copy_font(Some(font), target);
        }
        for index in 0..source.styles.len() {
            let id = u32::try_from(index).unwrap_or(u32::MAX);
            registry.copy_style(source, Some(id), target);
        }
    }
}

/// Place one source sheet into the target as a single item.
fn place_sheet(
    source: &Workbook,
    sheet_index: usize,
    target: &mut Workbook,
    target_sheet: usize,
    copier: &mut CellCopier,
    state: &mut PlacementState,
    options: &ConsolidateOptions,
) {
    let Some(sheet) = source.sheet(sheet_index) else {
        return;
    };
    if sheet.is_empty() {
        return;
    }

    let item_width = sheet.content_width();
    let item_height = sheet.content_height();
    let source_rows: Vec<u32> = sheet.rows.keys().copied().collect();
    let merges = sheet.merged_regions.clone();

    let break_row = match target.sheet(target_sheet) {
        Some(target_ref) => state.advance(target_ref, item_width, item_height, options),
        None => return,
    };
    if let Some(row) = break_row {
        if let Some(target_ref) = target.sheet_mut(target_sheet) {
            target_ref.set_row_break(row);
        }
    }

    for row in source_rows {
        copier.copy_row(
            source,
            sheet_index,
            row,
            target,
            state.row_offset.saturating_add(row),
            state.column_offset,
        );
    }

    let shifted = regions::shift(
        &merges,
        i64::from(state.row_offset),
        i64::from(state.column_offset),
    );
    if let Some(target_ref) = target.sheet_mut(target_sheet) {
        for region in shifted {
            target_ref.add_merged_region(region);
        }
    }

    state.occupy(sheet.column_span());
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]

    use super::*;
    use crate::types::{CellValue, MergeRange};

    /// One-sheet document with `rows` x `cols` numbered cells.
    fn item(rows: u32, cols: u32, tag: f64) -> Workbook {
        let mut wb = Workbook::new();
        wb.add_sheet("Item");
        let sheet = wb.sheet_mut(0).unwrap();
        for row in 0..rows {
            for col in 0..cols {
                sheet.get_or_create_cell(row, col).value =
                    CellValue::Number(tag + f64::from(row * cols + col));
            }
        }
        wb
    }

    fn breaks(target: &Workbook) -> Vec<u32> {
        target.sheet(0).unwrap().row_breaks.iter().copied().collect()
    }

    #[test]
    fn single_item_lands_at_origin() {
        let target =
            consolidate_workbooks(&[item(2, 2, 0.0)], &ConsolidateOptions::default()).unwrap();
        let sheet = target.sheet(0).unwrap();
        assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::Number(0.0));
        assert_eq!(sheet.cell(1, 1).unwrap().value, CellValue::Number(3.0));
        assert_eq!(sheet.last_row_index(), Some(1));
        assert!(breaks(&target).is_empty());
    }

    #[test]
    fn items_share_a_row_while_width_allows() {
        let sources = [item(1, 1, 1.0), item(1, 1, 2.0)];
        let target = consolidate_workbooks(&sources, &ConsolidateOptions::default()).unwrap();
        let sheet = target.sheet(0).unwrap();
        // second item sits to the right of the first, same row band
        assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::Number(1.0));
        assert_eq!(sheet.cell(0, 1).unwrap().value, CellValue::Number(2.0));
        assert_eq!(sheet.last_row_index(), Some(0));
    }

    #[test]
    fn forced_breaks_stack_items_on_separate_pages() {
        let mut b = item(3, 2, 10.0);
        b.sheet_mut(0)
            .unwrap()
            .add_merged_region(MergeRange::new(0, 0, 1, 1));
        let sources = [item(2, 1, 0.0), b];

        let options = ConsolidateOptions {
            max_items_per_row: Some(1),
            force_page_breaks: true,
            ..ConsolidateOptions::default()
        };
        let target = consolidate_workbooks(&sources, &options).unwrap();
        let sheet = target.sheet(0).unwrap();

        assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::Number(0.0));
        assert_eq!(sheet.cell(2, 0).unwrap().value, CellValue::Number(10.0));
        assert_eq!(sheet.last_row_index(), Some(4));
        // one break between the two items, none before the first
        assert_eq!(breaks(&target), vec![1]);
        // the merge moved down with its sheet
        assert_eq!(
            sheet.merged_regions,
            vec![MergeRange::new(2, 0, 3, 1)]
        );
    }

    #[test]
    fn per_row_limit_starts_a_new_band_for_the_overflowing_item() {
        let sources = [item(1, 1, 1.0), item(1, 1, 2.0), item(1, 1, 3.0)];
        let options = ConsolidateOptions {
            max_items_per_row: Some(1),
            ..ConsolidateOptions::default()
        };
        let target = consolidate_workbooks(&sources, &options).unwrap();
        let sheet = target.sheet(0).unwrap();

        // the item that trips the limit opens the new band uncounted, so
        // the third item joins it there
        assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::Number(1.0));
        assert_eq!(sheet.cell(1, 0).unwrap().value, CellValue::Number(2.0));
        assert_eq!(sheet.cell(1, 1).unwrap().value, CellValue::Number(3.0));
    }

    #[test]
    fn page_item_cap_limits_items_between_breaks() {
        let sources: Vec<Workbook> = (0..5).map(|i| item(1, 1, f64::from(i))).collect();
        let options = ConsolidateOptions {
            max_items_per_page: Some(2),
            // every item overflows the width budget, so each starts a row
            max_page_width: 2048.0,
            ..ConsolidateOptions::default()
        };
        let target = consolidate_workbooks(&sources, &options).unwrap();

        assert_eq!(breaks(&target), vec![1, 3]);
        // pages hold rows {0,1}, {2,3}, {4}: never more than two items
        let sheet = target.sheet(0).unwrap();
        assert_eq!(sheet.last_row_index(), Some(4));
    }

    #[test]
    fn height_overflow_breaks_the_page() {
        let sources: Vec<Workbook> = (0..3).map(|i| item(1, 1, f64::from(i))).collect();
        let options = ConsolidateOptions {
            max_page_width: 2048.0,
            // two default 15pt rows never fit
            max_page_height: 20.0,
            ..ConsolidateOptions::default()
        };
        let target = consolidate_workbooks(&sources, &options).unwrap();
        assert_eq!(breaks(&target), vec![0, 1]);
    }

    #[test]
    fn empty_sheets_place_nothing() {
        let mut source = Workbook::new();
        source.add_sheet("Empty");
        source.add_sheet("Data");
        {
            let sheet = source.sheet_mut(1).unwrap();
            sheet.get_or_create_cell(0, 0).value = CellValue::Text("only me".into());
            sheet.add_merged_region(MergeRange::new(0, 0, 0, 1));
        }

        let target = consolidate_workbooks(&[source], &ConsolidateOptions::default()).unwrap();
        let sheet = target.sheet(0).unwrap();
        assert_eq!(sheet.last_row_index(), Some(0));
        assert_eq!(sheet.merged_regions.len(), 1);
        assert_eq!(
            sheet.cell(0, 0).unwrap().value,
            CellValue::Text("only me".into())
        );
    }

    #[test]
    fn zero_budgets_are_rejected() {
        let bad_page = ConsolidateOptions {
            max_items_per_page: Some(0),
            ..ConsolidateOptions::default()
        };
        assert!(matches!(
            consolidate_workbooks(&[], &bad_page),
            Err(CollateError::Config(_))
        ));

        let bad_height = ConsolidateOptions {
            max_page_height: f64::NAN,
            ..ConsolidateOptions::default()
        };
        assert!(matches!(
            consolidate_workbooks(&[], &bad_height),
            Err(CollateError::Config(_))
        ));
    }

    #[test]
    fn advance_is_a_no_op_while_the_row_has_room() {
        let target = Sheet::new("Target");
        let mut state = PlacementState::default();
        let options = ConsolidateOptions::default();

        let break_row = state.advance(&target, 100.0, 15.0, &options);
        assert_eq!(break_row, None);
        assert_eq!(state.row_offset, 0);
        assert_eq!(state.column_offset, 0);
        assert_eq!(state.items_in_row, 1);
        assert_eq!(state.items_in_page, 0);
    }

    #[test]
    fn advance_suppresses_the_break_on_an_empty_target() {
        let target = Sheet::new("Target");
        let mut state = PlacementState::default();
        let options = ConsolidateOptions {
            force_page_breaks: true,
            ..ConsolidateOptions::default()
        };

        let break_row = state.advance(&target, 100.0, 15.0, &options);
        assert_eq!(break_row, None);
        assert_eq!(state.items_in_page, 0);
    }

    #[test]
    fn advance_moves_to_the_next_free_row_on_overflow() {
        let mut target = Sheet::new("Target");
        target.get_or_create_cell(4, 0).value = CellValue::Number(1.0);
        let mut state = PlacementState {
            row_offset: 0,
            column_offset: 1,
            items_in_row: 1,
            items_in_page: 0,
        };
        let options = ConsolidateOptions {
            max_items_per_row: Some(1),
            ..ConsolidateOptions::default()
        };

        state.advance(&target, 2048.0, 15.0, &options);
        assert_eq!(state.row_offset, 5);
        assert_eq!(state.column_offset, 0);
        assert_eq!(state.items_in_row, 0);
        assert_eq!(state.items_in_page, 1);
    }

    #[test]
    fn offsets_stay_monotonic_across_a_run() {
        let mut target = Sheet::new("Target");
        let mut state = PlacementState::default();
        let options = ConsolidateOptions {
            max_items_per_row: Some(2),
            ..ConsolidateOptions::default()
        };

        let mut previous_row = 0;
        for placed in 0..5 {
            state.advance(&target, 2048.0, 15.0, &options);
            assert!(state.row_offset >= previous_row);
            if state.column_offset == 0 {
                assert!(placed == 0 || state.row_offset > previous_row);
            }
            previous_row = state.row_offset;

            let cell = target.get_or_create_cell(state.row_offset, state.column_offset);
            cell.value = CellValue::Number(f64::from(placed));
            state.occupy(1);
        }

        assert_eq!(state.row_offset, 1);
        assert_eq!(target.rows.len(), 2);
    }

    #[test]
    fn occupy_accumulates_columns() {
        let mut state = PlacementState::default();
        state.occupy(3);
        state.occupy(2);
        assert_eq!(state.column_offset, 5);
    }
}
