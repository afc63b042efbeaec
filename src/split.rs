//! Splitting a paginated document back into one document per page.

use crate::copy::{CellCopier, ValueCopy};
use crate::regions;
use crate::types::{Sheet, Workbook};

/// Split a document into one single-sheet document per printed page.
///
/// Page boundaries are the sheet's manual row breaks: each break ends a
/// page after its row, and whatever follows the last break forms the
/// final page. Every page is re-anchored to row 0, its merged regions
/// cropped to the page band and shifted to match, and the styles its
/// cells reference deduplicated into the fresh document. Pages with no
/// populated cells (a break with nothing after it) are dropped.
pub fn split_by_pages(source: &Workbook) -> Vec<Workbook> {
    let mut pages = Vec::new();
    for (sheet_index, sheet) in source.sheets.iter().enumerate() {
        let Some(last_row) = sheet.last_row_index() else {
            continue;
        };

        let mut bounds = Vec::new();
        let mut start: u32 = 0;
        for &brk in &sheet.row_breaks {
            bounds.push((start, brk));
            start = brk.saturating_add(1);
        }
        if start <= last_row {
            bounds.push((start, last_row));
        }

        for (first, last) in bounds {
            let page = extract_page(source, sheet_index, sheet, first, last);
            if page_has_cells(&page) {
                pages.push(page);
            }
        }
    }
    pages
}

/// Copy rows `first..=last` of one sheet into a fresh single-sheet
/// document, re-anchored so `first` becomes row 0.
fn extract_page(
    source: &Workbook,
    sheet_index: usize,
    sheet: &Sheet,
    first: u32,
    last: u32,
) -> Workbook {
    let mut page = Workbook::new();
    let page_sheet = page.add_sheet(sheet.name.clone());
    if let Some(target) = page.sheet_mut(page_sheet) {
        target.default_col_width = sheet.default_col_width;
        target.default_row_height = sheet.default_row_height;
    }

    let mut copier = CellCopier::new(&page, page_sheet, ValueCopy::Typed);
    let rows: Vec<u32> = sheet.rows.range(first..=last).map(|(&row, _)| row).collect();
    for row in rows {
        copier.copy_row(
            source,
            sheet_index,
            row,
            &mut page,
            row.saturating_sub(first),
            0,
        );
    }

    let merges = regions::shift(
        &regions::filter(&sheet.merged_regions, Some(first), Some(last), None, None),
        -i64::from(first),
        0,
    );
    if let Some(target) = page.sheet_mut(page_sheet) {
        for region in merges {
            target.add_merged_region(region);
        }
    }
    page
}

fn page_has_cells(page: &Workbook) -> bool {
    page.sheets.iter().any(Sheet::has_cells)
}
