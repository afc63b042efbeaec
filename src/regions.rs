//! Merged-region arithmetic: shifting region lists when content moves and
//! cropping them when a rectangular slice of a sheet is extracted.
//!
//! Both operations are pure; callers append the results to the destination
//! sheet themselves. Extracting a slice composes them as shift-after-filter.

use crate::types::MergeRange;

/// Apply a signed delta to an index, clamping at 0.
fn offset_index(index: u32, delta: i64) -> u32 {
    let shifted = i64::from(index).saturating_add(delta).max(0);
    u32::try_from(shifted).unwrap_or(u32::MAX)
}

/// Shift every region by `(row_offset, col_offset)`.
///
/// Start coordinates clamp at 0; end coordinates clamp at the shifted
/// start, so a large negative offset can shrink a region to a single
/// cell but never invert it.
pub fn shift(regions: &[MergeRange], row_offset: i64, col_offset: i64) -> Vec<MergeRange> {
    regions
        .iter()
        .map(|region| {
            let start_row = offset_index(region.start_row, row_offset);
            let start_col = offset_index(region.start_col, col_offset);
            let end_row = offset_index(region.end_row, row_offset).max(start_row);
            let end_col = offset_index(region.end_col, col_offset).max(start_col);
            MergeRange::new(start_row, start_col, end_row, end_col)
        })
        .collect()
}

/// Crop every region to the rectangle given by the four bounds.
///
/// A `None` bound leaves that side open. Regions that crop away
/// completely (start past end on either axis) are dropped.
pub fn filter(
    regions: &[MergeRange],
    first_row: Option<u32>,
    last_row: Option<u32>,
    first_col: Option<u32>,
    last_col: Option<u32>,
) -> Vec<MergeRange> {
    regions
        .iter()
        .filter_map(|region| {
            let start_row = first_row.map_or(region.start_row, |b| region.start_row.max(b));
            let end_row = last_row.map_or(region.end_row, |b| region.end_row.min(b));
            let start_col = first_col.map_or(region.start_col, |b| region.start_col.max(b));
            let end_col = last_col.map_or(region.end_col, |b| region.end_col.min(b));
            (start_row <= end_row && start_col <= end_col)
                .then(|| MergeRange::new(start_row, start_col, end_row, end_col))
        })
        .collect()
}
