//! xlcollate - workbook consolidation for XLSX
//!
//! Merges the sheets of many XLSX documents into one paginated sheet:
//! items flow left-to-right within a row, rows flow top-to-bottom, and
//! manual row breaks mark the page boundaries. Values, styles, row
//! heights, column widths, merged regions, and comments all carry over.
//! [`split_by_pages`] is the inverse: it cuts a paginated sheet back
//! into one workbook per page.
//!
//! # Usage
//!
//! ```no_run
//! use xlcollate::{consolidate_to_bytes, ConsolidateOptions};
//!
//! # fn main() -> xlcollate::Result<()> {
//! let sources = vec![
//!     std::fs::read("north.xlsx")?,
//!     std::fs::read("south.xlsx")?,
//! ];
//! let merged = consolidate_to_bytes(&sources, &ConsolidateOptions::default())?;
//! std::fs::write("merged.xlsx", merged)?;
//! # Ok(())
//! # }
//! ```

pub mod cell_ref;
pub mod consolidate;
pub mod copy;
pub mod error;
pub mod export;
pub mod formula;
pub mod parser;
pub mod regions;
pub mod registry;
pub mod split;
pub mod types;

pub use consolidate::{
    collect_styles_only, consolidate, consolidate_to_bytes, consolidate_workbooks,
    ConsolidateOptions, DEFAULT_MAX_PAGE_HEIGHT, DEFAULT_MAX_PAGE_WIDTH,
};
pub use copy::{CellCopier, ValueCopy};
pub use error::{CollateError, Result};
pub use export::write_workbook;
pub use formula::Expr;
pub use parser::parse_workbook;
pub use split::split_by_pages;
pub use types::*;

/// The library version.
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
