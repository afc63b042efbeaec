//! The workbook model shared by the decoder, the layout engine, and the
//! encoder.

mod cell;
mod sheet;
mod style;
mod workbook;

pub use cell::*;
pub use sheet::*;
pub use style::*;
pub use workbook::*;
