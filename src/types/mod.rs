//! Data types for parsed workbooks.

mod cell;
mod workbook;

pub use cell::*;
pub use workbook::*;
