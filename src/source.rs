//! The seam between the viewer and whatever parses spreadsheets.
//!
//! The viewer only ever needs two things from a parsed file: the ordered
//! sheet names and a row projection of one sheet. Any parser that can
//! produce a [`WorkbookSource`] plugs in through [`SheetParser`].

use crate::error::Result;
use crate::parser;
use crate::types::{Row, Workbook};

/// A parsed workbook as seen by the viewer.
pub trait WorkbookSource {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> &[String];

    /// Row-major projection of a sheet; `None` for an unknown name.
    fn rows(&self, sheet: &str) -> Option<Vec<Row>>;

    fn contains_sheet(&self, sheet: &str) -> bool {
        self.sheet_names().iter().any(|name| name == sheet)
    }
}

/// Turns raw upload bytes into a [`WorkbookSource`].
pub trait SheetParser {
    type Workbook: WorkbookSource;

    fn parse(&self, bytes: &[u8]) -> Result<Self::Workbook>;
}

/// The built-in OOXML parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxParser;

impl SheetParser for XlsxParser {
    type Workbook = Workbook;

    fn parse(&self, bytes: &[u8]) -> Result<Workbook> {
        parser::parse(bytes)
    }
}

impl WorkbookSource for Workbook {
    fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    fn rows(&self, sheet: &str) -> Option<Vec<Row>> {
        self.sheet(sheet).map(crate::types::Sheet::to_rows)
    }
}
