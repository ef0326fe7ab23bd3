//! Common test utilities and assertion helpers.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use xlexport::{Workbook, WorkbookSource};

// Re-export fixtures for convenience
pub use super::fixtures::*;

/// Parse XLSX bytes, panicking on failure.
#[must_use]
pub fn parse_workbook(data: &[u8]) -> Workbook {
    xlexport::parser::parse(data).expect("Failed to parse XLSX")
}

/// The display text of every cell in a sheet's projection.
#[must_use]
pub fn display_rows(workbook: &Workbook, sheet: &str) -> Vec<Vec<String>> {
    workbook
        .rows(sheet)
        .unwrap_or_else(|| panic!("sheet {sheet:?} not in workbook"))
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect()
}

/// Assert the display text of one cell (0-based row/col).
pub fn assert_cell_text(workbook: &Workbook, sheet: &str, row: usize, col: usize, expected: &str) {
    let rows = display_rows(workbook, sheet);
    let actual = rows
        .get(row)
        .and_then(|r| r.get(col))
        .unwrap_or_else(|| panic!("no cell at row {row}, col {col} in {sheet:?}"));
    assert_eq!(actual, expected, "cell ({row}, {col}) of {sheet:?}");
}
