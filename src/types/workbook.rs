use serde::{Deserialize, Serialize};

use super::{CellValue, Row};
use crate::config::MAX_PROJECTED_CELLS;

/// A single cell with its 0-indexed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    pub r: u32,
    pub c: u32,
    pub value: CellValue,
}

/// A named sheet holding sparse cells in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: String,
    pub cells: Vec<CellData>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    /// Last populated `(row, col)`, each taken independently.
    pub fn extent(&self) -> Option<(u32, u32)> {
        let max_row = self.cells.iter().map(|c| c.r).max()?;
        let max_col = self.cells.iter().map(|c| c.c).max()?;
        Some((max_row, max_col))
    }

    /// Number of cells [`Sheet::to_rows`] would allocate.
    pub fn projected_cells(&self) -> u64 {
        self.extent()
            .map_or(0, |(r, c)| (u64::from(r) + 1) * (u64::from(c) + 1))
    }

    /// Project the sparse cells to a dense row-major grid.
    ///
    /// Rows run from the first sheet row to the last row holding a cell;
    /// every row is as wide as the widest populated column. Gaps are
    /// [`CellValue::Empty`]. Later cells at the same position win.
    ///
    /// A sheet larger than [`MAX_PROJECTED_CELLS`] projects to no rows; the
    /// parser rejects such sheets before they get here.
    pub fn to_rows(&self) -> Vec<Row> {
        let Some((max_row, max_col)) = self.extent() else {
            return Vec::new();
        };
        if self.projected_cells() > MAX_PROJECTED_CELLS {
            log::warn!(
                "sheet {:?} too large to project ({} cells)",
                self.name,
                self.projected_cells()
            );
            return Vec::new();
        }
        let width = max_col as usize + 1;
        let mut rows = vec![vec![CellValue::Empty; width]; max_row as usize + 1];
        for cell in &self.cells {
            if let Some(slot) = rows
                .get_mut(cell.r as usize)
                .and_then(|row| row.get_mut(cell.c as usize))
            {
                *slot = cell.value.clone();
            }
        }
        rows
    }
}

/// A parsed workbook: the ordered sheets of one uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    /// Sheet names in workbook order (kept alongside for cheap borrowing).
    #[serde(skip)]
    pub(crate) sheet_names: Vec<String>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        let sheet_names = sheets.iter().map(|s| s.name.clone()).collect();
        Self {
            sheets,
            sheet_names,
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}
