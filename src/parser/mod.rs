//! Main XLSX parser
//!
//! Opens the ZIP package, resolves part paths through the workbook
//! relationships, then reads the sheet list, the shared strings and every
//! worksheet in workbook order.

mod relationships;
mod worksheet;

use std::io::Cursor;
use zip::ZipArchive;

use crate::cell_ref::col_to_letter;
use crate::config::MAX_PROJECTED_CELLS;
use crate::error::{Result, XlexportError};
use crate::types::{Sheet, Workbook};

use relationships::{get_sheet_info, parse_shared_strings, parse_workbook_relationships};
use worksheet::parse_sheet;

/// Parse an XLSX file from bytes.
pub fn parse(data: &[u8]) -> Result<Workbook> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let relationships = parse_workbook_relationships(&mut archive);
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref())?;
    let sheet_info = get_sheet_info(&mut archive, &relationships.worksheets)?;

    let mut sheets = Vec::with_capacity(sheet_info.len());
    for info in &sheet_info {
        let sheet = parse_sheet(&mut archive, info, &shared_strings)?;
        check_projection(&sheet)?;
        sheets.push(sheet);
    }

    log::debug!(
        "parsed workbook: {} sheets, {} shared strings",
        sheets.len(),
        shared_strings.len()
    );
    Ok(Workbook::new(sheets))
}

/// Refuse sheets whose dense projection would not fit in memory.
fn check_projection(sheet: &Sheet) -> Result<()> {
    let cells = sheet.projected_cells();
    if cells <= MAX_PROJECTED_CELLS {
        return Ok(());
    }
    let last = sheet
        .extent()
        .map(|(r, c)| format!("{}{}", col_to_letter(c), u64::from(r) + 1))
        .unwrap_or_default();
    Err(XlexportError::Parse(format!(
        "sheet {:?} spans to {last}: {cells} cells exceeds the {MAX_PROJECTED_CELLS} cell limit",
        sheet.name
    )))
}
