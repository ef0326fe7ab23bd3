//! xlexport - XLSX sheet viewer with remote export
//!
//! Parses an uploaded workbook in WebAssembly, shows one sheet at a time as
//! a table and posts the original file plus the active sheet name to an
//! export service, handing the returned workbook back as a download.
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { XlExport } from 'xlexport';
//! await init();
//! const app = new XlExport(document.getElementById('app'), 'http://localhost:8000');
//! // pick a file in the mounted input, then:
//! await app.exportModified();
//! ```

// Parsing modules
pub mod cell_ref;
pub mod error;
pub mod parser;
pub mod source;
pub mod types;
pub mod xml_helpers;

// Viewer, export and page rendering
pub mod config;
pub mod export;
pub mod logging;
pub mod render;
pub mod viewer;

#[cfg(target_arch = "wasm32")]
pub mod web;

use wasm_bindgen::prelude::*;

pub use config::ExportConfig;
pub use error::{Result, XlexportError};
pub use source::{SheetParser, WorkbookSource, XlsxParser};
pub use types::*;
pub use viewer::{ExcelViewer, ViewModel};

#[cfg(target_arch = "wasm32")]
pub use web::XlExport;

/// Parse an XLSX file and return its sheet names in workbook order.
///
/// # Errors
/// Returns an error if the XLSX file is invalid or cannot be parsed.
#[wasm_bindgen]
pub fn sheet_names(data: &[u8]) -> std::result::Result<Vec<String>, JsValue> {
    let workbook = parser::parse(data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Parse an XLSX file and return the row projection of one sheet as a `JsValue`.
///
/// # Errors
/// Returns an error if the file cannot be parsed or has no sheet by that name.
#[wasm_bindgen]
pub fn sheet_rows(data: &[u8], sheet: &str) -> std::result::Result<JsValue, JsValue> {
    let workbook = parser::parse(data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let rows = workbook
        .rows(sheet)
        .ok_or_else(|| JsValue::from_str(&XlexportError::UnknownSheet(sheet.into()).to_string()))?;
    serde_wasm_bindgen::to_value(&rows)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
