//! Structured error types for xlexport.
//!
//! Every failure the viewer can hit ends up as one of these variants. The
//! controller turns them into a single user-visible message via
//! [`XlexportError::user_message`]; the underlying cause only goes to the log.

/// Message shown for any failure while reading or parsing an upload.
pub const READ_ERROR_MESSAGE: &str = "error reading file";

/// All errors that can occur in xlexport parsing, viewing and exporting.
#[derive(Debug, thiserror::Error)]
pub enum XlexportError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The chosen file does not carry the accepted extension.
    #[error("Please upload a .xlsx file (got {0})")]
    InvalidFileType(String),

    /// Export requested without an uploaded file or an active sheet.
    #[error("no file or sheet selected")]
    MissingSelection,

    /// Sheet name not present in the loaded workbook.
    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),

    /// An export is already in flight.
    #[error("An export is already in progress")]
    Busy,

    /// The export service answered with a non-success status.
    #[error("{message}")]
    ExportStatus { status: u16, message: String },

    /// Network failure talking to the export service.
    #[error("Export request failed: {0}")]
    Transport(String),

    /// The browser refused to hand the file to the user.
    #[error("Download failed: {0}")]
    Download(String),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlexportError>;

impl XlexportError {
    /// Build the error for a non-success export response.
    ///
    /// The body text wins when present; otherwise the message names the status.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        let message = if text.is_empty() {
            format!("Error {status}")
        } else {
            text.to_string()
        };
        Self::ExportStatus { status, message }
    }

    /// Whether this error belongs to the read/parse family.
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            Self::Xml(_) | Self::Zip(_) | Self::Io(_) | Self::Parse(_)
        )
    }

    /// The text the viewer shows for this error.
    pub fn user_message(&self) -> String {
        if self.is_read_failure() {
            READ_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<String> for XlexportError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for XlexportError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<XlexportError> for wasm_bindgen::JsValue {
    fn from(e: XlexportError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.user_message())
    }
}
