//! Remote export contract.
//!
//! The viewer never modifies workbooks itself: it posts the original upload
//! and the active sheet name to `{api_base}/export` and hands the returned
//! bytes to the user as a download. This module holds the request/response
//! shapes, the response interpretation and the transport seams.

mod disposition;

pub use disposition::{filename_from_disposition, resolve_download_name};

use crate::error::{Result, XlexportError};

/// MIME type of the uploaded and downloaded workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Form field carrying the workbook bytes.
pub const FILE_FIELD: &str = "file";

/// Form field carrying the active sheet name.
pub const SHEET_FIELD: &str = "sheet";

/// The original upload, kept byte-for-byte so it can be resent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// One export call: `POST url` with a multipart `file` + `sheet` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub url: String,
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    pub sheet: String,
}

/// What came back from the export service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub status: u16,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl ExportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A file ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Map an export response to a download or an error.
///
/// Non-success statuses surface the body text, or `Error <status>` when the
/// body is empty.
pub fn interpret_response(response: ExportResponse, sheet: &str) -> Result<DownloadFile> {
    if !response.is_success() {
        return Err(XlexportError::from_status(response.status, &response.body));
    }
    let name = resolve_download_name(response.content_disposition.as_deref(), sheet);
    Ok(DownloadFile {
        name,
        bytes: response.body,
    })
}

/// Sends an export request. Network failures map to [`XlexportError::Transport`].
#[allow(async_fn_in_trait)]
pub trait ExportTransport {
    async fn send(&self, request: &ExportRequest) -> Result<ExportResponse>;
}

/// Hands a finished download to the user.
///
/// Implementations release any temporary resource they create on every path.
pub trait DownloadSink {
    fn save(&self, file: &DownloadFile) -> Result<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn response(status: u16, disposition: Option<&str>, body: &[u8]) -> ExportResponse {
        ExportResponse {
            status,
            content_disposition: disposition.map(ToString::to_string),
            body: body.to_vec(),
        }
    }

    #[test]
    fn success_uses_disposition_name() {
        let file = interpret_response(
            response(200, Some(r#"attachment; filename="report.xlsx""#), b"PK"),
            "Sheet1",
        )
        .unwrap();
        assert_eq!(file.name, "report.xlsx");
        assert_eq!(file.bytes, b"PK");
    }

    #[test]
    fn success_without_disposition_synthesizes_name() {
        let file = interpret_response(response(200, None, b"PK"), "Ventas").unwrap();
        assert_eq!(file.name, "modified-Ventas.xlsx");
    }

    #[test]
    fn failure_surfaces_body_text() {
        let err = interpret_response(response(400, None, b"sheet not found"), "S").unwrap_err();
        assert_eq!(err.user_message(), "sheet not found");
    }

    #[test]
    fn failure_with_empty_body_names_status() {
        let err = interpret_response(response(500, None, b""), "S").unwrap_err();
        assert!(matches!(err, XlexportError::ExportStatus { status: 500, .. }));
        assert!(err.user_message().contains("500"));
    }
}
