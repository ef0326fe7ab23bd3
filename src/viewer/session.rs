//! Async drivers tying the controller to real I/O.
//!
//! The viewer lives in a `RefCell` shared with event handlers. A borrow is
//! only ever taken for one synchronous step and is always released before
//! an `.await`, so other handlers can run (and re-render) while a file is
//! being read or an export is in flight. `notify` is called after each
//! state change, with no borrow held.

use std::cell::RefCell;

use super::{ExcelViewer, ExportOutcome, LoadOutcome};
use crate::error::Result;
use crate::export::{DownloadSink, ExportTransport};
use crate::source::SheetParser;

/// A file the user picked: its name plus a way to read its bytes.
#[allow(async_fn_in_trait)]
pub trait UploadSource {
    fn name(&self) -> String;

    async fn read_bytes(&self) -> Result<Vec<u8>>;
}

/// A plain in-memory upload (CLI, tests).
#[derive(Debug, Clone)]
pub struct MemoryUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadSource for MemoryUpload {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Validate, read and parse a chosen file.
///
/// Returns `Err` only when the name is rejected; read and parse failures are
/// recorded on the viewer and reported as [`LoadOutcome::Failed`].
pub async fn select_file<P, U>(
    viewer: &RefCell<ExcelViewer<P>>,
    upload: &U,
    notify: impl Fn(),
) -> Result<LoadOutcome>
where
    P: SheetParser,
    U: UploadSource,
{
    let begun = viewer.borrow_mut().begin_file_selection(&upload.name());
    notify();
    let ticket = begun?;

    let bytes = upload.read_bytes().await;

    let outcome = viewer.borrow_mut().complete_file_selection(ticket, bytes);
    if outcome != LoadOutcome::Superseded {
        notify();
    }
    Ok(outcome)
}

/// Post the active sheet to the export service and download the result.
///
/// Returns the name the file was saved under, or `None` when the export
/// failed or was superseded (the viewer's error message says why).
/// `Err` means the request was never sent: nothing selected, or busy.
pub async fn export_modified<P, T, D>(
    viewer: &RefCell<ExcelViewer<P>>,
    transport: &T,
    sink: &D,
    notify: impl Fn(),
) -> Result<Option<String>>
where
    P: SheetParser,
    T: ExportTransport,
    D: DownloadSink,
{
    let begun = viewer.borrow_mut().begin_export();
    notify();
    let job = begun?;

    let response = transport.send(&job.request).await;

    let outcome = viewer.borrow_mut().complete_export(&job, response);
    let saved = match outcome {
        ExportOutcome::Ready(file) => match sink.save(&file) {
            Ok(()) => Some(file.name),
            Err(err) => {
                viewer.borrow_mut().record_error(&err);
                None
            }
        },
        ExportOutcome::Failed => None,
        ExportOutcome::Superseded => return Ok(None),
    };
    notify();
    Ok(saved)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;
    use crate::error::{XlexportError, READ_ERROR_MESSAGE};
    use crate::export::{DownloadFile, ExportRequest, ExportResponse};
    use crate::types::{CellData, CellValue, Sheet, Workbook};
    use std::cell::Cell;

    struct StubParser;

    impl SheetParser for StubParser {
        type Workbook = Workbook;

        fn parse(&self, bytes: &[u8]) -> Result<Workbook> {
            if bytes.is_empty() {
                return Err(XlexportError::Parse("empty".into()));
            }
            let mut sheet = Sheet::new("Ventas");
            sheet.cells.push(CellData {
                r: 0,
                c: 0,
                value: CellValue::from("Total"),
            });
            Ok(Workbook::new(vec![sheet, Sheet::new("Notas")]))
        }
    }

    /// Records every request and answers with a canned response.
    struct RecordingTransport {
        sent: RefCell<Vec<ExportRequest>>,
        reply: fn() -> Result<ExportResponse>,
    }

    impl RecordingTransport {
        fn new(reply: fn() -> Result<ExportResponse>) -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                reply,
            }
        }
    }

    impl ExportTransport for RecordingTransport {
        async fn send(&self, request: &ExportRequest) -> Result<ExportResponse> {
            self.sent.borrow_mut().push(request.clone());
            (self.reply)()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        saved: RefCell<Vec<DownloadFile>>,
        fail: bool,
    }

    impl DownloadSink for RecordingSink {
        fn save(&self, file: &DownloadFile) -> Result<()> {
            if self.fail {
                return Err(XlexportError::Download("blocked".into()));
            }
            self.saved.borrow_mut().push(file.clone());
            Ok(())
        }
    }

    fn ok_reply() -> Result<ExportResponse> {
        Ok(ExportResponse {
            status: 200,
            content_disposition: Some(r#"attachment; filename="out.xlsx""#.into()),
            body: b"PKDATA".to_vec(),
        })
    }

    fn upload(name: &str, bytes: &[u8]) -> MemoryUpload {
        MemoryUpload {
            name: name.into(),
            bytes: bytes.to_vec(),
        }
    }

    fn new_viewer() -> RefCell<ExcelViewer<StubParser>> {
        RefCell::new(ExcelViewer::with_parser(
            StubParser,
            ExportConfig::new("http://svc"),
        ))
    }

    #[tokio::test]
    async fn select_file_loads_and_notifies() {
        let viewer = new_viewer();
        let renders = Cell::new(0);
        let outcome = select_file(&viewer, &upload("a.xlsx", b"x"), || {
            renders.set(renders.get() + 1);
        })
        .await
        .unwrap();

        assert_eq!(outcome, LoadOutcome::Loaded(2));
        assert_eq!(renders.get(), 2);
        let v = viewer.borrow();
        assert_eq!(v.active_sheet(), Some("Ventas"));
        assert!(!v.is_loading());
    }

    #[tokio::test]
    async fn loading_flag_is_set_during_read() {
        struct Probe<'a> {
            viewer: &'a RefCell<ExcelViewer<StubParser>>,
            seen_loading: Cell<bool>,
        }
        impl UploadSource for Probe<'_> {
            fn name(&self) -> String {
                "probe.xlsx".into()
            }
            async fn read_bytes(&self) -> Result<Vec<u8>> {
                self.seen_loading.set(self.viewer.borrow().is_loading());
                Ok(b"x".to_vec())
            }
        }

        let viewer = new_viewer();
        let probe = Probe {
            viewer: &viewer,
            seen_loading: Cell::new(false),
        };
        select_file(&viewer, &probe, || {}).await.unwrap();
        assert!(probe.seen_loading.get());
        assert!(!viewer.borrow().is_loading());
    }

    #[tokio::test]
    async fn rejected_name_is_an_error() {
        let viewer = new_viewer();
        let err = select_file(&viewer, &upload("a.csv", b"x"), || {})
            .await
            .unwrap_err();
        assert!(matches!(err, XlexportError::InvalidFileType(_)));
        assert!(viewer.borrow().error().is_some());
    }

    #[tokio::test]
    async fn parse_failure_is_reported_on_viewer() {
        let viewer = new_viewer();
        let outcome = select_file(&viewer, &upload("a.xlsx", b""), || {})
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(viewer.borrow().error(), Some(READ_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn export_sends_original_bytes_and_saves_download() {
        let viewer = new_viewer();
        select_file(&viewer, &upload("book.xlsx", b"orig"), || {})
            .await
            .unwrap();
        viewer.borrow_mut().select_sheet("Notas").unwrap();

        let transport = RecordingTransport::new(ok_reply);
        let sink = RecordingSink::default();
        let saved = export_modified(&viewer, &transport, &sink, || {})
            .await
            .unwrap();

        assert_eq!(saved.as_deref(), Some("out.xlsx"));
        let sent = transport.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://svc/export");
        assert_eq!(sent[0].file_bytes, b"orig");
        assert_eq!(sent[0].sheet, "Notas");
        assert_eq!(sink.saved.borrow()[0].bytes, b"PKDATA");
        assert!(!viewer.borrow().is_loading());
    }

    #[tokio::test]
    async fn export_without_file_never_calls_transport() {
        let viewer = new_viewer();
        let transport = RecordingTransport::new(ok_reply);
        let sink = RecordingSink::default();
        let err = export_modified(&viewer, &transport, &sink, || {})
            .await
            .unwrap_err();
        assert!(matches!(err, XlexportError::MissingSelection));
        assert!(transport.sent.borrow().is_empty());
    }

    #[tokio::test]
    async fn network_failure_sets_error_and_clears_loading() {
        let viewer = new_viewer();
        select_file(&viewer, &upload("book.xlsx", b"orig"), || {})
            .await
            .unwrap();
        let transport =
            RecordingTransport::new(|| Err(XlexportError::Transport("connection refused".into())));
        let sink = RecordingSink::default();

        let saved = export_modified(&viewer, &transport, &sink, || {})
            .await
            .unwrap();
        assert!(saved.is_none());
        let v = viewer.borrow();
        assert!(v.error().unwrap().contains("connection refused"));
        assert!(!v.is_loading());
        assert_eq!(v.rows(), [vec![CellValue::from("Total")]]);
        assert!(sink.saved.borrow().is_empty());
    }

    #[tokio::test]
    async fn download_failure_is_recorded() {
        let viewer = new_viewer();
        select_file(&viewer, &upload("book.xlsx", b"orig"), || {})
            .await
            .unwrap();
        let transport = RecordingTransport::new(ok_reply);
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let saved = export_modified(&viewer, &transport, &sink, || {})
            .await
            .unwrap();
        assert!(saved.is_none());
        assert!(viewer.borrow().error().unwrap().contains("blocked"));
        assert!(!viewer.borrow().is_loading());
    }
}
