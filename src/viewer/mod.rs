//! The viewer controller - owns all UI state for one uploaded workbook.
//!
//! Every operation is split into a synchronous `begin_*` / `complete_*`
//! pair around its suspension point (file read, network call). The async
//! drivers in [`session`] glue those halves to real I/O; the DOM layer and
//! the CLI use the same state machine.
//!
//! Concurrency rules (single-threaded, one slot per operation kind):
//! - a new file selection supersedes a pending one; the stale completion is
//!   dropped without touching state;
//! - an export requested while another is in flight is refused with
//!   [`XlexportError::Busy`] and never reaches the network.

pub mod session;
mod view;

pub use view::{SheetTab, ViewModel, EMPTY_SHEET_NOTICE, PROCESSING_NOTICE};

use crate::config::{has_accepted_extension, ExportConfig};
use crate::error::{Result, XlexportError, READ_ERROR_MESSAGE};
use crate::export::{interpret_response, DownloadFile, ExportRequest, ExportResponse, UploadedFile};
use crate::source::{SheetParser, WorkbookSource, XlsxParser};
use crate::types::Row;

/// Proof that a file selection was accepted; redeem it with
/// [`ExcelViewer::complete_file_selection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    id: u64,
    file_name: String,
}

impl LoadTicket {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// How a file selection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The workbook is displayed; carries its sheet count.
    Loaded(usize),
    /// Read or parse failed; the error message is set.
    Failed,
    /// A newer selection took over; nothing changed.
    Superseded,
}

/// An accepted export: the request to send plus the slot it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    id: u64,
    pub request: ExportRequest,
}

/// How an export ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The response is ready to be handed to the user.
    Ready(DownloadFile),
    /// The service or the network failed; the error message is set.
    Failed,
    /// The slot was released before the response came back.
    Superseded,
}

pub struct ExcelViewer<P: SheetParser = XlsxParser> {
    parser: P,
    config: ExportConfig,
    file: Option<UploadedFile>,
    workbook: Option<P::Workbook>,
    sheets: Vec<String>,
    active_sheet: Option<String>,
    rows: Vec<Row>,
    error: Option<String>,
    next_id: u64,
    pending_load: Option<u64>,
    pending_export: Option<u64>,
}

impl ExcelViewer<XlsxParser> {
    /// A viewer using the built-in XLSX parser.
    pub fn new(config: ExportConfig) -> Self {
        Self::with_parser(XlsxParser, config)
    }
}

impl<P: SheetParser> ExcelViewer<P> {
    pub fn with_parser(parser: P, config: ExportConfig) -> Self {
        Self {
            parser,
            config,
            file: None,
            workbook: None,
            sheets: Vec::new(),
            active_sheet: None,
            rows: Vec::new(),
            error: None,
            next_id: 0,
            pending_load: None,
            pending_export: None,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheets
    }

    pub fn active_sheet(&self) -> Option<&str> {
        self.active_sheet.as_deref()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn uploaded_file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    pub fn has_workbook(&self) -> bool {
        self.workbook.is_some()
    }

    /// True while a read/parse or an export is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending_load.is_some() || self.pending_export.is_some()
    }

    fn take_id(&mut self) -> u64 {
        self.next_id = self.next_id.wrapping_add(1);
        self.next_id
    }

    /// Accept or reject a chosen file by name.
    ///
    /// A rejected name only sets the error message. An accepted one clears
    /// the error and occupies the load slot, superseding any pending load.
    pub fn begin_file_selection(&mut self, file_name: &str) -> Result<LoadTicket> {
        self.error = None;
        if !has_accepted_extension(file_name) {
            let err = XlexportError::InvalidFileType(file_name.to_string());
            log::warn!("rejected upload {file_name:?}: wrong extension");
            self.error = Some(err.user_message());
            return Err(err);
        }
        if let Some(previous) = self.pending_load {
            log::warn!("file selection {previous} superseded by {file_name:?}");
        }
        let id = self.take_id();
        self.pending_load = Some(id);
        log::debug!("loading {file_name:?} (ticket {id})");
        Ok(LoadTicket {
            id,
            file_name: file_name.to_string(),
        })
    }

    /// Finish a file selection with the bytes that were read (or the read error).
    ///
    /// State is replaced wholesale: on success by the new workbook with its
    /// first sheet active, on failure by an empty viewer with the generic
    /// read error. The load slot is released either way.
    pub fn complete_file_selection(
        &mut self,
        ticket: LoadTicket,
        bytes: Result<Vec<u8>>,
    ) -> LoadOutcome {
        if self.pending_load != Some(ticket.id) {
            log::debug!(
                "dropping stale load of {:?} (ticket {})",
                ticket.file_name,
                ticket.id
            );
            return LoadOutcome::Superseded;
        }
        self.pending_load = None;

        let parsed = bytes.and_then(|bytes| {
            let workbook = self.parser.parse(&bytes)?;
            Ok((bytes, workbook))
        });

        match parsed {
            Ok((bytes, workbook)) => {
                let sheets = workbook.sheet_names().to_vec();
                let active = sheets.first().cloned();
                self.rows = active
                    .as_deref()
                    .and_then(|name| workbook.rows(name))
                    .unwrap_or_default();
                self.active_sheet = active;
                self.sheets = sheets;
                self.workbook = Some(workbook);
                self.file = Some(UploadedFile {
                    name: ticket.file_name,
                    bytes,
                });
                log::debug!(
                    "loaded workbook with {} sheets, {} rows in first sheet",
                    self.sheets.len(),
                    self.rows.len()
                );
                LoadOutcome::Loaded(self.sheets.len())
            }
            Err(err) => {
                log::error!("failed to read {:?}: {err}", ticket.file_name);
                self.file = None;
                self.workbook = None;
                self.sheets.clear();
                self.active_sheet = None;
                self.rows.clear();
                self.error = Some(READ_ERROR_MESSAGE.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Switch the active sheet and re-project rows from the loaded workbook.
    ///
    /// No-op without a workbook. Unknown names are refused and leave state as is.
    pub fn select_sheet(&mut self, name: &str) -> Result<()> {
        let Some(workbook) = self.workbook.as_ref() else {
            log::debug!("select_sheet({name:?}) ignored: no workbook loaded");
            return Ok(());
        };
        if !workbook.contains_sheet(name) {
            log::warn!("select_sheet({name:?}): not in workbook");
            return Err(XlexportError::UnknownSheet(name.to_string()));
        }
        self.rows = workbook.rows(name).unwrap_or_default();
        self.active_sheet = Some(name.to_string());
        Ok(())
    }

    /// Accept an export request, or refuse it without touching the network.
    pub fn begin_export(&mut self) -> Result<ExportJob> {
        if self.pending_export.is_some() {
            log::warn!("export already in flight, ignoring request");
            return Err(XlexportError::Busy);
        }
        self.error = None;
        let (Some(file), Some(sheet)) = (self.file.as_ref(), self.active_sheet.as_ref()) else {
            let err = XlexportError::MissingSelection;
            self.error = Some(err.user_message());
            return Err(err);
        };
        let request = ExportRequest {
            url: self.config.export_url(),
            file_name: file.name.clone(),
            file_bytes: file.bytes.clone(),
            sheet: sheet.clone(),
        };
        let id = self.take_id();
        self.pending_export = Some(id);
        log::debug!("exporting sheet {:?} to {}", request.sheet, request.url);
        Ok(ExportJob { id, request })
    }

    /// Finish an export with the transport's result. Releases the export slot.
    ///
    /// Failures set the error message and leave the displayed table alone.
    pub fn complete_export(
        &mut self,
        job: &ExportJob,
        response: Result<ExportResponse>,
    ) -> ExportOutcome {
        if self.pending_export != Some(job.id) {
            log::debug!("dropping stale export response (job {})", job.id);
            return ExportOutcome::Superseded;
        }
        self.pending_export = None;

        match response.and_then(|r| interpret_response(r, &job.request.sheet)) {
            Ok(file) => {
                log::debug!("export ready: {} ({} bytes)", file.name, file.bytes.len());
                ExportOutcome::Ready(file)
            }
            Err(err) => {
                log::error!("export of sheet {:?} failed: {err}", job.request.sheet);
                self.error = Some(err.user_message());
                ExportOutcome::Failed
            }
        }
    }

    /// Surface an error raised outside the controller (e.g. a failed download).
    pub fn record_error(&mut self, err: &XlexportError) {
        log::error!("{err}");
        self.error = Some(err.user_message());
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> ViewModel {
        ViewModel::build(self)
    }
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
    use crate::types::{CellValue, Sheet, Workbook};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Parser double: returns a fixed workbook, or fails on `b"bad"`; counts calls.
    #[derive(Clone, Default)]
    struct FakeParser {
        calls: Rc<Cell<usize>>,
    }

    fn sheet(name: &str, header: &str) -> Sheet {
        let mut s = Sheet::new(name);
        s.cells.push(crate::types::CellData {
            r: 0,
            c: 0,
            value: CellValue::from(header),
        });
        s
    }

    impl SheetParser for FakeParser {
        type Workbook = Workbook;

        fn parse(&self, bytes: &[u8]) -> Result<Workbook> {
            self.calls.set(self.calls.get() + 1);
            match bytes {
                b"bad" => Err(XlexportError::Parse("not a workbook".into())),
                b"empty" => Ok(Workbook::new(Vec::new())),
                _ => Ok(Workbook::new(vec![sheet("First", "a"), sheet("Second", "b")])),
            }
        }
    }

    fn viewer() -> (ExcelViewer<FakeParser>, Rc<Cell<usize>>) {
        let parser = FakeParser::default();
        let calls = Rc::clone(&parser.calls);
        (
            ExcelViewer::with_parser(parser, ExportConfig::new("http://api.test/")),
            calls,
        )
    }

    fn loaded() -> ExcelViewer<FakeParser> {
        let (mut v, _) = viewer();
        let ticket = v.begin_file_selection("book.xlsx").unwrap();
        assert_eq!(
            v.complete_file_selection(ticket, Ok(b"good".to_vec())),
            LoadOutcome::Loaded(2)
        );
        v
    }

    #[test]
    fn wrong_extension_only_sets_error() {
        let mut v = loaded();
        let before_rows = v.rows().to_vec();

        let err = v.begin_file_selection("notes.csv").unwrap_err();
        assert!(matches!(err, XlexportError::InvalidFileType(_)));
        assert!(v.error().unwrap().contains(".xlsx"));
        assert!(!v.is_loading());
        assert_eq!(v.sheet_names(), ["First", "Second"]);
        assert_eq!(v.active_sheet(), Some("First"));
        assert_eq!(v.rows(), before_rows.as_slice());
    }

    #[test]
    fn load_selects_first_sheet_and_toggles_loading() {
        let (mut v, calls) = viewer();
        assert!(!v.is_loading());

        let ticket = v.begin_file_selection("book.xlsx").unwrap();
        assert!(v.is_loading());

        v.complete_file_selection(ticket, Ok(b"good".to_vec()));
        assert!(!v.is_loading());
        assert_eq!(calls.get(), 1);
        assert_eq!(v.active_sheet(), Some("First"));
        assert_eq!(v.rows(), [vec![CellValue::from("a")]]);
        assert_eq!(v.uploaded_file().unwrap().bytes, b"good");
        assert!(v.error().is_none());
    }

    #[test]
    fn workbook_without_sheets_has_no_active_sheet() {
        let (mut v, _) = viewer();
        let ticket = v.begin_file_selection("book.xlsx").unwrap();
        assert_eq!(
            v.complete_file_selection(ticket, Ok(b"empty".to_vec())),
            LoadOutcome::Loaded(0)
        );
        assert!(v.active_sheet().is_none());
        assert!(v.rows().is_empty());
    }

    #[test]
    fn parse_failure_clears_state_and_sets_generic_error() {
        let mut v = loaded();
        let ticket = v.begin_file_selection("broken.xlsx").unwrap();
        assert_eq!(
            v.complete_file_selection(ticket, Ok(b"bad".to_vec())),
            LoadOutcome::Failed
        );
        assert_eq!(v.error(), Some(READ_ERROR_MESSAGE));
        assert!(v.sheet_names().is_empty());
        assert!(v.rows().is_empty());
        assert!(v.active_sheet().is_none());
        assert!(v.uploaded_file().is_none());
        assert!(!v.is_loading());
    }

    #[test]
    fn read_failure_sets_generic_error() {
        let (mut v, calls) = viewer();
        let ticket = v.begin_file_selection("book.xlsx").unwrap();
        let read_err = XlexportError::Other("FileReader aborted".into());
        assert_eq!(
            v.complete_file_selection(ticket, Err(read_err)),
            LoadOutcome::Failed
        );
        assert_eq!(calls.get(), 0);
        assert_eq!(v.error(), Some(READ_ERROR_MESSAGE));
        assert!(!v.is_loading());
    }

    #[test]
    fn newer_selection_supersedes_pending_one() {
        let (mut v, calls) = viewer();
        let first = v.begin_file_selection("one.xlsx").unwrap();
        let second = v.begin_file_selection("two.xlsx").unwrap();

        assert_eq!(
            v.complete_file_selection(first, Ok(b"good".to_vec())),
            LoadOutcome::Superseded
        );
        assert_eq!(calls.get(), 0);
        assert!(v.is_loading());
        assert!(!v.has_workbook());

        v.complete_file_selection(second, Ok(b"good".to_vec()));
        assert_eq!(v.uploaded_file().unwrap().name, "two.xlsx");
        assert!(!v.is_loading());
    }

    #[test]
    fn select_sheet_reprojects_without_reparsing() {
        let (mut v, calls) = viewer();
        let ticket = v.begin_file_selection("book.xlsx").unwrap();
        v.complete_file_selection(ticket, Ok(b"good".to_vec()));

        v.select_sheet("Second").unwrap();
        assert_eq!(v.active_sheet(), Some("Second"));
        assert_eq!(v.rows(), [vec![CellValue::from("b")]]);

        v.select_sheet("Second").unwrap();
        assert_eq!(v.rows(), [vec![CellValue::from("b")]]);
        assert_eq!(calls.get(), 1);
        assert!(!v.is_loading());
    }

    #[test]
    fn select_sheet_without_workbook_is_noop() {
        let (mut v, _) = viewer();
        v.select_sheet("Anything").unwrap();
        assert!(v.active_sheet().is_none());
    }

    #[test]
    fn unknown_sheet_is_refused() {
        let mut v = loaded();
        assert!(matches!(
            v.select_sheet("Nope"),
            Err(XlexportError::UnknownSheet(_))
        ));
        assert_eq!(v.active_sheet(), Some("First"));
    }

    #[test]
    fn export_requires_file() {
        let (mut v, _) = viewer();
        assert!(matches!(
            v.begin_export(),
            Err(XlexportError::MissingSelection)
        ));
        assert!(v.error().is_some());
        assert!(!v.is_loading());
    }

    #[test]
    fn export_requires_active_sheet() {
        let (mut v, _) = viewer();
        let ticket = v.begin_file_selection("book.xlsx").unwrap();
        v.complete_file_selection(ticket, Ok(b"empty".to_vec()));
        assert!(matches!(
            v.begin_export(),
            Err(XlexportError::MissingSelection)
        ));
    }

    #[test]
    fn export_request_carries_original_bytes_and_sheet() {
        let mut v = loaded();
        v.select_sheet("Second").unwrap();
        let job = v.begin_export().unwrap();
        assert!(v.is_loading());
        assert_eq!(job.request.url, "http://api.test/export");
        assert_eq!(job.request.file_name, "book.xlsx");
        assert_eq!(job.request.file_bytes, b"good");
        assert_eq!(job.request.sheet, "Second");
    }

    #[test]
    fn second_export_while_pending_is_busy() {
        let mut v = loaded();
        let job = v.begin_export().unwrap();
        assert!(matches!(v.begin_export(), Err(XlexportError::Busy)));
        assert!(v.error().is_none());

        let outcome = v.complete_export(
            &job,
            Ok(ExportResponse {
                status: 200,
                content_disposition: None,
                body: b"PK".to_vec(),
            }),
        );
        match outcome {
            ExportOutcome::Ready(file) => assert_eq!(file.name, "modified-First.xlsx"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!v.is_loading());
    }

    #[test]
    fn new_upload_does_not_cancel_pending_export() {
        let mut v = loaded();
        let job = v.begin_export().unwrap();

        let ticket = v.begin_file_selection("other.xlsx").unwrap();
        v.complete_file_selection(ticket, Ok(b"other".to_vec()));
        assert!(v.is_loading());

        let outcome = v.complete_export(
            &job,
            Ok(ExportResponse {
                status: 200,
                content_disposition: None,
                body: b"PK".to_vec(),
            }),
        );
        assert!(matches!(outcome, ExportOutcome::Ready(_)));
        assert_eq!(job.request.file_name, "book.xlsx");
        assert!(!v.is_loading());
    }

    #[test]
    fn export_failure_keeps_table() {
        let mut v = loaded();
        let job = v.begin_export().unwrap();
        let outcome = v.complete_export(
            &job,
            Ok(ExportResponse {
                status: 404,
                content_disposition: None,
                body: b"sheet not found".to_vec(),
            }),
        );
        assert_eq!(outcome, ExportOutcome::Failed);
        assert_eq!(v.error(), Some("sheet not found"));
        assert_eq!(v.rows(), [vec![CellValue::from("a")]]);
        assert!(!v.is_loading());
    }

    #[test]
    fn stale_export_job_is_dropped() {
        let mut v = loaded();
        let job = v.begin_export().unwrap();
        v.complete_export(&job, Err(XlexportError::Transport("offline".into())));
        assert!(v.error().unwrap().contains("offline"));

        let outcome = v.complete_export(&job, Err(XlexportError::Transport("again".into())));
        assert_eq!(outcome, ExportOutcome::Superseded);
        assert!(!v.error().unwrap().contains("again"));
    }
}
