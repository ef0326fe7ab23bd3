use serde::Serialize;

use super::ExcelViewer;
use crate::source::SheetParser;

/// Shown while a read or an export is in flight.
pub const PROCESSING_NOTICE: &str = "Processing…";

/// Shown when the active sheet has no rows.
pub const EMPTY_SHEET_NOTICE: &str = "No data in the selected sheet.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetTab {
    pub name: String,
    pub active: bool,
}

/// Everything a renderer needs, with cell values already turned into text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub loading: bool,
    pub error: Option<String>,
    pub tabs: Vec<SheetTab>,
    /// First projected row, rendered as the table header.
    pub header: Vec<String>,
    pub body: Vec<Vec<String>>,
    /// A workbook is loaded but the active sheet projects to no rows.
    pub show_empty_notice: bool,
    pub export_enabled: bool,
}

impl ViewModel {
    pub(super) fn build<P: SheetParser>(viewer: &ExcelViewer<P>) -> Self {
        let active = viewer.active_sheet();
        let tabs = viewer
            .sheet_names()
            .iter()
            .map(|name| SheetTab {
                name: name.clone(),
                active: Some(name.as_str()) == active,
            })
            .collect();

        let mut rows = viewer
            .rows()
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect::<Vec<_>>());
        let header = rows.next().unwrap_or_default();
        let body = rows.collect();

        let has_sheet = active.is_some();
        let loading = viewer.is_loading();
        Self {
            loading,
            error: viewer.error().map(ToString::to_string),
            tabs,
            header,
            body,
            show_empty_notice: has_sheet && viewer.rows().is_empty(),
            export_enabled: has_sheet && viewer.uploaded_file().is_some() && !loading,
        }
    }

    pub fn has_sheets(&self) -> bool {
        !self.tabs.is_empty()
    }

    pub fn has_table(&self) -> bool {
        !self.header.is_empty() || !self.body.is_empty()
    }
}
