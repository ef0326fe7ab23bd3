//! HTML strings for the page shell and the viewer body.

use crate::config::ACCEPTED_EXTENSION;
use crate::viewer::{ViewModel, EMPTY_SHEET_NOTICE, PROCESSING_NOTICE};

/// Selector of the file input inside the page shell.
pub const FILE_INPUT_SELECTOR: &str = "input[data-role=\"file-input\"]";

/// Selector of the container `viewer_body` output goes into.
pub const VIEWER_SELECTOR: &str = "[data-role=\"viewer\"]";

/// Attribute carrying a sheet name on its tab button.
pub const SHEET_ATTR: &str = "data-sheet";

/// Attribute marking action buttons.
pub const ACTION_ATTR: &str = "data-action";

/// Value of [`ACTION_ATTR`] on the export button.
pub const EXPORT_ACTION: &str = "export";

/// The static page: heading, instructions, file picker and an empty viewer.
pub fn page_shell() -> String {
    let mut out = String::with_capacity(512);
    out.push_str("<section class=\"xlexport\">");
    out.push_str("<h1>Excel viewer</h1>");
    out.push_str(
        "<p>Choose an Excel workbook to preview its sheets, \
         then export the active sheet.</p>",
    );
    out.push_str(&format!(
        "<input type=\"file\" accept=\"{ACCEPTED_EXTENSION}\" data-role=\"file-input\">"
    ));
    out.push_str("<div data-role=\"viewer\"></div>");
    out.push_str("</section>");
    out
}

/// Everything below the file picker for one view snapshot.
pub fn viewer_body(view: &ViewModel) -> String {
    let mut out = String::new();

    if view.loading {
        out.push_str(&format!("<p class=\"status\">{PROCESSING_NOTICE}</p>"));
    }
    if let Some(error) = &view.error {
        out.push_str(&format!(
            "<p class=\"error\" role=\"alert\">{}</p>",
            escape_text(error)
        ));
    }

    if view.has_sheets() {
        out.push_str("<nav class=\"sheets\">");
        for tab in &view.tabs {
            let class = if tab.active { "sheet active" } else { "sheet" };
            out.push_str(&format!(
                "<button type=\"button\" class=\"{class}\" {SHEET_ATTR}=\"{}\">{}</button>",
                escape_attr(&tab.name),
                escape_text(&tab.name)
            ));
        }
        out.push_str("</nav>");

        let disabled = if view.export_enabled { "" } else { " disabled" };
        out.push_str(&format!(
            "<button type=\"button\" {ACTION_ATTR}=\"{EXPORT_ACTION}\"{disabled}>Export modified sheet</button>"
        ));
    }

    if view.show_empty_notice {
        out.push_str(&format!("<p class=\"empty\">{EMPTY_SHEET_NOTICE}</p>"));
    } else if view.has_table() {
        push_table(&mut out, view);
    }

    out
}

fn push_table(out: &mut String, view: &ViewModel) {
    out.push_str("<table><thead><tr>");
    for cell in &view.header {
        out.push_str("<th>");
        out.push_str(&escape_text(cell));
        out.push_str("</th>");
    }
    out.push_str("</tr></thead><tbody>");
    for row in &view.body {
        out.push_str("<tr>");
        for cell in row {
            out.push_str("<td>");
            out.push_str(&escape_text(cell));
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s)
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::SheetTab;

    fn view() -> ViewModel {
        ViewModel {
            tabs: vec![
                SheetTab {
                    name: "Ventas".into(),
                    active: true,
                },
                SheetTab {
                    name: "R&D \"Q1\"".into(),
                    active: false,
                },
            ],
            header: vec!["Name".into(), "<b>Qty</b>".into()],
            body: vec![vec!["Pen".into(), "3".into()]],
            export_enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn shell_has_picker_and_viewer() {
        let html = page_shell();
        assert!(html.contains("accept=\".xlsx\""));
        assert!(html.contains("data-role=\"file-input\""));
        assert!(html.contains("data-role=\"viewer\""));
    }

    #[test]
    fn nothing_loaded_renders_nothing() {
        assert_eq!(viewer_body(&ViewModel::default()), "");
    }

    #[test]
    fn renders_tabs_header_and_rows() {
        let html = viewer_body(&view());
        assert!(html.contains("class=\"sheet active\" data-sheet=\"Ventas\">Ventas</button>"));
        assert!(html.contains("data-sheet=\"R&amp;D &quot;Q1&quot;\">R&amp;D \"Q1\"</button>"));
        assert!(html.contains("<th>Name</th><th>&lt;b&gt;Qty&lt;/b&gt;</th>"));
        assert!(html.contains("<tr><td>Pen</td><td>3</td></tr>"));
        assert!(html.contains("data-action=\"export\">"));
        assert!(!html.contains("disabled"));
    }

    #[test]
    fn loading_disables_export_and_shows_status() {
        let html = viewer_body(&ViewModel {
            loading: true,
            export_enabled: false,
            ..view()
        });
        assert!(html.contains(PROCESSING_NOTICE));
        assert!(html.contains("data-action=\"export\" disabled"));
    }

    #[test]
    fn error_and_empty_notice() {
        let html = viewer_body(&ViewModel {
            error: Some("Error <500>".into()),
            show_empty_notice: true,
            header: Vec::new(),
            body: Vec::new(),
            ..view()
        });
        assert!(html.contains("Error &lt;500&gt;"));
        assert!(html.contains(EMPTY_SHEET_NOTICE));
        assert!(!html.contains("<table>"));
    }
}
