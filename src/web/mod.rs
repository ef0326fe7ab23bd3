//! Browser front end: mounts the page, wires DOM events to the viewer and
//! supplies the fetch/download implementations of the I/O seams.

mod download;
mod fetch;
mod file;

pub use download::AnchorDownload;
pub use fetch::FetchTransport;
pub use file::BrowserFile;

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Uint8Array;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, Element, Event, HtmlInputElement};

use crate::config::ExportConfig;
use crate::logging;
use crate::render::html::{
    page_shell, viewer_body, ACTION_ATTR, EXPORT_ACTION, FILE_INPUT_SELECTOR, SHEET_ATTR,
    VIEWER_SELECTOR,
};
use crate::viewer::{session, ExcelViewer};

/// Shared between the handle returned to JS and the event closures.
struct Inner {
    viewer: RefCell<ExcelViewer>,
    container: Element,
}

impl Inner {
    /// Re-render the viewer body. Must not be called while `viewer` is borrowed mutably.
    fn render(&self) {
        let html = viewer_body(&self.viewer.borrow().view());
        self.container.set_inner_html(&html);
    }

    async fn load(self: Rc<Self>, file: BrowserFile) {
        if let Err(err) = session::select_file(&self.viewer, &file, || self.render()).await {
            log::debug!("file selection refused: {err}");
        }
    }

    async fn export(self: Rc<Self>) -> crate::error::Result<Option<String>> {
        session::export_modified(&self.viewer, &FetchTransport, &AnchorDownload, || {
            self.render();
        })
        .await
    }
}

/// The viewer mounted into a host element.
#[wasm_bindgen]
pub struct XlExport {
    inner: Rc<Inner>,
    input: HtmlInputElement,
    root: Element,
    on_change: Closure<dyn FnMut(Event)>,
    on_click: Closure<dyn FnMut(Event)>,
}

#[wasm_bindgen]
impl XlExport {
    /// Mount into `root`. `api_base` overrides the build-time export service URL.
    #[wasm_bindgen(constructor)]
    pub fn new(root: Element, api_base: Option<String>) -> Result<XlExport, JsValue> {
        console_error_panic_hook::set_once();
        logging::init();

        let config = match api_base {
            Some(base) => ExportConfig::new(base),
            None => ExportConfig::from_build_env(),
        };
        log::info!("export service at {}", config.api_base());

        root.set_inner_html(&page_shell());
        let input: HtmlInputElement = root
            .query_selector(FILE_INPUT_SELECTOR)?
            .ok_or_else(|| JsValue::from_str("file input missing from page shell"))?
            .dyn_into()?;
        let container = root
            .query_selector(VIEWER_SELECTOR)?
            .ok_or_else(|| JsValue::from_str("viewer container missing from page shell"))?;

        let inner = Rc::new(Inner {
            viewer: RefCell::new(ExcelViewer::new(config)),
            container,
        });

        let on_change = {
            let inner = Rc::clone(&inner);
            let input = input.clone();
            Closure::wrap(Box::new(move |_event: Event| {
                let Some(file) = input.files().and_then(|files| files.get(0)) else {
                    return;
                };
                // Re-picking the same file must fire `change` again.
                input.set_value("");
                wasm_bindgen_futures::spawn_local(Rc::clone(&inner).load(BrowserFile::new(file)));
            }) as Box<dyn FnMut(Event)>)
        };
        input.add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())?;

        let on_click = {
            let inner = Rc::clone(&inner);
            Closure::wrap(Box::new(move |event: Event| {
                handle_click(&inner, &event);
            }) as Box<dyn FnMut(Event)>)
        };
        root.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;

        inner.render();
        Ok(XlExport {
            inner,
            input,
            root,
            on_change,
            on_click,
        })
    }

    #[wasm_bindgen(getter, js_name = "sheetNames")]
    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.viewer.borrow().sheet_names().to_vec()
    }

    #[wasm_bindgen(getter, js_name = "activeSheet")]
    pub fn active_sheet(&self) -> Option<String> {
        self.inner.viewer.borrow().active_sheet().map(ToString::to_string)
    }

    #[wasm_bindgen(getter, js_name = "isLoading")]
    pub fn is_loading(&self) -> bool {
        self.inner.viewer.borrow().is_loading()
    }

    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.inner.viewer.borrow().error().map(ToString::to_string)
    }

    /// Rows of the active sheet as typed cell values.
    #[wasm_bindgen(getter)]
    pub fn rows(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.viewer.borrow().rows())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// The current view snapshot (tabs, header, body, flags).
    pub fn view(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.viewer.borrow().view())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    #[wasm_bindgen(js_name = "selectSheet")]
    pub fn select_sheet(&self, name: &str) -> Result<(), JsValue> {
        let selected = self.inner.viewer.borrow_mut().select_sheet(name);
        self.inner.render();
        selected.map_err(JsValue::from)
    }

    /// Export the active sheet; resolves to the saved file name, or `null`
    /// when the export failed (see `error`).
    #[wasm_bindgen(js_name = "exportModified")]
    pub fn export_modified(&self) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        wasm_bindgen_futures::future_to_promise(async move {
            let saved = inner.export().await?;
            Ok(saved.map_or(JsValue::NULL, |name| JsValue::from_str(&name)))
        })
    }
}

impl Drop for XlExport {
    fn drop(&mut self) {
        let removed = self
            .input
            .remove_event_listener_with_callback("change", self.on_change.as_ref().unchecked_ref())
            .and_then(|()| {
                self.root.remove_event_listener_with_callback(
                    "click",
                    self.on_click.as_ref().unchecked_ref(),
                )
            });
        if let Err(err) = removed {
            log::warn!("failed to detach listeners: {}", describe(&err));
        }
        self.root.set_inner_html("");
    }
}

/// Delegated click handling for sheet tabs and the export button.
fn handle_click(inner: &Rc<Inner>, event: &Event) {
    let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
        return;
    };

    let sheet_button = target
        .closest(&format!("[{SHEET_ATTR}]"))
        .ok()
        .flatten()
        .and_then(|button| button.get_attribute(SHEET_ATTR));
    if let Some(name) = sheet_button {
        let selected = inner.viewer.borrow_mut().select_sheet(&name);
        if let Err(err) = selected {
            log::warn!("{err}");
        }
        inner.render();
        return;
    }

    let is_export = target
        .closest(&format!("[{ACTION_ATTR}=\"{EXPORT_ACTION}\"]"))
        .ok()
        .flatten()
        .is_some();
    if is_export {
        let inner = Rc::clone(inner);
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = inner.export().await {
                log::debug!("export refused: {err}");
            }
        });
    }
}

/// Wrap bytes in a typed `Blob`.
pub(crate) fn bytes_to_blob(bytes: &[u8], mime: &str) -> Result<Blob, JsValue> {
    let parts = js_sys::Array::new();
    parts.push(&Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    Blob::new_with_u8_array_sequence_and_options(&parts, &options)
}

/// Best-effort text for a thrown JS value.
pub(crate) fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}
