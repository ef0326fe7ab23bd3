use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlAnchorElement, Url};

use super::{bytes_to_blob, describe};
use crate::error::{Result, XlexportError};
use crate::export::{DownloadFile, DownloadSink, XLSX_MIME};

/// Triggers a browser download through a temporary object URL and a hidden anchor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorDownload;

impl DownloadSink for AnchorDownload {
    fn save(&self, file: &DownloadFile) -> Result<()> {
        click_download(file).map_err(|e| XlexportError::Download(describe(&e)))
    }
}

/// Revokes the object URL when dropped, whichever way `click_download` exits.
struct ObjectUrl(String);

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if let Err(err) = Url::revoke_object_url(&self.0) {
            log::warn!("failed to revoke object URL: {}", describe(&err));
        }
    }
}

fn click_download(file: &DownloadFile) -> std::result::Result<(), JsValue> {
    let blob = bytes_to_blob(&file.bytes, XLSX_MIME)?;
    let url = ObjectUrl(Url::create_object_url_with_blob(&blob)?);

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no document body"))?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url.0);
    anchor.set_download(&file.name);
    anchor.set_attribute("hidden", "")?;
    body.append_child(&anchor)?;
    anchor.click();
    anchor.remove();
    log::debug!("download started: {}", file.name);
    Ok(())
}
