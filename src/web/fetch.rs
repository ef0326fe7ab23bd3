use js_sys::Uint8Array;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Request, RequestInit, RequestMode, Response};

use super::{bytes_to_blob, describe};
use crate::error::{Result, XlexportError};
use crate::export::{ExportRequest, ExportResponse, ExportTransport, FILE_FIELD, SHEET_FIELD, XLSX_MIME};

/// Posts export requests with `window.fetch` and a `FormData` body.
///
/// `Content-Disposition` is only visible when the service exposes it to CORS;
/// otherwise the download name is synthesized.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl ExportTransport for FetchTransport {
    async fn send(&self, request: &ExportRequest) -> Result<ExportResponse> {
        post(request)
            .await
            .map_err(|e| XlexportError::Transport(describe(&e)))
    }
}

async fn post(request: &ExportRequest) -> std::result::Result<ExportResponse, JsValue> {
    let form = FormData::new()?;
    let blob = bytes_to_blob(&request.file_bytes, XLSX_MIME)?;
    form.append_with_blob_and_filename(FILE_FIELD, &blob, &request.file_name)?;
    form.append_with_str(SHEET_FIELD, &request.sheet)?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&form);
    let req = Request::new_with_str_and_init(&request.url, &opts)?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let resp: Response = JsFuture::from(window.fetch_with_request(&req))
        .await?
        .dyn_into()?;

    let content_disposition = resp.headers().get("content-disposition")?;
    let buffer = JsFuture::from(resp.array_buffer()?).await?;
    Ok(ExportResponse {
        status: resp.status(),
        content_disposition,
        body: Uint8Array::new(&buffer).to_vec(),
    })
}
