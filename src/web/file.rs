use js_sys::Uint8Array;
use wasm_bindgen_futures::JsFuture;
use web_sys::File;

use super::describe;
use crate::error::{Result, XlexportError};
use crate::viewer::session::UploadSource;

/// A `File` from an `<input type="file">`, read through `Blob.arrayBuffer()`.
pub struct BrowserFile {
    file: File,
}

impl BrowserFile {
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl UploadSource for BrowserFile {
    fn name(&self) -> String {
        self.file.name()
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        let buffer = JsFuture::from(self.file.array_buffer())
            .await
            .map_err(|e| XlexportError::Other(format!("reading {}: {}", self.file.name(), describe(&e))))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}
