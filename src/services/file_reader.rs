//! Remote document reader

use reqwest::Client;

use super::extract::extract_text;
use super::{ReaderError, ensure_success, parse_url, transport_error};

pub use super::extract::DocumentKind;

/// Downloads documents and returns their text
pub struct FileReader {
    client: Client,
}

impl FileReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Downloads `url` and extracts its text as a document of type `extension`
    /// (`.txt`, `.docx`, `.pdf`, `.xls` or `.xlsx`).
    ///
    /// The type is checked before anything is downloaded.
    pub async fn read_file(&self, url: &str, extension: &str) -> Result<String, ReaderError> {
        let kind = DocumentKind::from_extension(extension)?;
        let url = parse_url(url)?;
        tracing::debug!("Reading {:?} document from {}", kind, url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        let bytes = ensure_success(response)?
            .bytes()
            .await
            .map_err(|e| transport_error(&url, e))?;

        tracing::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        extract_text(&bytes, kind)
    }
}
