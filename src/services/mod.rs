//! Outbound collaborators other than GitHub
//!
//! - [`google_search`]: Google Programmable Search queries
//! - [`link_reader`]: fetching a web page as raw HTML or as plain text
//! - [`file_reader`]: downloading a document and extracting its text
//!
//! These are straight I/O glue: one upstream call per operation, no retries,
//! errors surfaced as [`ReaderError`].

pub mod extract;
pub mod file_reader;
pub mod google_search;
pub mod link_reader;

pub use file_reader::{DocumentKind, FileReader};
pub use google_search::{GoogleSearchClient, GoogleSearchItem, GoogleSearchResults};
pub use link_reader::LinkReader;

use reqwest::Response;
use thiserror::Error;

/// Things that can go wrong in the search, link and document collaborators.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The upstream answered with a non-success status.
    #[error("{status} error for url: {url}")]
    Upstream { url: String, status: u16 },

    /// The request never produced a usable response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered, but not with the JSON shape we expect.
    #[error("failed to parse response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The downloaded document could not be decoded.
    #[error("failed to extract text: {0}")]
    Extract(String),
}

impl ReaderError {
    /// Short error class name used in response envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            ReaderError::Upstream { .. } | ReaderError::Transport { .. } => "UpstreamError",
            ReaderError::Decode { .. } => "DecodeError",
            ReaderError::InvalidUrl { .. } => "InvalidUrl",
            ReaderError::UnsupportedFileType(_) => "UnsupportedFileType",
            ReaderError::Extract(_) => "ExtractError",
        }
    }
}

/// Parses `raw` as an absolute URL.
pub(crate) fn parse_url(raw: &str) -> Result<url::Url, ReaderError> {
    url::Url::parse(raw).map_err(|source| ReaderError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

/// Fails with [`ReaderError::Upstream`] unless the response status is a success.
pub(crate) fn ensure_success(response: Response) -> Result<Response, ReaderError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ReaderError::Upstream {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}

pub(crate) fn transport_error(url: &url::Url, source: reqwest::Error) -> ReaderError {
    ReaderError::Transport {
        url: url.to_string(),
        source,
    }
}
