//! Error types for the GitHub reader.

use thiserror::Error;

/// Convenience type for GitHub reader operations.
pub type Result<T> = std::result::Result<T, GithubError>;

/// Things that can go wrong while reading a repository through the GitHub API.
#[derive(Error, Debug)]
pub enum GithubError {
    /// GitHub answered with a non-success status.
    #[error("GitHub API error {status} while trying to {action}: {message}")]
    Upstream {
        action: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response (DNS, TLS, proxy, timeout).
    #[error("failed to {action}: {source}")]
    Transport {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    /// GitHub answered, but not with the JSON shape we expect.
    #[error("failed to parse GitHub response while trying to {action}: {message}")]
    Decode { action: String, message: String },

    /// A tree entry's parent directory was never registered.
    ///
    /// The recursive tree listing enumerates ancestors before descendants, so
    /// this means either the upstream ordering was violated or the requested
    /// path prefix matched a sibling directory.
    #[error("parent directory '{parent}' of '{path}' is missing from the tree listing")]
    MissingParent { path: String, parent: String },
}

impl GithubError {
    pub(crate) fn transport(action: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            action: action.into(),
            source,
        }
    }

    pub(crate) fn decode(action: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            action: action.into(),
            message: message.to_string(),
        }
    }

    /// Short error class name used in response envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            GithubError::Upstream { .. } | GithubError::Transport { .. } => "UpstreamError",
            GithubError::Decode { .. } => "DecodeError",
            GithubError::MissingParent { .. } => "MissingParentError",
        }
    }
}
