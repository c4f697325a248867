//! Endpoint request bodies and response payloads
//!
//! Unknown body fields are ignored; missing required fields reject the request.

use serde::{Deserialize, Serialize};

/// Body of `github_reader/read_project_structure`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadProjectStructureParams {
    pub owner: String,
    pub repo: String,
    /// Directory to list; surrounding slashes are ignored
    pub path: String,
    /// List the whole subtree instead of one level
    pub recursion: bool,
}

/// Body of `github_reader/read_files_content`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFilesContentParams {
    pub owner: String,
    pub repo: String,
    pub files: Vec<String>,
}

/// One entry of the `read_files_content` result; `file` echoes the requested path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub file: String,
    pub content: String,
}

/// Body of `github_reader/search_file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFileParams {
    pub owner: String,
    pub repo: String,
    pub query: String,
}

/// Body of `google_search/google_search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSearchParams {
    pub query: String,
    #[serde(default = "default_num")]
    pub num: u32,
    /// Number of leading results to skip
    #[serde(default)]
    pub start: u32,
}

fn default_num() -> u32 {
    3
}

/// Body of `google_search/read_link_raw` and `google_search/read_link_text`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadLinkParams {
    pub url: String,
}

/// Body of `file_reader/read_file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFileParams {
    pub url: String,
    /// File extension including the dot, e.g. `.pdf`
    #[serde(rename = "type")]
    pub file_type: String,
}
