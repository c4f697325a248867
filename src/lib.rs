//! Plugin APIs: GitHub, web search and document reading endpoints for agent tools
//!
//! This library provides:
//! - GitHub repository browsing (directory listings, full trees, file contents)
//! - File search within a repository, by path name and by code
//! - Google Programmable Search and web page reading
//! - Text extraction from downloaded `.txt`, `.docx`, `.pdf` and `.xlsx` documents
//!
//! ## Authentication
//!
//! GitHub operations support both authenticated and unauthenticated access.
//! A default token can be configured at startup (`GITHUB_TOKEN`), and each
//! request may override it with its own `GITHUB_TOKEN` secret.
//!
//! ```bash
//! # Set GitHub token for authentication (optional)
//! export GITHUB_TOKEN=your_github_token
//! ```
//!
//! - **Rate Limits**:
//!   - Without token: 60 requests/hour (unauthenticated)
//!   - With token: 5,000 requests/hour (authenticated)
//! - **Code search**: GitHub requires authentication; without a token the code
//!   search part of a file search comes back empty
//!
//! ## Usage
//!
//! - As an HTTP server: `plugin-apis http --address 0.0.0.0:8080`
//! - Directly as a Rust library, e.g. the pure tree functions in [`github::tree`]
//!
//! ```rust
//! use plugin_apis::github::{FileNodeType, TreeEntry, build_full_tree};
//!
//! let listing = vec![
//!     TreeEntry { path: "/src".into(), kind: FileNodeType::Dir, size: None },
//!     TreeEntry { path: "/src/main.rs".into(), kind: FileNodeType::File, size: Some(42) },
//! ];
//! let tree = build_full_tree(listing, "/").unwrap();
//! assert_eq!(tree[0].children.as_ref().unwrap()[0].path, "/src/main.rs");
//! ```

pub mod config;
pub mod github;
pub mod services;
pub mod transport;
