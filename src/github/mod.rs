//! GitHub repository reader
//!
//! This module provides:
//! - Single-level directory listings and fully materialized directory trees
//! - Raw file content retrieval
//! - File search by name (over the materialized tree) combined with GitHub code search
//!
//! ## Authentication
//!
//! Every operation accepts an optional per-request token. When a request does
//! not carry one, the default token from [`GithubConfig`](crate::config::GithubConfig)
//! is used. Without any token GitHub applies anonymous rate limits
//! (60 requests/hour) and code search returns no results.
//!
//! ## Paths
//!
//! All returned paths are root-prefixed (`/src/main.rs`). Upstream listings are
//! normalized with [`tree::join_with_root`] before the tree is built, so the
//! repository root is requested as `/`.

pub mod client;
pub mod error;
pub mod search;
pub mod tree;

pub use client::{GithubClient, GithubCredentials, RepositoryApi};
pub use error::GithubError;
pub use search::{NameMatches, SearchHit, find_by_name_substring, merge_search_results};
pub use tree::{DirectoryEntry, FileNode, FileNodeType, TreeEntry, build_children_list, build_full_tree};

use error::Result;
use tree::join_with_root;

/// Repository browsing operations over a [`RepositoryApi`]
///
/// Each call fetches what it needs, builds its own tree and drops it when done;
/// nothing is shared between calls.
pub struct GithubReader<A = GithubClient> {
    api: A,
}

impl<A: RepositoryApi> GithubReader<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Lists the entries directly under `path`.
    ///
    /// `path` is repository-relative without surrounding slashes (`""` for the root).
    pub async fn get_files(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: Option<&str>,
    ) -> Result<Vec<FileNode>> {
        let entries = self.api.list_directory(owner, repo, path, token).await?;
        Ok(build_children_list(entries, path))
    }

    /// Returns the fully populated tree below `path` on the default branch.
    ///
    /// `path` is repository-relative without surrounding slashes (`""` for the root).
    pub async fn get_tree(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: Option<&str>,
    ) -> Result<Vec<FileNode>> {
        let branch = self.api.get_default_branch(owner, repo, token).await?;
        let listing = self
            .api
            .get_recursive_tree(owner, repo, &branch, token)
            .await?;

        tracing::debug!(
            "Building tree of {}/{}@{} from {} entries",
            owner,
            repo,
            branch,
            listing.len()
        );

        let entries = listing.into_iter().map(|entry| TreeEntry {
            path: join_with_root("", &entry.path),
            ..entry
        });
        build_full_tree(entries, &join_with_root("", path))
    }

    pub async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        file: &str,
        token: Option<&str>,
    ) -> Result<String> {
        self.api
            .fetch_raw_file_content(owner, repo, file, token)
            .await
    }

    /// Finds files and directories whose path contains `name`, ignoring case.
    pub async fn search_file_by_name(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
        token: Option<&str>,
    ) -> Result<NameMatches> {
        let tree = self.get_tree(owner, repo, "", token).await?;
        Ok(find_by_name_substring(&tree, name))
    }

    /// Paths of files whose contents match `query`, root-prefixed.
    pub async fn search_file_by_code(
        &self,
        owner: &str,
        repo: &str,
        query: &str,
        token: Option<&str>,
    ) -> Result<Vec<String>> {
        let paths = self.api.search_code(owner, repo, query, token).await?;
        Ok(paths
            .into_iter()
            .map(|path| join_with_root("", &path))
            .collect())
    }

    /// Name search and code search combined, tagged and sorted by path.
    ///
    /// A file found by both searches appears twice.
    pub async fn search_file(
        &self,
        owner: &str,
        repo: &str,
        query: &str,
        token: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        let by_name = self.search_file_by_name(owner, repo, query, token).await?;
        let by_code = self.search_file_by_code(owner, repo, query, token).await?;

        tracing::debug!(
            "Search '{}' in {}/{}: {} files and {} dirs by name, {} files by code",
            query,
            owner,
            repo,
            by_name.files.len(),
            by_name.dirs.len(),
            by_code.len()
        );

        Ok(merge_search_results(by_name, by_code))
    }
}
