//! GitHub REST API client
//!
//! Thin wrapper over `reqwest` for the handful of repository endpoints the reader
//! needs. Responses are deserialized into GitHub-specific structs and converted
//! into the vendor-agnostic [`DirectoryEntry`] / [`TreeEntry`] listings before
//! they leave this module.

use std::collections::BTreeSet;
use std::future::Future;

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use super::error::{GithubError, Result};
use super::tree::{DirectoryEntry, FileNodeType, TreeEntry};
use crate::config::{GithubConfig, non_empty};

const USER_AGENT: &str = concat!("plugin-apis/", env!("CARGO_PKG_VERSION"));
const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Repository operations the reader depends on
///
/// `token` is the token supplied with the current request, if any.
/// Implementations decide how it combines with their own default credentials.
pub trait RepositoryApi: Send + Sync {
    /// Lists one directory level.
    fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: Option<&str>,
    ) -> impl Future<Output = Result<Vec<DirectoryEntry>>> + Send;

    fn get_default_branch(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Lists the whole repository at `branch`, ancestors before descendants.
    fn get_recursive_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        token: Option<&str>,
    ) -> impl Future<Output = Result<Vec<TreeEntry>>> + Send;

    /// Full-text code search; returns repository-relative paths.
    fn search_code(
        &self,
        owner: &str,
        repo: &str,
        query: &str,
        token: Option<&str>,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn fetch_raw_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: Option<&str>,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Resolves which GitHub token a request should use
///
/// A token supplied with the request wins; otherwise the configured default is
/// used. Empty tokens count as absent.
#[derive(Debug, Clone, Default)]
pub struct GithubCredentials {
    default_token: Option<String>,
}

impl GithubCredentials {
    pub fn new(default_token: Option<String>) -> Self {
        Self {
            default_token: non_empty(default_token),
        }
    }

    pub fn resolve<'a>(&'a self, request_token: Option<&'a str>) -> Option<&'a str> {
        request_token
            .filter(|token| !token.is_empty())
            .or(self.default_token.as_deref())
    }

    pub fn has_default(&self) -> bool {
        self.default_token.is_some()
    }
}

/// Repository metadata; only the default branch is used
#[derive(Debug, Deserialize)]
struct GitHubRepository {
    default_branch: Option<String>,
}

/// Item of a contents-API directory listing
#[derive(Debug, Deserialize)]
struct GitHubContentItem {
    name: String,
    #[serde(rename = "type")]
    item_type: Option<String>,
    size: Option<u64>,
}

/// Git trees API response
#[derive(Debug, Deserialize)]
struct GitHubTree {
    #[serde(default)]
    tree: Vec<GitHubTreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct GitHubTreeItem {
    #[serde(default)]
    path: String,
    #[serde(rename = "type")]
    item_type: Option<String>,
    size: Option<u64>,
}

/// Code search response
#[derive(Debug, Deserialize)]
struct GitHubCodeSearchResponse {
    #[serde(default)]
    items: Vec<GitHubCodeSearchItem>,
}

#[derive(Debug, Deserialize)]
struct GitHubCodeSearchItem {
    path: Option<String>,
}

pub struct GithubClient {
    client: Client,
    api_base: String,
    credentials: GithubCredentials,
}

impl GithubClient {
    pub fn new(client: Client, config: &GithubConfig) -> Self {
        GithubClient {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials: GithubCredentials::new(config.default_token.clone()),
        }
    }

    pub fn credentials(&self) -> &GithubCredentials {
        &self.credentials
    }

    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}", self.api_base, owner, repo)
    }

    /// Constructs the code search URL, restricted to one repository and to file contents.
    ///
    /// The free-text part is URL encoded; the qualifiers are joined with `+`.
    fn construct_code_search_url(&self, owner: &str, repo: &str, query: &str) -> String {
        format!(
            "{}/search/code?q={}+repo:{}/{}+in:file",
            self.api_base,
            urlencoding::encode(query),
            owner,
            repo
        )
    }

    /// Starts a GET request with the user agent, accept header and resolved token set.
    fn get(&self, url: &str, accept: &str, token: Option<&str>) -> RequestBuilder {
        tracing::debug!("GitHub request: GET {}", url);
        let mut req_builder = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", accept);

        // Add authentication token if available
        if let Some(token) = self.credentials.resolve(token) {
            req_builder = req_builder.header("Authorization", format!("token {}", token));
        }
        req_builder
    }

    /// Sends a request and turns transport failures and non-success statuses into errors.
    async fn send(&self, req_builder: RequestBuilder, action: &str) -> Result<Response> {
        let response = req_builder
            .send()
            .await
            .map_err(|e| GithubError::transport(action, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = match response.text().await {
                Ok(text) => text,
                Err(_) => "Unknown error".to_string(),
            };
            return Err(GithubError::Upstream {
                action: action.to_string(),
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: Option<&str>,
        action: &str,
    ) -> Result<T> {
        let response = self
            .send(self.get(url, JSON_MEDIA_TYPE, token), action)
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GithubError::decode(action, e))
    }
}

impl RepositoryApi for GithubClient {
    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>> {
        let url = format!("{}/contents/{}", self.repo_url(owner, repo), path);
        let action = format!("list contents of '{}' in {}/{}", path, owner, repo);
        let items: Vec<GitHubContentItem> = self.get_json(&url, token, &action).await?;

        Ok(items
            .into_iter()
            .map(|item| {
                let kind = FileNodeType::from_contents_marker(item.item_type.as_deref());
                if let Some(marker) = item.item_type.as_deref() {
                    if marker != kind.as_ref() {
                        tracing::debug!(
                            "Treating '{}' with type '{}' as a file",
                            item.name,
                            marker
                        );
                    }
                }
                DirectoryEntry {
                    name: item.name,
                    kind,
                    size: item.size,
                }
            })
            .collect())
    }

    async fn get_default_branch(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<String> {
        let action = format!("get repository {}/{}", owner, repo);
        let repository: GitHubRepository = self
            .get_json(&self.repo_url(owner, repo), token, &action)
            .await?;

        repository
            .default_branch
            .ok_or_else(|| GithubError::decode(action, "missing default_branch"))
    }

    async fn get_recursive_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        token: Option<&str>,
    ) -> Result<Vec<TreeEntry>> {
        let url = format!(
            "{}/git/trees/{}?recursive=1",
            self.repo_url(owner, repo),
            branch
        );
        let action = format!("get tree of {}/{}@{}", owner, repo, branch);
        let tree: GitHubTree = self.get_json(&url, token, &action).await?;

        if tree.truncated {
            tracing::warn!(
                "GitHub truncated the tree listing of {}/{}@{}; results are incomplete",
                owner,
                repo,
                branch
            );
        }

        Ok(tree
            .tree
            .into_iter()
            .map(|item| {
                let marker = item.item_type.as_deref();
                if !matches!(marker, Some("tree") | Some("blob")) {
                    tracing::debug!("Treating '{}' with type {:?} as a file", item.path, marker);
                }
                TreeEntry {
                    kind: FileNodeType::from_tree_marker(marker),
                    path: item.path,
                    size: item.size,
                }
            })
            .collect())
    }

    /// Code search is lenient: GitHub rejects it for anonymous callers and for some
    /// queries, and those rejections yield an empty result instead of an error.
    async fn search_code(
        &self,
        owner: &str,
        repo: &str,
        query: &str,
        token: Option<&str>,
    ) -> Result<Vec<String>> {
        let url = self.construct_code_search_url(owner, repo, query);
        let action = format!("search code in {}/{}", owner, repo);

        let response = self
            .get(&url, JSON_MEDIA_TYPE, token)
            .send()
            .await
            .map_err(|e| GithubError::transport(&action, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("GitHub code search returned {} for {}/{}", status, owner, repo);
        }

        let body = response
            .text()
            .await
            .map_err(|e| GithubError::transport(&action, e))?;
        let parsed: GitHubCodeSearchResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Ignoring unparseable code search response: {}", e);
                return Ok(Vec::new());
            }
        };

        let paths: BTreeSet<String> = parsed
            .items
            .into_iter()
            .filter_map(|item| item.path)
            .collect();
        Ok(paths.into_iter().collect())
    }

    async fn fetch_raw_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: Option<&str>,
    ) -> Result<String> {
        let url = format!("{}/contents/{}", self.repo_url(owner, repo), path);
        let action = format!("read '{}' in {}/{}", path, owner, repo);
        let response = self
            .send(self.get(&url, RAW_MEDIA_TYPE, token), &action)
            .await?;

        response
            .text()
            .await
            .map_err(|e| GithubError::transport(action, e))
    }
}
