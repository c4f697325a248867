//! Process configuration
//!
//! Everything the service needs from its environment (tokens, API keys, proxies,
//! upstream endpoints) is gathered into [`AppConfig`] once, at startup, and then
//! handed to each client constructor. Request handling never consults the
//! environment.

use std::net::SocketAddr;

use reqwest::{Client, Proxy};

/// Default GitHub REST API base URL
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// Default Google Programmable Search endpoint
pub const DEFAULT_GOOGLE_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Top-level configuration for the HTTP service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    /// Whether debug logging was requested
    pub debug: bool,

    pub github: GithubConfig,
    pub google_search: GoogleSearchConfig,
    pub http: HttpConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            debug: false,
            github: GithubConfig::default(),
            google_search: GoogleSearchConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// GitHub API access
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Token used when a request does not carry its own
    pub default_token: Option<String>,

    /// REST API base URL, without a trailing slash
    pub api_base: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            default_token: None,
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
        }
    }
}

/// Google Programmable Search access
#[derive(Debug, Clone)]
pub struct GoogleSearchConfig {
    pub api_key: Option<String>,
    pub search_engine_id: Option<String>,

    /// Proxy used for search calls only
    pub http_proxy: Option<String>,

    pub endpoint: String,
}

impl Default for GoogleSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            search_engine_id: None,
            http_proxy: None,
            endpoint: DEFAULT_GOOGLE_SEARCH_ENDPOINT.to_string(),
        }
    }
}

/// Outbound HTTP settings shared by the GitHub, link and document clients
#[derive(Debug, Clone, Default)]
pub struct HttpConfig {
    pub http_proxy: Option<String>,
}

impl HttpConfig {
    pub fn build_client(&self) -> Result<Client, reqwest::Error> {
        build_http_client(self.http_proxy.as_deref())
    }
}

impl GoogleSearchConfig {
    pub fn build_client(&self) -> Result<Client, reqwest::Error> {
        build_http_client(self.http_proxy.as_deref())
    }
}

/// Builds a reqwest client that routes both http and https through `proxy`, if any.
pub fn build_http_client(proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();
    if let Some(proxy) = proxy {
        tracing::debug!("Routing outbound requests through proxy {}", proxy);
        builder = builder.proxy(Proxy::all(proxy)?);
    }
    builder.build()
}

/// Treats empty (or whitespace-only) settings as unset.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
