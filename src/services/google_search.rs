//! Google Programmable Search client

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ReaderError, ensure_success, parse_url, transport_error};
use crate::config::{GoogleSearchConfig, non_empty};

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleSearchItem {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// Search results, in the order Google ranked them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleSearchResults {
    pub items: Vec<GoogleSearchItem>,
}

/// Custom Search JSON API response; `items` is absent when nothing matched
#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Vec<GoogleSearchItem>,
}

pub struct GoogleSearchClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    search_engine_id: Option<String>,
}

impl GoogleSearchClient {
    pub fn new(client: Client, config: &GoogleSearchConfig) -> Self {
        let api_key = non_empty(config.api_key.clone());
        let search_engine_id = non_empty(config.search_engine_id.clone());
        if api_key.is_none() || search_engine_id.is_none() {
            tracing::warn!("Google search API key or search engine id is not configured");
        }
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            search_engine_id,
        }
    }

    /// Builds the query string. `start` is zero-based here and one-based upstream.
    fn query_params(&self, query: &str, num: u32, start: u32) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(5);
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        if let Some(cx) = &self.search_engine_id {
            params.push(("cx", cx.clone()));
        }
        params.push(("q", query.to_string()));
        params.push(("start", (start + 1).to_string()));
        params.push(("num", num.to_string()));
        params
    }

    /// Runs a search returning up to `num` results, skipping the first `start`.
    pub async fn search(
        &self,
        query: &str,
        num: u32,
        start: u32,
    ) -> Result<GoogleSearchResults, ReaderError> {
        let url = parse_url(&self.endpoint)?;
        tracing::debug!("Google search: '{}' (num={}, start={})", query, num, start);

        let response = self
            .client
            .get(url.clone())
            .query(&self.query_params(query, num, start))
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        let response = ensure_success(response)?;

        let text = response
            .text()
            .await
            .map_err(|e| transport_error(&url, e))?;
        let body: CustomSearchResponse =
            serde_json::from_str(&text).map_err(|e| ReaderError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(GoogleSearchResults { items: body.items })
    }
}
