//! SerpAPI Client
//!
//! Web search through SerpAPI's Google engine. Only the organic result links
//! are used; snippets are ignored because every page is fetched and rendered
//! afterwards anyway.

use async_trait::async_trait;
use serpapi_search_rust::serp_api_search::SerpApiSearch;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use super::{SearchError, SearchProvider};

/// SerpAPI client for general web search
pub struct SerpApiClient {
    api_key: String,
    timeout: Duration,
}

impl SerpApiClient {
    /// Configure client from config
    pub fn from_config(config: &crate::config::SearchConfig) -> Option<Self> {
        if config.serpapi_key.is_empty() {
            return None;
        }

        Some(Self {
            api_key: config.serpapi_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, SearchError> {
        info!(query = %query, "Searching Google via SerpAPI");

        let mut params = HashMap::<String, String>::new();
        params.insert("engine".to_string(), "google".to_string());
        params.insert("q".to_string(), query.to_string());
        params.insert("hl".to_string(), "en".to_string());
        params.insert("num".to_string(), max_results.to_string());

        let search = SerpApiSearch::google(params, self.api_key.clone());

        let results = tokio::time::timeout(self.timeout, search.json())
            .await
            .map_err(|_| SearchError::Timeout(self.timeout))?
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        debug!("Raw SerpAPI response received");
        let links = organic_links(&results, max_results)?;
        info!(count = links.len(), "SerpAPI search completed");
        Ok(links)
    }
}

/// Pulls `organic_results[].link` out of a SerpAPI response
fn organic_links(results: &serde_json::Value, max_results: usize) -> Result<Vec<String>, SearchError> {
    if let Some(error) = results.get("error").and_then(|v| v.as_str()) {
        return Err(SearchError::RequestFailed(error.to_string()));
    }

    let organic_results = match results.get("organic_results") {
        Some(value) => value,
        None => return Ok(Vec::new()),
    };

    let results_array = organic_results
        .as_array()
        .ok_or_else(|| SearchError::ParseError("Expected array of results".to_string()))?;

    Ok(results_array
        .iter()
        .filter_map(|result| result.get("link").and_then(|v| v.as_str()))
        .filter(|link| !link.is_empty())
        .take(max_results)
        .map(String::from)
        .collect())
}
