//! Search Module
//!
//! Resolves a query text to an ordered list of candidate page URLs.
//! Two backends are available:
//! - DuckDuckGo HTML endpoint (default) - no API key required
//! - SerpAPI Google engine - keyed, more stable result quality

pub mod duckduckgo;
pub mod serpapi;

pub use duckduckgo::DuckDuckGoClient;
pub use serpapi::SerpApiClient;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{SearchConfig, SearchProviderKind};

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("SerpAPI key not configured")]
    NoApiKey,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),

    #[error("Search timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Up to `max_results` result URLs, best first
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, SearchError>;
}

/// Builds the provider selected in configuration
pub fn provider_from_config(config: &SearchConfig) -> Result<Arc<dyn SearchProvider>, SearchError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.provider {
        SearchProviderKind::DuckDuckGo => Ok(Arc::new(DuckDuckGoClient::new(timeout)?)),
        SearchProviderKind::SerpApi => {
            let client = SerpApiClient::from_config(config).ok_or(SearchError::NoApiKey)?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_serpapi_requires_key() {
        let mut config = Config::default().search;
        config.provider = SearchProviderKind::SerpApi;
        assert!(matches!(provider_from_config(&config), Err(SearchError::NoApiKey)));

        config.serpapi_key = "key".to_string();
        assert!(provider_from_config(&config).is_ok());
    }
}
