//! Keyless web search through DuckDuckGo's HTML endpoint.
//!
//! Result anchors point at a redirect (`//duckduckgo.com/l/?uddg=<target>`);
//! the target URL is decoded from the `uddg` parameter.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::info;
use url::Url;

use super::{SearchError, SearchProvider};

const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

pub struct DuckDuckGoClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl DuckDuckGoClient {
    pub fn new(timeout: Duration) -> Result<Self, SearchError> {
        Self::with_endpoint(DUCKDUCKGO_HTML_URL, timeout)
    }

    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36")
            .build()
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, SearchError> {
        info!(query = %query, "Searching DuckDuckGo");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout(self.timeout)
                } else {
                    SearchError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::RequestFailed(format!("HTTP {}", status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let links = parse_result_links(&html, max_results)?;
        info!(count = links.len(), "DuckDuckGo search completed");
        Ok(links)
    }
}

fn parse_result_links(html: &str, max_results: usize) -> Result<Vec<String>, SearchError> {
    let selector = Selector::parse("a.result__a")
        .map_err(|e| SearchError::ParseError(format!("{:?}", e)))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(decode_result_href)
        .take(max_results)
        .collect())
}

/// Resolves a result anchor to the page it links to; ads and relative links yield `None`
fn decode_result_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;

    let is_redirect = parsed
        .host_str()
        .map(|host| host.ends_with("duckduckgo.com"))
        .unwrap_or(false);
    if !is_redirect {
        return matches!(parsed.scheme(), "http" | "https").then_some(absolute);
    }

    if parsed.path() != "/l/" {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, target)| target.into_owned())
        .filter(|target| target.starts_with("http"))
}
