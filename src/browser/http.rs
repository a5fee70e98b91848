// Plain HTTP renderer: no JavaScript, no runtime to install

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{page_from_html, PageRenderer, RenderError, RenderSession, RenderedPage};

pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(timeout: Duration) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; VentureScout/0.1)")
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| RenderError::Launch(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn start(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
        }))
    }
}

struct HttpSession {
    client: Client,
}

#[async_trait]
impl RenderSession for HttpSession {
    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError> {
        let page_failed = |reason: String| RenderError::PageFailed {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| page_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(page_failed(format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        let body = response.text().await.map_err(|e| page_failed(e.to_string()))?;

        if content_type.contains("text/html") || content_type.contains("application/xhtml") {
            Ok(page_from_html(&body))
        } else if content_type.starts_with("text/") {
            Ok(RenderedPage {
                markdown: None,
                text: Some(body),
            })
        } else {
            Err(page_failed(format!("unsupported content type '{}'", content_type)))
        }
    }

    async fn close(&mut self) {}
}
