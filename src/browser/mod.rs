//! Page rendering backends.
//!
//! A renderer opens a session (for Chrome: one browser process), the session
//! turns URLs into readable content, and is closed once the fetch phase ends.
//!
//! - `ChromeRenderer`: headless Chrome over CDP, sees JavaScript-rendered pages
//! - `HttpRenderer`: plain HTTP fetch, for hosts without a browser
//!
//! A renderer that cannot start because its runtime is absent reports
//! [`RenderError::RuntimeMissing`]; the collector answers that with a single
//! [`RuntimeInstaller::install`] call and one retry.

pub mod chrome;
pub mod http;
pub mod installer;

pub use chrome::ChromeRenderer;
pub use http::HttpRenderer;
pub use installer::{CommandInstaller, RuntimeInstaller};

use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{BrowserConfig, RendererKind};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Rendering runtime is missing: {0}")]
    RuntimeMissing(String),

    #[error("Failed to start renderer: {0}")]
    Launch(String),

    #[error("Failed to render {url}: {reason}")]
    PageFailed { url: String, reason: String },

    #[error("Runtime installation failed: {0}")]
    InstallFailed(String),
}

/// Readable content of one page; either field may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    pub markdown: Option<String>,
    pub text: Option<String>,
}

impl RenderedPage {
    /// Markdown when it has content, else plain text when it has content
    pub fn best_content(self) -> Option<String> {
        let RenderedPage { markdown, text } = self;
        markdown
            .filter(|m| !m.trim().is_empty())
            .or_else(|| text.filter(|t| !t.trim().is_empty()))
    }
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn start(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

#[async_trait]
pub trait RenderSession: Send {
    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError>;

    /// Releases whatever an interrupted `render` left open
    async fn discard_pending(&mut self) {}

    async fn close(&mut self);
}

/// Renderer and matching repair action selected in configuration
pub fn renderer_from_config(
    config: &BrowserConfig,
) -> Result<(Arc<dyn PageRenderer>, Arc<dyn RuntimeInstaller>), RenderError> {
    let timeout = Duration::from_secs(config.page_timeout_secs);
    let renderer: Arc<dyn PageRenderer> = match config.renderer {
        RendererKind::Chrome => Arc::new(ChromeRenderer::new(config.chrome_executable.clone(), timeout)),
        RendererKind::Http => Arc::new(HttpRenderer::new(timeout)?),
    };
    let installer: Arc<dyn RuntimeInstaller> = Arc::new(CommandInstaller::new(&config.install_command));
    Ok((renderer, installer))
}

/// Converts a loaded document into markdown and visible plain text
pub(crate) fn page_from_html(html: &str) -> RenderedPage {
    let markdown = html2md::parse_html(html);
    let text = visible_text(html);
    RenderedPage {
        markdown: Some(markdown).filter(|m| !m.trim().is_empty()),
        text: Some(text).filter(|t| !t.trim().is_empty()),
    }
}

fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .map(|element| matches!(element.name(), "script" | "style" | "noscript" | "template" | "head" | "title"))
            .unwrap_or(false);
        if hidden {
            continue;
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        if !words.is_empty() {
            lines.push(words.join(" "));
        }
    }

    lines.join("\n")
}
