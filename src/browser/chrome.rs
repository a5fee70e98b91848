// Headless Chrome renderer (chromiumoxide / CDP)

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{page_from_html, PageRenderer, RenderError, RenderSession, RenderedPage};

pub struct ChromeRenderer {
    executable: Option<PathBuf>,
    request_timeout: Duration,
}

impl ChromeRenderer {
    pub fn new(executable: Option<PathBuf>, request_timeout: Duration) -> Self {
        Self {
            executable,
            request_timeout,
        }
    }
}

/// Executable-lookup failures: the only launch errors an install can fix
fn is_missing_runtime(message: &str) -> bool {
    let lower = message.to_lowercase();
    [
        "could not auto detect a chrome executable",
        "executable doesn't exist",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}

/// A configured executable that is not on disk, checked before launching
fn missing_configured_executable(path: &Path) -> Option<RenderError> {
    (!path.exists()).then(|| {
        RenderError::RuntimeMissing(format!("chrome executable doesn't exist: {}", path.display()))
    })
}

fn classify_launch_failure(message: String) -> RenderError {
    if is_missing_runtime(&message) {
        RenderError::RuntimeMissing(message)
    } else {
        RenderError::Launch(message)
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn start(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.request_timeout);
        if let Some(path) = &self.executable {
            if let Some(err) = missing_configured_executable(path) {
                return Err(err);
            }
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(classify_launch_failure)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| classify_launch_failure(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!("Headless Chrome started");
        Ok(Box::new(ChromeSession {
            browser,
            handler_task,
            pending: None,
        }))
    }
}

struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    /// Tab of the render in flight; left behind when that render is cancelled
    pending: Option<Page>,
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::PageFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        self.pending = Some(page.clone());

        let content = match page.goto(url).await {
            Ok(_) => page.content().await,
            Err(e) => Err(e),
        };
        self.pending = None;
        if let Err(e) = page.close().await {
            debug!(url = %url, error = %e, "Failed to close page");
        }

        let html = content.map_err(|e| RenderError::PageFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(page_from_html(&html))
    }

    async fn discard_pending(&mut self) {
        if let Some(page) = self.pending.take() {
            if let Err(e) = page.close().await {
                debug!(error = %e, "Failed to close abandoned page");
            }
        }
    }

    async fn close(&mut self) {
        self.discard_pending().await;
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Failed to close headless Chrome");
        }
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "Chrome process did not exit cleanly");
        }
        self.handler_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_is_runtime_missing() {
        let err = classify_launch_failure(
            "Could not auto detect a chrome executable".to_string(),
        );
        assert!(matches!(err, RenderError::RuntimeMissing(_)));

        let err = missing_configured_executable(Path::new("/nonexistent/venture-scout/chrome"));
        assert!(matches!(err, Some(RenderError::RuntimeMissing(_))));
        assert!(missing_configured_executable(&std::env::temp_dir()).is_none());
    }

    #[test]
    fn test_other_launch_failures_are_not_repairable() {
        let err = classify_launch_failure("Browser process exited with status 1".to_string());
        assert!(matches!(err, RenderError::Launch(_)));

        // e.g. a missing user-data dir: an install would not help
        let err = classify_launch_failure("No such file or directory (os error 2)".to_string());
        assert!(matches!(err, RenderError::Launch(_)));
    }
}
