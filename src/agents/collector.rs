//! Web Research Collector
//!
//! Turns queries into page content in two phases:
//!
//! 1. search: every query resolves to candidate URLs; all URLs are merged
//!    into one list, deduplicated in first-seen order. A failing query is
//!    logged and skipped.
//! 2. fetch: one render session walks the merged list. Per-URL failures drop
//!    only that URL. A session that cannot start because the rendering
//!    runtime is missing triggers a single install and one retry of the
//!    whole phase; any other phase failure ends collection with whatever was
//!    already kept.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::browser::{PageRenderer, RenderError, RuntimeInstaller};
use crate::models::{PageRecord, QuerySet, ResearchBundle};
use crate::search::SearchProvider;

/// Progress of the one-time runtime repair within a single `collect` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairState {
    NotAttempted,
    Repaired,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    RenderFailed(String),
    TimedOut,
    NoContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedPage {
    pub url: String,
    pub reason: DropReason,
}

/// Everything the fetch phase decided, including what it threw away
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub kept: ResearchBundle,
    pub dropped: Vec<DroppedPage>,
    pub repair: RepairState,
}

impl FetchOutcome {
    fn empty(repair: RepairState) -> Self {
        Self {
            kept: ResearchBundle::new(),
            dropped: Vec::new(),
            repair,
        }
    }

    fn drop_url(&mut self, url: &str, reason: DropReason) {
        warn!(url = %url, reason = ?reason, "Dropping page");
        self.dropped.push(DroppedPage {
            url: url.to_string(),
            reason,
        });
    }
}

pub struct ResearchCollector {
    search: Arc<dyn SearchProvider>,
    renderer: Arc<dyn PageRenderer>,
    installer: Arc<dyn RuntimeInstaller>,
    page_timeout: Duration,
}

impl ResearchCollector {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        renderer: Arc<dyn PageRenderer>,
        installer: Arc<dyn RuntimeInstaller>,
        page_timeout: Duration,
    ) -> Self {
        Self {
            search,
            renderer,
            installer,
            page_timeout,
        }
    }

    pub async fn collect(&self, queries: &QuerySet, results_per_query: usize) -> ResearchBundle {
        self.collect_with_diagnostics(queries, results_per_query).await.kept
    }

    pub async fn collect_with_diagnostics(&self, queries: &QuerySet, results_per_query: usize) -> FetchOutcome {
        let urls = self.gather_urls(queries, results_per_query).await;
        info!(url_count = urls.len(), "Search phase complete");
        if urls.is_empty() {
            return FetchOutcome::empty(RepairState::NotAttempted);
        }

        let mut repair = RepairState::NotAttempted;
        loop {
            let mut outcome = FetchOutcome::empty(repair);
            match self.fetch_phase(&urls, &mut outcome).await {
                Ok(()) => {
                    info!(
                        kept = outcome.kept.len(),
                        dropped = outcome.dropped.len(),
                        "Fetch phase complete"
                    );
                    return outcome;
                }
                Err(RenderError::RuntimeMissing(reason)) if repair == RepairState::NotAttempted => {
                    warn!(reason = %reason, "Rendering runtime missing, attempting repair");
                    repair = match self.installer.install().await {
                        Ok(()) => RepairState::Repaired,
                        Err(e) => {
                            error!(error = %e, "Runtime repair failed");
                            outcome.repair = RepairState::Failed;
                            return outcome;
                        }
                    };
                }
                Err(e) => {
                    error!(error = %e, kept = outcome.kept.len(), "Fetch phase aborted");
                    return outcome;
                }
            }
        }
    }

    /// Search phase: merged, deduplicated URLs in first-seen order
    async fn gather_urls(&self, queries: &QuerySet, results_per_query: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for query in queries {
            match self.search.search(query, results_per_query).await {
                Ok(results) => {
                    for url in results {
                        if seen.insert(url.clone()) {
                            urls.push(url);
                        }
                    }
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "Search failed, continuing with remaining queries");
                }
            }
        }

        urls
    }

    async fn fetch_phase(&self, urls: &[String], outcome: &mut FetchOutcome) -> Result<(), RenderError> {
        let mut session = self.renderer.start().await?;

        for url in urls {
            match tokio::time::timeout(self.page_timeout, session.render(url)).await {
                Err(_) => {
                    session.discard_pending().await;
                    outcome.drop_url(url, DropReason::TimedOut);
                }
                Ok(Err(RenderError::RuntimeMissing(reason))) => {
                    session.close().await;
                    return Err(RenderError::RuntimeMissing(reason));
                }
                Ok(Err(e)) => outcome.drop_url(url, DropReason::RenderFailed(e.to_string())),
                Ok(Ok(page)) => match page.best_content() {
                    Some(content) => {
                        info!(url = %url, content_len = content.len(), "Page kept");
                        outcome.kept.push(PageRecord {
                            url: url.clone(),
                            content,
                        });
                    }
                    None => outcome.drop_url(url, DropReason::NoContent),
                },
            }
        }

        session.close().await;
        Ok(())
    }
}
