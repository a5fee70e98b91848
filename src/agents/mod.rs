//! Agent System
//!
//! The research agents behind one analysis run:
//!
//! - **Query Agent**: turns a startup profile into search queries
//! - **Research Collector**: searches, deduplicates and renders web pages
//! - **Report Agent**: asks the model for the ten-section analysis
//! - **Section Extractor**: coerces the reply into a fixed-order report
//!
//! ## Pipeline Overview
//!
//! ```text
//! Startup Profile
//!      │
//!      ▼
//! ┌─────────────┐
//! │    Query    │  → Up to six search queries
//! │    Agent    │
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Research   │  → Deduplicated page content
//! │  Collector  │     (one runtime repair at most)
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Report    │  → Raw completion (one retry
//! │    Agent    │     without source material)
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Section   │  → Ten sections + summary chart
//! │  Extractor  │
//! └─────────────┘
//!      │
//!      ▼
//!  Markdown Report
//! ```
//!
//! Every stage absorbs backend failures locally. Only an empty query set, an
//! empty research bundle or an empty report stops the run, each with its own
//! [`PipelineError`].

pub mod collector;
pub mod extractor;
pub mod query;
pub mod report;

pub use collector::{DropReason, DroppedPage, FetchOutcome, RepairState, ResearchCollector};
pub use extractor::{has_market_research_heading, SectionExtractor};
pub use query::QueryAgent;
pub use report::ReportAgent;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn, Instrument};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::browser;
use crate::chart;
use crate::config::Config;
use crate::llm::CompletionClient;
use crate::models::{QuerySet, ResearchBundle, StartupProfile, StructuredReport};
use crate::search;
use crate::types::AppError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid startup profile: {0}")]
    InvalidProfile(#[from] ValidationErrors),

    #[error("Pipeline setup failed: {0}")]
    Setup(#[from] AppError),

    #[error("Failed to generate search queries. Check that the language model is reachable.")]
    NoQueries,

    #[error("Failed to collect research data: no web page yielded usable content.")]
    NoPages,

    #[error("Failed to generate the analysis report: the language model returned nothing.")]
    NoReport,
}

/// Everything one run produced, in pipeline order
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub queries: QuerySet,
    pub bundle: ResearchBundle,
    pub raw_report: String,
    pub report: StructuredReport,
    pub markdown: String,
}

pub struct ResearchPipeline {
    client: CompletionClient,
    collector: ResearchCollector,
    results_per_query: usize,
    chart_dir: PathBuf,
}

impl ResearchPipeline {
    pub fn new(
        client: CompletionClient,
        collector: ResearchCollector,
        results_per_query: usize,
        chart_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            collector,
            results_per_query,
            chart_dir: chart_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let client = CompletionClient::from_config(&config.llm)?;
        let search = search::provider_from_config(&config.search).map_err(AppError::from)?;
        let (renderer, installer) =
            browser::renderer_from_config(&config.browser).map_err(AppError::from)?;

        let collector = ResearchCollector::new(
            search,
            renderer,
            installer,
            Duration::from_secs(config.browser.page_timeout_secs),
        );

        Ok(Self::new(
            client,
            collector,
            config.search.results_per_query,
            config.report.chart_dir.clone(),
        ))
    }

    /// Validates the profile and runs query synthesis only
    pub async fn synthesize_queries(&self, profile: &StartupProfile) -> Result<QuerySet, PipelineError> {
        profile.validate()?;

        let queries = QueryAgent::synthesize_queries(&self.client, profile).await;
        if queries.is_empty() {
            return Err(PipelineError::NoQueries);
        }
        for query in &queries {
            info!(query = %query, "Generated query");
        }
        Ok(queries)
    }

    pub async fn run(&self, profile: &StartupProfile) -> Result<PipelineReport, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("research_run", %run_id);
        self.run_stages(profile).instrument(span).await
    }

    async fn run_stages(&self, profile: &StartupProfile) -> Result<PipelineReport, PipelineError> {
        info!(idea = %profile.idea, model = %self.client.model(), "Starting research pipeline");

        // Step 1: queries
        let queries = self.synthesize_queries(profile).await?;

        // Step 2: web research
        let bundle = self.collector.collect(&queries, self.results_per_query).await;
        if bundle.is_empty() {
            return Err(PipelineError::NoPages);
        }
        for url in bundle.urls() {
            info!(url = %url, "Scraped");
        }

        // Step 3: report
        let raw_report = ReportAgent::synthesize_report(&self.client, &bundle, profile).await;
        if raw_report.trim().is_empty() {
            return Err(PipelineError::NoReport);
        }

        // Step 4: chart and extraction
        let chart_path = match chart::render_summary_chart(&self.chart_dir) {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Summary chart not rendered, keeping its reference");
                chart::summary_chart_path(&self.chart_dir)
            }
        };
        let extractor = SectionExtractor::new(chart_path.display().to_string())?;
        let report = extractor.extract(&raw_report);
        let markdown = report.to_markdown();

        info!(
            query_count = queries.len(),
            page_count = bundle.len(),
            report_len = markdown.len(),
            "Research pipeline complete"
        );

        Ok(PipelineReport {
            queries,
            bundle,
            raw_report,
            report,
            markdown,
        })
    }
}

/// Execute the full research pipeline for one startup profile
pub async fn execute_research_pipeline(
    profile: &StartupProfile,
    config: &Config,
) -> Result<PipelineReport, PipelineError> {
    ResearchPipeline::from_config(config)?.run(profile).await
}

#[cfg(test)]
mod tests {
    use super::collector::tests::{markdown, CountingInstaller, FakeRenderer, FakeSearch};
    use super::*;
    use crate::llm::client::tests::scripted_client;
    use crate::models::tests::profile;
    use crate::models::{ReportSection, PLACEHOLDER_TEXT};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn full_reply() -> String {
        ReportSection::ALL
            .iter()
            .map(|s| format!("## {}\n- {} insight\n", s.name(), s.name()))
            .collect()
    }

    fn chart_dir() -> PathBuf {
        std::env::temp_dir().join(format!("venture-scout-test-{}", Uuid::new_v4()))
    }

    struct Harness {
        pipeline: ResearchPipeline,
        prompts: Arc<std::sync::Mutex<Vec<String>>>,
        renderer: Arc<FakeRenderer>,
        chart_dir: PathBuf,
    }

    fn harness(replies: Vec<Result<String, AppError>>, search_hits: Vec<(&str, Vec<&str>)>) -> Harness {
        let (client, prompts) = scripted_client(replies);
        let search = Arc::new(FakeSearch {
            results: search_hits
                .into_iter()
                .map(|(q, urls)| (q.to_string(), Ok(urls.into_iter().map(String::from).collect())))
                .collect(),
        });
        let renderer = Arc::new(FakeRenderer::new(vec![
            ("https://a", markdown("Alpha market data")),
            ("https://b", markdown("Beta competitor list")),
        ]));
        let collector = ResearchCollector::new(
            search,
            renderer.clone(),
            Arc::new(CountingInstaller::new(true)),
            Duration::from_secs(1),
        );
        let chart_dir = chart_dir();
        Harness {
            pipeline: ResearchPipeline::new(client, collector, 3, chart_dir.clone()),
            prompts,
            renderer,
            chart_dir,
        }
    }

    #[tokio::test]
    async fn test_full_run_produces_ten_sections() {
        let h = harness(
            vec![Ok("\"q1\"\n\"q2\"".to_string()), Ok(full_reply())],
            vec![("q1", vec!["https://a", "https://b"]), ("q2", vec!["https://b"])],
        );

        let result = h.pipeline.run(&profile()).await.unwrap();

        assert_eq!(result.queries.len(), 2);
        assert_eq!(result.bundle.urls(), vec!["https://a", "https://b"]);
        assert_eq!(result.report.sections().len(), ReportSection::ALL.len());
        assert!(!result.markdown.contains(PLACEHOLDER_TEXT));
        assert!(result.markdown.contains("## Risk Assessment\n- Risk Assessment insight"));

        let expected_chart = chart::summary_chart_path(&h.chart_dir);
        assert!(result
            .markdown
            .trim_end()
            .ends_with(&format!("![Summary chart]({})", expected_chart.display())));

        let prompts = h.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("Alpha market data"));
        drop(prompts);
        let _ = std::fs::remove_dir_all(&h.chart_dir);
    }

    #[tokio::test]
    async fn test_no_queries_stops_before_search() {
        let h = harness(vec![Ok(String::new())], vec![]);

        let err = h.pipeline.run(&profile()).await.unwrap_err();

        assert!(matches!(err, PipelineError::NoQueries));
        assert_eq!(h.renderer.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_pages_stops_before_report() {
        let h = harness(vec![Ok("\"q1\"".to_string())], vec![("q1", vec![])]);

        let err = h.pipeline.run(&profile()).await.unwrap_err();

        assert!(matches!(err, PipelineError::NoPages));
        assert_eq!(h.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_report_is_a_failure() {
        let h = harness(
            vec![
                Ok("\"q1\"".to_string()),
                Err(AppError::LLMApi("down".to_string())),
                Err(AppError::LLMApi("down".to_string())),
            ],
            vec![("q1", vec!["https://a"])],
        );

        let err = h.pipeline.run(&profile()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoReport));
    }

    #[tokio::test]
    async fn test_invalid_profile_never_reaches_backend() {
        let h = harness(vec![Ok("\"q1\"".to_string())], vec![]);
        let mut invalid = profile();
        invalid.idea = "  ".to_string();

        let err = h.pipeline.run(&invalid).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidProfile(_)));
        assert!(h.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_messages_are_distinct() {
        let messages = [
            PipelineError::NoQueries.to_string(),
            PipelineError::NoPages.to_string(),
            PipelineError::NoReport.to_string(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }
}
