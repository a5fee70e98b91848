// Venture Scout - market research reports for startup ideas

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod search;    // Search providers (SerpAPI, DuckDuckGo HTML)
pub mod browser;   // Page rendering (headless Chrome, plain HTTP)
pub mod chart;
pub mod utils;

// Re-exports for convenience
pub use agents::{execute_research_pipeline, PipelineError, PipelineReport, ResearchPipeline};
pub use config::Config;
pub use models::{StartupProfile, Stage, StructuredReport};
// Note: Import specific items from types module instead of glob to avoid name conflicts
// e.g., use venture_scout::types::{LLMRequest, LLMResponse, AppResult};
