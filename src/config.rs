use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::llm::groq::GROQ_API_BASE;
use crate::llm::ollama::OLLAMA_DEFAULT_URL;
use crate::llm::openai::OPENAI_API_BASE;
use crate::types::LLMProvider;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub browser: BrowserConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub stream: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SearchProviderKind {
    DuckDuckGo,
    SerpApi,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub provider: SearchProviderKind,
    pub serpapi_key: String,
    pub results_per_query: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RendererKind {
    Chrome,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    pub renderer: RendererKind,
    pub chrome_executable: Option<PathBuf>,
    pub install_command: String,
    pub page_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub chart_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LLMConfig {
                provider: LLMProvider::Ollama,
                base_url: default_base_url(LLMProvider::Ollama).to_string(),
                model: "llama3".to_string(),
                api_key: String::new(),
                stream: true,
                timeout_secs: 120,
            },
            search: SearchConfig {
                provider: SearchProviderKind::DuckDuckGo,
                serpapi_key: String::new(),
                results_per_query: 3,
                timeout_secs: 20,
            },
            browser: BrowserConfig {
                renderer: RendererKind::Chrome,
                chrome_executable: None,
                install_command: "npx @puppeteer/browsers install chrome@stable".to_string(),
                page_timeout_secs: 30,
            },
            report: ReportConfig {
                chart_dir: PathBuf::from("reports"),
            },
        }
    }
}

/// Endpoint used when `LLM_BASE_URL` is not set
pub fn default_base_url(provider: LLMProvider) -> &'static str {
    match provider {
        LLMProvider::Ollama => OLLAMA_DEFAULT_URL,
        LLMProvider::OpenAI => OPENAI_API_BASE,
        LLMProvider::Groq => GROQ_API_BASE,
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source, `from_env` uses the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let search_provider = match var("SEARCH_PROVIDER", "duckduckgo").to_lowercase().as_str() {
            "duckduckgo" | "ddg" => SearchProviderKind::DuckDuckGo,
            "serpapi" => SearchProviderKind::SerpApi,
            other => anyhow::bail!("Unsupported search provider: {}", other),
        };

        let renderer = match var("RENDERER", "chrome").to_lowercase().as_str() {
            "chrome" => RendererKind::Chrome,
            "http" => RendererKind::Http,
            other => anyhow::bail!("Unsupported renderer: {}", other),
        };

        let provider: LLMProvider = var("LLM_PROVIDER", "ollama").parse()?;

        Ok(Self {
            llm: LLMConfig {
                provider,
                base_url: var("LLM_BASE_URL", default_base_url(provider)),
                model: var("LLM_MODEL", &defaults.llm.model),
                api_key: var("LLM_API_KEY", ""),
                stream: var("LLM_STREAM", "true").parse()?,
                timeout_secs: var("LLM_TIMEOUT_SECS", "120").parse()?,
            },
            search: SearchConfig {
                provider: search_provider,
                serpapi_key: var("SERPAPI_API_KEY", ""),
                results_per_query: var("RESULTS_PER_QUERY", "3").parse()?,
                timeout_secs: var("SEARCH_TIMEOUT_SECS", "20").parse()?,
            },
            browser: BrowserConfig {
                renderer,
                chrome_executable: lookup("CHROME_EXECUTABLE").map(PathBuf::from),
                install_command: var("BROWSER_INSTALL_COMMAND", &defaults.browser.install_command),
                page_timeout_secs: var("PAGE_TIMEOUT_SECS", "30").parse()?,
            },
            report: ReportConfig {
                chart_dir: lookup("CHART_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.report.chart_dir),
            },
        })
    }
}
