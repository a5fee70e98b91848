use async_trait::async_trait;
use std::time::Duration;

use crate::types::{AppResult, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Connection settings for one generative backend
#[derive(Debug, Clone)]
pub struct LLMProviderConfig {
    pub provider: LLMProvider,
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider: LLMProvider,
}

impl LLM {
    pub fn new(config: LLMProviderConfig) -> AppResult<Self> {
        let adapter: Box<dyn LLMAdapter> = match config.provider {
            LLMProvider::Ollama => Box::new(crate::llm::ollama::OllamaAdapter::new(
                &config.base_url,
                config.timeout,
            )?),
            LLMProvider::OpenAI => Box::new(crate::llm::openai::OpenAIAdapter::new_with_api_base(
                &config.api_key,
                &config.base_url,
                config.timeout,
            )?),
            // Groq speaks the OpenAI protocol at a fixed endpoint
            LLMProvider::Groq => Box::new(crate::llm::groq::GroqAdapter::new(
                &config.api_key,
                config.timeout,
            )?),
        };

        Ok(Self {
            adapter,
            provider: config.provider,
        })
    }

    pub fn with_adapter(provider: LLMProvider, adapter: Box<dyn LLMAdapter>) -> Self {
        Self { adapter, provider }
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub async fn create_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_completion(request).await
    }
}
