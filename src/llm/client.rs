use std::time::Duration;
use tracing::{error, info};

use crate::config::LLMConfig;
use crate::llm::provider::{LLMProviderConfig, LLM};
use crate::types::{AppResult, LLMRequest};

/// Prompt-in, text-out access to the generative backend.
///
/// Backend failures never escape: `complete` logs them and yields an empty
/// string, which callers read as "no signal".
pub struct CompletionClient {
    llm: LLM,
    model: String,
    stream: bool,
}

impl CompletionClient {
    pub fn new(llm: LLM, model: impl Into<String>, stream: bool) -> Self {
        Self {
            llm,
            model: model.into(),
            stream,
        }
    }

    pub fn from_config(config: &LLMConfig) -> AppResult<Self> {
        let llm = LLM::new(LLMProviderConfig {
            provider: config.provider,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })?;
        Ok(Self::new(llm, config.model.clone(), config.stream))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(&self, prompt: &str) -> String {
        let request = LLMRequest::new(self.model.clone(), prompt).with_stream(self.stream);

        match self.llm.create_completion(&request).await {
            Ok(response) => {
                info!(
                    provider = %self.llm.provider(),
                    response_len = response.content.len(),
                    finish_reason = %response.finish_reason,
                    "Received completion"
                );
                response.content
            }
            Err(e) => {
                error!(provider = %self.llm.provider(), error = %e, "Completion failed");
                String::new()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::provider::LLMAdapter;
    use crate::types::{AppError, LLMProvider, LLMResponse};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned replies in order and records every prompt it saw
    pub(crate) struct ScriptedAdapter {
        replies: Mutex<VecDeque<AppResult<String>>>,
        pub prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedAdapter {
        pub(crate) fn new(replies: Vec<AppResult<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl LLMAdapter for ScriptedAdapter {
        async fn create_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::LLMApi("no scripted reply left".to_string())));
            reply.map(|content| LLMResponse {
                content,
                finish_reason: "stop".to_string(),
            })
        }
    }

    /// Client backed by scripted replies, plus a handle on the prompts sent
    pub(crate) fn scripted_client(
        replies: Vec<AppResult<String>>,
    ) -> (CompletionClient, Arc<Mutex<Vec<String>>>) {
        let adapter = ScriptedAdapter::new(replies);
        let prompts = adapter.prompts.clone();
        let client = CompletionClient::new(
            LLM::with_adapter(LLMProvider::Ollama, Box::new(adapter)),
            "llama3",
            true,
        );
        (client, prompts)
    }

    #[tokio::test]
    async fn test_complete_returns_reply_text() {
        let (client, prompts) = scripted_client(vec![Ok("hello".to_string())]);
        assert_eq!(client.complete("ping").await, "hello");
        assert_eq!(prompts.lock().unwrap().as_slice(), &["ping".to_string()]);
    }

    #[tokio::test]
    async fn test_complete_maps_backend_error_to_empty() {
        let (client, _) = scripted_client(vec![Err(AppError::LLMApi("down".to_string()))]);
        assert_eq!(client.complete("ping").await, "");
    }

    #[test]
    fn test_from_config_builds_ollama_client() {
        let config = crate::config::Config::default();
        let client = CompletionClient::from_config(&config.llm).unwrap();
        assert_eq!(client.model(), "llama3");
    }
}
