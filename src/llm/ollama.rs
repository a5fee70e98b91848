// Ollama adapter implementation
// API Reference: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-completion
//
// Streaming replies arrive as newline-delimited JSON objects:
//   {"model":"llama3","response":"Mar","done":false}
//   {"model":"llama3","response":"ket","done":false}
//   {"model":"llama3","response":"","done":true,"done_reason":"stop"}

use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

pub struct OllamaAdapter {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Concatenates streamed chunks until one carries `done: true`
#[derive(Default)]
struct ChunkAccumulator {
    pending: Vec<u8>,
    content: String,
    finish_reason: Option<String>,
    done: bool,
}

impl ChunkAccumulator {
    fn feed(&mut self, bytes: &[u8]) -> AppResult<()> {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.consume_line(&line)?;
            if self.done {
                break;
            }
        }
        Ok(())
    }

    fn consume_line(&mut self, line: &[u8]) -> AppResult<()> {
        if self.done {
            return Ok(());
        }
        let line = std::str::from_utf8(line)
            .map_err(|e| AppError::LLMApi(format!("Ollama stream is not UTF-8: {}", e)))?
            .trim();
        if line.is_empty() {
            return Ok(());
        }

        let chunk: OllamaChunk = serde_json::from_str(line)
            .map_err(|e| AppError::LLMApi(format!("Malformed Ollama chunk '{}': {}", line, e)))?;
        if let Some(error) = chunk.error {
            return Err(AppError::LLMApi(format!("Ollama error: {}", error)));
        }

        self.content.push_str(&chunk.response);
        if chunk.done {
            self.done = true;
            self.finish_reason = chunk.done_reason;
        }
        Ok(())
    }

    fn finish(mut self) -> AppResult<LLMResponse> {
        if !self.done && !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.consume_line(&rest)?;
        }
        Ok(LLMResponse {
            content: self.content,
            finish_reason: self.finish_reason.unwrap_or_else(|| "stop".to_string()),
        })
    }
}

impl OllamaAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build Ollama client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl LLMAdapter for OllamaAdapter {
    async fn create_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let options = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            })
        } else {
            None
        };

        let body = OllamaGenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            stream: request.stream,
            options,
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLMApi(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMApi(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let mut accumulator = ChunkAccumulator::default();
        if request.stream {
            let mut stream = response.bytes_stream();
            while let Some(bytes) = stream.next().await {
                let bytes = bytes
                    .map_err(|e| AppError::LLMApi(format!("Ollama stream interrupted: {}", e)))?;
                accumulator.feed(&bytes)?;
                if accumulator.done {
                    break;
                }
            }
        } else {
            let body = response
                .bytes()
                .await
                .map_err(|e| AppError::LLMApi(format!("Failed to read Ollama response: {}", e)))?;
            accumulator.feed(&body)?;
        }

        let completion = accumulator.finish()?;
        debug!(len = completion.content.len(), "Ollama completion assembled");
        Ok(completion)
    }
}
