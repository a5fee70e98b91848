// LLM abstraction layer

pub mod provider;
pub mod client;
pub mod ollama;
pub mod openai;
pub mod groq;

pub use client::CompletionClient;
pub use provider::*;
