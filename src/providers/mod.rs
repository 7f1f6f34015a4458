//! Provider backends for external AI and search services.
//!
//! Backends provide a unified interface over the concrete HTTP APIs
//! (Gemini, Groq, OpenAI for generation; Serper, Google CSE for search).
//! The failover managers in `core` treat them uniformly and never talk to
//! the HTTP clients directly.

pub mod gemini;
pub mod google;
pub mod groq;
pub mod openai;
pub mod serper;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// Re-export the concrete backends
pub use gemini::GeminiBackend;
pub use google::GoogleSearchBackend;
pub use groq::GroqBackend;
pub use openai::OpenAiBackend;
pub use serper::SerperBackend;

/// A text-generation request handed to a generation backend
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The full prompt to send
    pub prompt: String,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// One web search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,

    pub url: String,

    /// Result snippet or summary text
    #[serde(default)]
    pub snippet: String,

    /// Backend that produced this hit
    #[serde(default)]
    pub source: String,

    /// Relevance score assigned during validation
    #[serde(default)]
    pub score: f64,
}

/// Trait for text-generation backends
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Registry name of this backend
    fn name(&self) -> &str;

    /// Generate text for a prompt
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Trait for web-search backends
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Registry name of this backend
    fn name(&self) -> &str;

    /// Run a query, returning up to `max_results` hits
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}
