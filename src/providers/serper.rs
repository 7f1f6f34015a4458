//! Serper.dev web-search backend.
//!
//! Endpoint: POST https://google.serper.dev/search
//! Auth: X-API-KEY header

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{SearchBackend, SearchResult};

const API_URL: &str = "https://google.serper.dev/search";

/// Serper API client
pub struct SerperBackend {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SearchBody {
    q: String,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl SerperBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Create from SERPER_API_KEY, if set
    pub fn from_env() -> Option<Self> {
        std::env::var("SERPER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl SearchBackend for SerperBackend {
    fn name(&self) -> &str {
        "serper"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let body = SearchBody {
            q: query.to_string(),
            num: max_results,
        };

        let response = self
            .client
            .post(API_URL)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach Serper API")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Serper error ({}): {}", status, text);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to parse Serper response")?;

        Ok(parsed
            .organic
            .into_iter()
            .take(max_results)
            .map(|r| SearchResult {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
                source: "serper".to_string(),
                score: 0.0,
            })
            .collect())
    }
}
