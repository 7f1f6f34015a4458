//! Google Custom Search web-search backend.
//!
//! Endpoint: GET https://www.googleapis.com/customsearch/v1
//! Auth: API key + search engine id query parameters

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{SearchBackend, SearchResult};

const API_URL: &str = "https://www.googleapis.com/customsearch/v1";

// The CSE API caps `num` at 10 per request
const MAX_PAGE_SIZE: usize = 10;

/// Google Custom Search client
pub struct GoogleSearchBackend {
    api_key: String,
    engine_id: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl GoogleSearchBackend {
    pub fn new(api_key: String, engine_id: String) -> Self {
        Self {
            api_key,
            engine_id,
            client: reqwest::Client::new(),
        }
    }

    /// Create from GOOGLE_SEARCH_KEY / GOOGLE_CSE_ID, if both are set
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GOOGLE_SEARCH_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let engine_id = std::env::var("GOOGLE_CSE_ID")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        Some(Self::new(api_key, engine_id))
    }
}

#[async_trait]
impl SearchBackend for GoogleSearchBackend {
    fn name(&self) -> &str {
        "google_cse"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let num = max_results.min(MAX_PAGE_SIZE).to_string();
        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach Google Custom Search API")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Google Custom Search error ({}): {}", status, text);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to parse Google Custom Search response")?;

        Ok(parsed
            .items
            .into_iter()
            .take(max_results)
            .map(|r| SearchResult {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
                source: "google_cse".to_string(),
                score: 0.0,
            })
            .collect())
    }
}
