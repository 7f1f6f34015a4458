//! Web-search manager with caching, failover, and result validation.
//!
//! The cache is consulted before any provider call. On a miss, providers
//! are tried in registry order; the first provider returning at least one
//! valid result wins. Results are deduplicated by URL, scored, and cached
//! before being returned.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::core::cache::ResultCache;
use crate::core::registry::{ProviderRegistry, GROUP_SEARCH};
use crate::error::{OrchestratorError, Result};
use crate::providers::{SearchBackend, SearchResult};

/// Failover front for search backends
pub struct SearchManager {
    backends: HashMap<String, Arc<dyn SearchBackend>>,
    registry: Arc<ProviderRegistry>,
    cache: Arc<ResultCache>,
    call_timeout: Duration,
}

impl SearchManager {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        cache: Arc<ResultCache>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            backends: HashMap::new(),
            registry,
            cache,
            call_timeout,
        }
    }

    /// Add a backend and register it with the breaker registry
    pub fn add_backend(
        &mut self,
        backend: Arc<dyn SearchBackend>,
        priority: u32,
        max_failures: u32,
    ) {
        let name = backend.name().to_string();
        self.registry
            .register(&name, GROUP_SEARCH, priority, max_failures);
        self.backends.insert(name, backend);
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    /// Search with cache, failover, and validation.
    ///
    /// Errors only when every eligible provider fails or returns nothing
    /// usable.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let key = ResultCache::key_for(query, max_results);
        if let Some(cached) = self.cache.get(&key) {
            if let Ok(results) = serde_json::from_value::<Vec<SearchResult>>(cached) {
                debug!(count = results.len(), "search cache hit");
                return Ok(results);
            }
        }

        let candidates = self.registry.candidates(GROUP_SEARCH);
        if candidates.is_empty() {
            return Err(OrchestratorError::ProviderUnavailable {
                group: GROUP_SEARCH.to_string(),
            });
        }

        let mut last_error = None;
        for name in candidates {
            let Some(backend) = self.backends.get(&name) else {
                continue;
            };

            debug!(provider = %name, "trying search provider");
            match tokio::time::timeout(self.call_timeout, backend.search(query, max_results)).await
            {
                Ok(Ok(raw)) => {
                    let results = validate_results(raw, query, max_results);
                    if results.is_empty() {
                        warn!(provider = %name, "search provider returned no valid results");
                        self.registry.record_failure(&name);
                        last_error = Some(OrchestratorError::ProviderCallFailed {
                            provider: name.clone(),
                            message: "no valid results".to_string(),
                        });
                        continue;
                    }
                    self.registry.record_success(&name);
                    if let Ok(value) = serde_json::to_value(&results) {
                        self.cache.put(&key, value);
                    }
                    info!(provider = %name, count = results.len(), "search succeeded");
                    return Ok(results);
                }
                Ok(Err(err)) => {
                    warn!(provider = %name, error = %err, "search provider failed");
                    self.registry.record_failure(&name);
                    last_error = Some(OrchestratorError::ProviderCallFailed {
                        provider: name.clone(),
                        message: err.to_string(),
                    });
                }
                Err(_) => {
                    warn!(
                        provider = %name,
                        timeout_secs = self.call_timeout.as_secs(),
                        "search provider timed out"
                    );
                    self.registry.record_failure(&name);
                    last_error = Some(OrchestratorError::ProviderCallFailed {
                        provider: name.clone(),
                        message: format!("timed out after {:?}", self.call_timeout),
                    });
                }
            }
        }

        Err(last_error.unwrap_or(OrchestratorError::ProviderUnavailable {
            group: GROUP_SEARCH.to_string(),
        }))
    }
}

/// Drop invalid hits, dedupe by URL, score against the query, sort best
/// first, and truncate.
fn validate_results(
    raw: Vec<SearchResult>,
    query: &str,
    max_results: usize,
) -> Vec<SearchResult> {
    let query_terms: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(|t| t.to_string())
        .collect();

    let mut seen = HashSet::new();
    let mut results: Vec<SearchResult> = raw
        .into_iter()
        .filter(|r| r.url.starts_with("http") && !r.title.trim().is_empty())
        .filter(|r| seen.insert(r.url.clone()))
        .map(|mut r| {
            r.score = relevance_score(&r, &query_terms);
            r
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(max_results);
    results
}

/// Fraction of query terms appearing in the title or snippet, with the
/// title weighted double
fn relevance_score(result: &SearchResult, query_terms: &[String]) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let title = result.title.to_lowercase();
    let snippet = result.snippet.to_lowercase();
    let mut score = 0.0;
    for term in query_terms {
        if title.contains(term.as_str()) {
            score += 2.0;
        }
        if snippet.contains(term.as_str()) {
            score += 1.0;
        }
    }
    score / (query_terms.len() as f64 * 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedSearch {
        name: String,
        hits: Option<Vec<SearchResult>>,
        calls: AtomicU32,
    }

    fn hit(title: &str, url: &str, snippet: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            url: url.to_string(),
            snippet: snippet.to_string(),
            source: "test".to_string(),
            score: 0.0,
        }
    }

    impl FixedSearch {
        fn ok(name: &str, hits: Vec<SearchResult>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                hits: Some(hits),
                calls: AtomicU32::new(0),
            })
        }

        fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                hits: None,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl SearchBackend for FixedSearch {
        fn name(&self) -> &str {
            &self.name
        }

        async fn search(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> anyhow::Result<Vec<SearchResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.hits {
                Some(h) => Ok(h.clone()),
                None => Err(anyhow!("simulated outage")),
            }
        }
    }

    fn manager() -> SearchManager {
        let registry = Arc::new(ProviderRegistry::new(Duration::from_secs(300)));
        let cache = Arc::new(ResultCache::new(Duration::from_secs(3600)));
        SearchManager::new(registry, cache, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_cache_hit_skips_providers() {
        let mut m = manager();
        let backend = FixedSearch::ok(
            "serper",
            vec![hit("Fitness market report", "https://a.example", "fitness growth")],
        );
        m.add_backend(backend.clone(), 1, 3);

        let first = m.search("fitness market", 10).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        // Same normalized query: served from cache
        let second = m.search("  Fitness   MARKET ", 10).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failover_on_dead_primary() {
        let mut m = manager();
        m.add_backend(FixedSearch::failing("serper"), 1, 3);
        m.add_backend(
            FixedSearch::ok(
                "google_cse",
                vec![hit("Fitness apps", "https://b.example", "coaching apps")],
            ),
            2,
            3,
        );

        let results = m.search("fitness coaching", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "test");
        assert_eq!(results[0].url, "https://b.example");
    }

    #[tokio::test]
    async fn test_validation_drops_junk_and_dedupes() {
        let raw = vec![
            hit("Good", "https://a.example", "fitness"),
            hit("", "https://b.example", "no title"),
            hit("No scheme", "ftp://c.example", "bad url"),
            hit("Duplicate", "https://a.example", "same url"),
        ];
        let valid = validate_results(raw, "fitness", 10);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].title, "Good");
    }

    #[tokio::test]
    async fn test_scoring_orders_by_relevance() {
        let raw = vec![
            hit("Unrelated news", "https://x.example", "weather today"),
            hit("Fitness coaching market", "https://y.example", "fitness coaching growth"),
        ];
        let valid = validate_results(raw, "fitness coaching", 10);
        assert_eq!(valid[0].url, "https://y.example");
        assert!(valid[0].score > valid[1].score);
    }

    #[tokio::test]
    async fn test_all_search_providers_down() {
        let mut m = manager();
        m.add_backend(FixedSearch::failing("serper"), 1, 3);

        let err = m.search("fitness", 10).await.unwrap_err();
        assert!(err.is_stage_local());
    }
}
