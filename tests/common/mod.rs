//! Shared mock backends for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;

use panorama::core::{
    GenerationManager, Orchestrator, ProviderRegistry, ResultCache, SearchManager,
};
use panorama::providers::{GenerationBackend, GenerationRequest, SearchBackend, SearchResult};

/// Generation backend with a fixed JSON reply, optional failure, and an
/// optional per-call delay
pub struct MockGeneration {
    pub name: String,
    pub reply: Option<String>,
    pub delay: Duration,
    /// Fail only for prompts containing this marker
    pub fail_on: Option<String>,
    pub calls: AtomicU32,
}

impl MockGeneration {
    fn base(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reply: Some(r#"{"content": "generated analysis"}"#.to_string()),
            delay: Duration::ZERO,
            fail_on: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn ok(name: &str) -> Arc<Self> {
        Arc::new(Self::base(name))
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            ..Self::base(name)
        })
    }

    pub fn slow(name: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::base(name)
        })
    }

    pub fn failing_on(name: &str, marker: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_on: Some(marker.to_string()),
            ..Self::base(name)
        })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for MockGeneration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(marker) = &self.fail_on {
            if request.prompt.contains(marker.as_str()) {
                return Err(anyhow!("simulated outage for this capability"));
            }
        }
        match &self.reply {
            Some(r) => Ok(r.clone()),
            None => Err(anyhow!("simulated generation outage")),
        }
    }
}

/// Search backend with fixed hits or a scripted failure
pub struct MockSearch {
    pub name: String,
    pub working: bool,
    pub calls: AtomicU32,
}

impl MockSearch {
    pub fn ok(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            working: true,
            calls: AtomicU32::new(0),
        })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            working: false,
            calls: AtomicU32::new(0),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for MockSearch {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, _max_results: usize) -> anyhow::Result<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.working {
            return Err(anyhow!("simulated search outage"));
        }
        Ok(vec![SearchResult {
            title: format!("Report on {}", query),
            url: "https://reports.example/market".to_string(),
            snippet: query.to_string(),
            source: self.name.clone(),
            score: 0.0,
        }])
    }
}

/// Assemble an orchestrator from mock backends
pub fn orchestrator(
    generation_backends: Vec<Arc<MockGeneration>>,
    search_backends: Vec<Arc<MockSearch>>,
    max_recursion_depth: u32,
) -> Orchestrator {
    let registry = Arc::new(ProviderRegistry::new(Duration::from_secs(300)));
    let cache = Arc::new(ResultCache::new(Duration::from_secs(3600)));

    let mut generation = GenerationManager::new(registry.clone(), Duration::from_secs(5));
    for (i, backend) in generation_backends.into_iter().enumerate() {
        generation.add_backend(backend, i as u32 + 1, 2);
    }

    let mut search = SearchManager::new(registry.clone(), cache.clone(), Duration::from_secs(5));
    for (i, backend) in search_backends.into_iter().enumerate() {
        search.add_backend(backend, i as u32 + 1, 3);
    }

    Orchestrator::assemble(
        Arc::new(generation),
        Arc::new(search),
        registry,
        cache,
        max_recursion_depth,
    )
}
