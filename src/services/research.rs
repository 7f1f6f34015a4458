//! Web research service.
//!
//! Runs the derived market query through the search manager and packages
//! the hits for downstream stages. This is the only service backed by the
//! search provider group.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use super::{OpArgs, Service};
use crate::core::search::SearchManager;
use crate::error::Result;

const DEFAULT_RESULT_COUNT: usize = 10;

pub struct ResearchService {
    search: Arc<SearchManager>,
}

impl ResearchService {
    pub fn new(search: Arc<SearchManager>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Service for ResearchService {
    fn name(&self) -> &str {
        "research"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["search_web", "perform_search", "comprehensive_search"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let query = args.request.search_query();
        let count = match operation {
            // The comprehensive variant pulls a deeper result set
            "comprehensive_search" => DEFAULT_RESULT_COUNT * 2,
            _ => DEFAULT_RESULT_COUNT,
        };

        let results = self.search.search(&query, count).await?;
        let source = results
            .first()
            .map(|r| r.source.clone())
            .unwrap_or_default();

        Ok(json!({
            "query": query,
            "provider": source,
            "total_results": results.len(),
            "results": results,
        }))
    }
}
