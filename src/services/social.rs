//! Social analysis service.
//!
//! Estimates how the segment's audience talks about the problem across
//! social platforms, grounded on the web research stage.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::Result;

pub struct SocialService {
    generation: Arc<GenerationManager>,
}

impl SocialService {
    pub fn new(generation: Arc<GenerationManager>) -> Self {
        Self { generation }
    }

    fn prompt(&self, args: &OpArgs) -> String {
        let research = args
            .input("web_research")
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!(
            "Analyze the social media conversation around '{product}' in the \
             '{segment}' segment. Use this market research as grounding:\n\
             {research}\n\
             Respond with a JSON object with a 'platforms' array (each entry \
             has keys: platform, dominant_topics, sentiment) and a \
             'total_posts' estimate.",
            product = args.request.product,
            segment = args.request.segment,
            research = research,
        )
    }
}

#[async_trait]
impl Service for SocialService {
    fn name(&self) -> &str {
        "social_analysis"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["search_all_platforms", "search_platforms", "analyze_platforms"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        generate_payload(&self.generation, self.prompt(args)).await
    }
}
