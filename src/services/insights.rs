//! Market insights service.
//!
//! Distills the earlier stages into a short list of exclusive, actionable
//! insights.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::Result;

pub struct InsightsService {
    generation: Arc<GenerationManager>,
}

impl InsightsService {
    pub fn new(generation: Arc<GenerationManager>) -> Self {
        Self { generation }
    }

    fn prompt(&self, args: &OpArgs) -> String {
        let mut context = String::new();
        for stage in ["web_research", "avatar", "competition"] {
            if let Some(v) = args.input(stage) {
                context.push_str(&format!("{}: {}\n", stage, v));
            }
        }
        format!(
            "Extract exclusive market insights for '{product}' in the \
             '{segment}' segment from this analysis so far:\n{context}\n\
             Respond with a JSON object with an 'insights' array of strings, \
             most impactful first.",
            product = args.request.product,
            segment = args.request.segment,
            context = context,
        )
    }
}

#[async_trait]
impl Service for InsightsService {
    fn name(&self) -> &str {
        "insights"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["extract_insights", "generate_insights", "exclusive_insights"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        generate_payload(&self.generation, self.prompt(args)).await
    }
}
