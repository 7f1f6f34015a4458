//! Competition analysis service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::Result;

pub struct CompetitionService {
    generation: Arc<GenerationManager>,
}

impl CompetitionService {
    pub fn new(generation: Arc<GenerationManager>) -> Self {
        Self { generation }
    }

    fn prompt(&self, args: &OpArgs) -> String {
        let research = args
            .input("web_research")
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!(
            "Analyze the competitive landscape for '{product}' in the \
             '{segment}' segment, grounded in this research:\n{research}\n\
             Respond with a JSON object with a 'competitors' array (keys: \
             name, positioning, strengths, weaknesses) and a \
             'differentiation' field.",
            product = args.request.product,
            segment = args.request.segment,
            research = research,
        )
    }
}

#[async_trait]
impl Service for CompetitionService {
    fn name(&self) -> &str {
        "competition"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["analyze_competition", "competitive_analysis", "map_competitors"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        generate_payload(&self.generation, self.prompt(args)).await
    }
}
