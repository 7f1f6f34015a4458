//! Future predictions service.
//!
//! Projects where the segment is heading from the research and social
//! signals gathered earlier in the run.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::Result;

pub struct PredictionsService {
    generation: Arc<GenerationManager>,
}

impl PredictionsService {
    pub fn new(generation: Arc<GenerationManager>) -> Self {
        Self { generation }
    }

    fn prompt(&self, args: &OpArgs) -> String {
        let research = args
            .input("web_research")
            .map(|v| v.to_string())
            .unwrap_or_default();
        let social = args
            .input("social_analysis")
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!(
            "Predict how the '{segment}' segment will evolve over the next \
             12-36 months and what that means for '{product}'. \
             Market research:\n{research}\nSocial analysis:\n{social}\n\
             Respond with a JSON object with a 'predictions' array; each \
             entry has keys: horizon, prediction, confidence, implication.",
            segment = args.request.segment,
            product = args.request.product,
            research = research,
            social = social,
        )
    }
}

#[async_trait]
impl Service for PredictionsService {
    fn name(&self) -> &str {
        "future_predictions"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["create_predictions", "generate_predictions", "predict_future"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        generate_payload(&self.generation, self.prompt(args)).await
    }
}
