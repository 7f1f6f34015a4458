//! Pre-pitch service.
//!
//! Designs the psychological warm-up sequence that precedes the actual
//! offer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::Result;

pub struct PrePitchService {
    generation: Arc<GenerationManager>,
}

impl PrePitchService {
    pub fn new(generation: Arc<GenerationManager>) -> Self {
        Self { generation }
    }

    fn prompt(&self, args: &OpArgs) -> String {
        let drivers = args
            .input("mental_drivers")
            .map(|v| v.to_string())
            .unwrap_or_default();
        let objections = args
            .input("anti_objection")
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!(
            "Design a pre-pitch sequence for '{product}' in the '{segment}' \
             segment. Objectives: {objectives}. \
             Mental drivers:\n{drivers}\nObjection handling:\n{objections}\n\
             Respond with a JSON object with a 'phases' array; each phase \
             has keys: name, goal, script_outline.",
            product = args.request.product,
            segment = args.request.segment,
            objectives = args.request.objectives.as_deref().unwrap_or("conversion"),
            drivers = drivers,
            objections = objections,
        )
    }
}

#[async_trait]
impl Service for PrePitchService {
    fn name(&self) -> &str {
        "pre_pitch"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["generate_pre_pitch", "create_pre_pitch", "orchestrate_pre_pitch"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        generate_payload(&self.generation, self.prompt(args)).await
    }
}
