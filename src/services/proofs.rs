//! Visual proofs service.
//!
//! Designs demonstrable proof concepts for each mental driver, ready to be
//! turned into visuals or live demonstrations.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::Result;

pub struct VisualProofsService {
    generation: Arc<GenerationManager>,
}

impl VisualProofsService {
    pub fn new(generation: Arc<GenerationManager>) -> Self {
        Self { generation }
    }

    fn prompt(&self, args: &OpArgs) -> String {
        let drivers = args
            .input("mental_drivers")
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!(
            "Design visual proof concepts for '{product}' in the '{segment}' \
             segment, one per driver where possible. \
             Mental drivers:\n{drivers}\n\
             Respond with a JSON object with a 'proofs' array; each proof \
             has keys: name, concept, materials, driver_supported.",
            product = args.request.product,
            segment = args.request.segment,
            drivers = drivers,
        )
    }
}

#[async_trait]
impl Service for VisualProofsService {
    fn name(&self) -> &str {
        "visual_proofs"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["generate_visual_proofs", "create_proofs", "build_proofs"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        generate_payload(&self.generation, self.prompt(args)).await
    }
}
