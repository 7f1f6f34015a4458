//! Anti-objection service.
//!
//! Anticipates the avatar's sales objections and prepares counters for
//! each.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::Result;

pub struct ObjectionsService {
    generation: Arc<GenerationManager>,
}

impl ObjectionsService {
    pub fn new(generation: Arc<GenerationManager>) -> Self {
        Self { generation }
    }

    fn prompt(&self, args: &OpArgs) -> String {
        let avatar = args
            .input("avatar")
            .map(|v| v.to_string())
            .unwrap_or_default();
        let drivers = args
            .input("mental_drivers")
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!(
            "List the objections this avatar will raise against buying \
             '{product}' ({segment} segment) and a counter for each. \
             Avatar:\n{avatar}\nMental drivers:\n{drivers}\n\
             Respond with a JSON object with an 'objections' array; each \
             entry has keys: objection, counter, proof_element.",
            product = args.request.product,
            segment = args.request.segment,
            avatar = avatar,
            drivers = drivers,
        )
    }
}

#[async_trait]
impl Service for ObjectionsService {
    fn name(&self) -> &str {
        "anti_objection"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["handle_objections", "generate_anti_objection", "counter_objections"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        generate_payload(&self.generation, self.prompt(args)).await
    }
}
