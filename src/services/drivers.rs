//! Mental drivers service.
//!
//! Derives the psychological levers most likely to move the avatar toward
//! the product.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::Result;

pub struct DriversService {
    generation: Arc<GenerationManager>,
}

impl DriversService {
    pub fn new(generation: Arc<GenerationManager>) -> Self {
        Self { generation }
    }

    fn prompt(&self, args: &OpArgs) -> String {
        let avatar = args
            .input("avatar")
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!(
            "Identify the key mental drivers for selling '{product}' in the \
             '{segment}' segment to this customer avatar:\n{avatar}\n\
             Respond with a JSON object with a 'drivers' array; each driver \
             has keys: name, description, activation_phrase.",
            product = args.request.product,
            segment = args.request.segment,
            avatar = avatar,
        )
    }
}

#[async_trait]
impl Service for DriversService {
    fn name(&self) -> &str {
        "mental_drivers"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["generate_drivers", "create_mental_drivers", "analyze_drivers"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        generate_payload(&self.generation, self.prompt(args)).await
    }
}
