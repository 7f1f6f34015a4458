//! Sales funnel service.
//!
//! Lays out the funnel stages tuned to the avatar and the drivers that
//! move it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::Result;

pub struct FunnelService {
    generation: Arc<GenerationManager>,
}

impl FunnelService {
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
            "Design an optimized sales funnel for '{product}' in the \
             '{segment}' segment. \
             Avatar:\n{avatar}\nMental drivers:\n{drivers}\n\
             Respond with a JSON object with a 'stages' array; each stage \
             has keys: name, goal, channel, driver_applied.",
            product = args.request.product,
            segment = args.request.segment,
            avatar = avatar,
            drivers = drivers,
        )
    }
}

#[async_trait]
impl Service for FunnelService {
    fn name(&self) -> &str {
        "sales_funnel"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["optimize_sales_funnel", "create_funnel", "build_funnel"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        generate_payload(&self.generation, self.prompt(args)).await
    }
}
