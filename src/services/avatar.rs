//! Customer avatar service.
//!
//! Builds a detailed profile of the ideal customer from the request and the
//! web research stage.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::Result;

pub struct AvatarService {
    generation: Arc<GenerationManager>,
}

impl AvatarService {
    pub fn new(generation: Arc<GenerationManager>) -> Self {
        Self { generation }
    }

    fn prompt(&self, args: &OpArgs) -> String {
        let research = args
            .input("web_research")
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!(
            "Build a detailed customer avatar for the '{segment}' segment, \
             product '{product}'. Target audience: {audience}. \
             Use this market research as grounding:\n{research}\n\
             Respond with a JSON object with keys: name, demographics, \
             pains, desires, objections, buying_triggers.",
            segment = args.request.segment,
            product = args.request.product,
            audience = args.request.target_audience.as_deref().unwrap_or("general"),
            research = research,
        )
    }
}

#[async_trait]
impl Service for AvatarService {
    fn name(&self) -> &str {
        "avatar"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["create_avatar", "generate_avatar", "build_customer_profile"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        generate_payload(&self.generation, self.prompt(args)).await
    }
}
