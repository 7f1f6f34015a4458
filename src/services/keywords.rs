//! Keywords analysis service.
//!
//! Extracts the strategic search and copy keywords for the segment from
//! the research and the avatar's vocabulary.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::Result;

pub struct KeywordsService {
    generation: Arc<GenerationManager>,
}

impl KeywordsService {
    pub fn new(generation: Arc<GenerationManager>) -> Self {
        Self { generation }
    }

    fn prompt(&self, args: &OpArgs) -> String {
        let research = args
            .input("web_research")
            .map(|v| v.to_string())
            .unwrap_or_default();
        let avatar = args
            .input("avatar")
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!(
            "Identify the strategic keywords for marketing '{product}' in \
             the '{segment}' segment. \
             Market research:\n{research}\nCustomer avatar:\n{avatar}\n\
             Respond with a JSON object with a 'keywords' array; each entry \
             has keys: keyword, intent, priority.",
            product = args.request.product,
            segment = args.request.segment,
            research = research,
            avatar = avatar,
        )
    }
}

#[async_trait]
impl Service for KeywordsService {
    fn name(&self) -> &str {
        "keywords"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["analyze_keywords", "extract_keywords", "identify_keywords"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        generate_payload(&self.generation, self.prompt(args)).await
    }
}
