//! Analysis services and the service catalog.
//!
//! Each service owns a static table of operation names and produces one
//! JSON payload per call. Services never talk to HTTP clients directly;
//! they go through the generation/search managers, which handle failover.

pub mod avatar;
pub mod competition;
pub mod drivers;
pub mod funnel;
pub mod insights;
pub mod keywords;
pub mod objections;
pub mod predictions;
pub mod prepitch;
pub mod proofs;
pub mod report;
pub mod research;
pub mod social;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::AnalysisRequest;
use crate::error::Result;

// Re-export the concrete services
pub use avatar::AvatarService;
pub use competition::CompetitionService;
pub use drivers::DriversService;
pub use funnel::FunnelService;
pub use insights::InsightsService;
pub use keywords::KeywordsService;
pub use objections::ObjectionsService;
pub use predictions::PredictionsService;
pub use prepitch::PrePitchService;
pub use proofs::VisualProofsService;
pub use report::ReportService;
pub use research::ResearchService;
pub use social::SocialService;

/// Arguments handed to a service operation
#[derive(Debug, Clone)]
pub struct OpArgs {
    /// The original analysis request
    pub request: AnalysisRequest,

    /// Payloads of previously completed stages, keyed by stage name
    pub inputs: Map<String, Value>,
}

impl OpArgs {
    pub fn new(request: AnalysisRequest) -> Self {
        Self {
            request,
            inputs: Map::new(),
        }
    }

    /// Payload of an earlier stage, if present
    pub fn input(&self, stage: &str) -> Option<&Value> {
        self.inputs.get(stage)
    }
}

/// Trait for analysis services
#[async_trait]
pub trait Service: Send + Sync {
    /// Catalog name of this service
    fn name(&self) -> &str;

    /// Operation names this service answers to, in its own vocabulary.
    ///
    /// The table is static: the router only ever dispatches names listed
    /// here.
    fn operations(&self) -> &'static [&'static str];

    /// Execute a named operation
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value>;
}

/// Registry of services by name
#[derive(Default)]
pub struct ServiceCatalog {
    services: HashMap<String, Arc<dyn Service>>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, service: Arc<dyn Service>) {
        self.services.insert(service.name().to_string(), service);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services.get(name).cloned()
    }

    /// Registered service names, sorted for stable diagnostics
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Generate a JSON payload via the failover manager.
///
/// The winning provider's name is embedded in the payload so the executor
/// can attribute the stage result.
pub(crate) async fn generate_payload(
    manager: &crate::core::generation::GenerationManager,
    prompt: String,
) -> Result<Value> {
    let (text, provider) = manager
        .generate(&crate::providers::GenerationRequest::new(prompt))
        .await?;
    let mut payload = parse_payload(&text);
    if let Value::Object(map) = &mut payload {
        map.insert("provider".to_string(), Value::String(provider));
    } else {
        payload = serde_json::json!({ "provider": provider, "items": payload });
    }
    Ok(payload)
}

/// Interpret generated text as a JSON payload.
///
/// Providers frequently wrap JSON in markdown fences or lead with prose;
/// this strips fences and falls back to a `content` wrapper when the text
/// is not JSON at all.
pub(crate) fn parse_payload(text: &str) -> Value {
    let trimmed = text.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    match serde_json::from_str::<Value>(stripped) {
        Ok(v @ Value::Object(_)) | Ok(v @ Value::Array(_)) => v,
        _ => serde_json::json!({ "content": trimmed }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NullService;

    #[async_trait]
    impl Service for NullService {
        fn name(&self) -> &str {
            "null"
        }

        fn operations(&self) -> &'static [&'static str] {
            &["noop"]
        }

        async fn call(&self, _operation: &str, _args: &OpArgs) -> Result<Value> {
            Ok(json!({}))
        }
    }

    #[test]
    fn test_catalog_lookup() {
        let mut catalog = ServiceCatalog::new();
        catalog.register(Arc::new(NullService));

        assert!(catalog.get("null").is_some());
        assert!(catalog.get("missing").is_none());
        assert_eq!(catalog.names(), vec!["null"]);
    }

    #[test]
    fn test_parse_payload_plain_json() {
        let v = parse_payload(r#"{"name": "avatar"}"#);
        assert_eq!(v["name"], "avatar");
    }

    #[test]
    fn test_parse_payload_fenced_json() {
        let v = parse_payload("```json\n{\"name\": \"avatar\"}\n```");
        assert_eq!(v["name"], "avatar");
    }

    #[test]
    fn test_parse_payload_prose_fallback() {
        let v = parse_payload("The market looks strong.");
        assert_eq!(v["content"], "The market looks strong.");
    }
}
