//! Report consolidation service.
//!
//! Folds every stage payload into the final report. The executive summary
//! comes from a generation provider when one is up; when the whole group
//! is down the sections are merged locally with a placeholder summary, so
//! a generation outage degrades the report instead of failing the run.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use super::{generate_payload, OpArgs, Service};
use crate::core::generation::GenerationManager;
use crate::error::{OrchestratorError, Result};

pub struct ReportService {
    generation: Arc<GenerationManager>,
}

impl ReportService {
    pub fn new(generation: Arc<GenerationManager>) -> Self {
        Self { generation }
    }

    fn prompt(&self, args: &OpArgs) -> String {
        let mut sections = String::new();
        for (stage, payload) in &args.inputs {
            sections.push_str(&format!("## {}\n{}\n\n", stage, payload));
        }
        format!(
            "Write an executive summary for a market analysis of '{product}' \
             in the '{segment}' segment, consolidating these stage outputs:\n\
             {sections}\
             Respond with a JSON object with keys: executive_summary, \
             key_findings (array), recommended_actions (array).",
            product = args.request.product,
            segment = args.request.segment,
            sections = sections,
        )
    }
}

#[async_trait]
impl Service for ReportService {
    fn name(&self) -> &str {
        "report"
    }

    fn operations(&self) -> &'static [&'static str] {
        &["consolidate_report", "generate_final_report"]
    }

    #[instrument(skip(self, args), fields(operation = operation))]
    async fn call(&self, operation: &str, args: &OpArgs) -> Result<Value> {
        let _ = operation;
        let summary = match generate_payload(&self.generation, self.prompt(args)).await {
            Ok(summary) => summary,
            Err(err) if err.is_stage_local() => {
                warn!(error = %err, "report generation unavailable; merging sections locally");
                local_summary(args)
            }
            Err(err) => {
                return Err(OrchestratorError::ConsolidationFailed(err.to_string()));
            }
        };

        Ok(json!({
            "generated_at": Utc::now().to_rfc3339(),
            "segment": args.request.segment,
            "product": args.request.product,
            "summary": summary,
            "sections": Value::Object(args.inputs.clone()),
        }))
    }
}

/// Deterministic summary used when no generation provider is available.
/// Lifts key findings from the insights section when that stage produced
/// any.
fn local_summary(args: &OpArgs) -> Value {
    let components: Vec<&String> = args.inputs.keys().collect();
    let key_findings = args
        .input("insights")
        .and_then(|v| v.get("insights"))
        .cloned()
        .unwrap_or_else(|| json!([]));

    json!({
        "executive_summary": format!(
            "Market analysis of '{}' in the '{}' segment, assembled from the collected stage outputs.",
            args.request.product, args.request.segment,
        ),
        "components_analyzed": components,
        "key_findings": key_findings,
        "recommended_actions": [],
        "fallback_mode": true,
    })
}
