//! Aggregate pipeline outcome returned to the external layer.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::session::StageResult;

/// Validation summary attached to every outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValidation {
    /// Whether every declared stage stored a result (true even when some
    /// results are fallbacks)
    pub all_stages_attempted: bool,

    /// Number of stages that resolved to a fallback payload
    pub fallbacks_used: usize,
}

/// Result of one pipeline run.
///
/// A run with fallback stages is still a success (degraded). `success` is
/// false only when consolidation failed or an unexpected error escaped the
/// executor, in which case `error` is set and `stage_results` holds whatever
/// partial data exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub success: bool,

    pub session_id: String,

    pub elapsed_seconds: f64,

    /// Stage name -> result, in execution order. Serialized as a JSON
    /// object whose keys keep that order.
    #[serde(
        serialize_with = "serialize_stage_results",
        deserialize_with = "deserialize_stage_results"
    )]
    pub stage_results: Vec<(String, StageResult)>,

    /// Consolidated report (empty object in the failure envelope)
    pub report: Value,

    pub data_validation: DataValidation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisOutcome {
    /// Build the failure envelope carrying partial stage data
    pub fn failure(
        session_id: impl Into<String>,
        elapsed_seconds: f64,
        stage_results: Vec<(String, StageResult)>,
        error: impl Into<String>,
    ) -> Self {
        let fallbacks_used = stage_results
            .iter()
            .filter(|(_, r)| r.is_fallback())
            .count();
        Self {
            success: false,
            session_id: session_id.into(),
            elapsed_seconds,
            stage_results,
            report: Value::Object(Default::default()),
            data_validation: DataValidation {
                all_stages_attempted: false,
                fallbacks_used,
            },
            error: Some(error.into()),
        }
    }

    /// Result of a single stage, if it ran
    pub fn stage(&self, name: &str) -> Option<&StageResult> {
        self.stage_results
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }

    /// True when the run completed but at least one stage fell back
    pub fn is_degraded(&self) -> bool {
        self.success && self.data_validation.fallbacks_used > 0
    }
}

fn serialize_stage_results<S>(
    results: &[(String, StageResult)],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(results.iter().map(|(k, v)| (k, v)))
}

fn deserialize_stage_results<'de, D>(
    deserializer: D,
) -> Result<Vec<(String, StageResult)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StageResultsVisitor;

    impl<'de> Visitor<'de> for StageResultsVisitor {
        type Value = Vec<(String, StageResult)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of stage name to stage result")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut results = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(entry) = access.next_entry()? {
                results.push(entry);
            }
            Ok(results)
        }
    }

    deserializer.deserialize_map(StageResultsVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::StageResult;
    use serde_json::json;

    #[test]
    fn test_failure_envelope_keeps_partial_data() {
        let stages = vec![
            (
                "web_research".to_string(),
                StageResult::fallback(json!({"results": []})),
            ),
            (
                "avatar".to_string(),
                StageResult::success(json!({"name": "x"}), None),
            ),
        ];

        let outcome = AnalysisOutcome::failure("s1", 1.5, stages, "consolidation failed");

        assert!(!outcome.success);
        assert_eq!(outcome.stage_results.len(), 2);
        assert_eq!(outcome.data_validation.fallbacks_used, 1);
        assert!(outcome.stage("avatar").is_some());
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_degraded_success() {
        let stages = vec![(
            "web_research".to_string(),
            StageResult::fallback(json!({"results": []})),
        )];

        let outcome = AnalysisOutcome {
            success: true,
            session_id: "s1".to_string(),
            elapsed_seconds: 0.1,
            stage_results: stages,
            report: json!({}),
            data_validation: DataValidation {
                all_stages_attempted: true,
                fallbacks_used: 1,
            },
            error: None,
        };

        assert!(outcome.is_degraded());
    }

    #[test]
    fn test_stage_results_serialize_in_execution_order() {
        // web_research runs first but sorts after avatar alphabetically;
        // serialization must keep execution order
        let stages = vec![
            (
                "web_research".to_string(),
                StageResult::success(json!({"total_results": 1}), None),
            ),
            (
                "avatar".to_string(),
                StageResult::success(json!({"name": "x"}), None),
            ),
        ];
        let outcome = AnalysisOutcome {
            success: true,
            session_id: "s1".to_string(),
            elapsed_seconds: 0.1,
            stage_results: stages,
            report: json!({}),
            data_validation: DataValidation {
                all_stages_attempted: true,
                fallbacks_used: 0,
            },
            error: None,
        };

        let text = serde_json::to_string(&outcome).unwrap();
        let web = text.find("web_research").unwrap();
        let avatar = text.find("avatar").unwrap();
        assert!(web < avatar, "serialized stage order was lost");

        let back: AnalysisOutcome = serde_json::from_str(&text).unwrap();
        assert_eq!(back.stage_results[0].0, "web_research");
        assert_eq!(back.stage_results[1].0, "avatar");
    }
}
