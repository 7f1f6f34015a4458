//! Session and stage state for pipeline runs.
//!
//! A session tracks one end-to-end pipeline execution for a caller-supplied
//! identifier. Sessions live in memory until explicitly reset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::request::AnalysisRequest;

/// Execution status of a pipeline session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Currently executing stages
    Running,

    /// Paused by the external layer; the next stage will not start
    Paused,

    /// All stages and consolidation finished
    Completed,

    /// Consolidation or an unexpected executor error aborted the run
    Error,
}

/// Outcome class of a single pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// The stage's service produced a real result
    Success,

    /// Every provider/operation for the stage failed; a deterministic
    /// placeholder payload was stored instead
    Fallback,

    /// Reserved for stage payloads carrying an error marker
    Error,
}

/// Result of one pipeline stage.
///
/// Every stage of every completed session has exactly one of these, even
/// when all providers for the stage were exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub status: StageStatus,

    /// Structured stage output (real or synthesized fallback)
    pub payload: Value,

    /// Provider that produced the payload, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_provider: Option<String>,
}

impl StageResult {
    pub fn success(payload: Value, source_provider: Option<String>) -> Self {
        Self {
            status: StageStatus::Success,
            payload,
            source_provider,
        }
    }

    pub fn fallback(payload: Value) -> Self {
        Self {
            status: StageStatus::Fallback,
            payload,
            source_provider: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.status == StageStatus::Fallback
    }
}

/// In-memory record of one session's execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,

    pub status: SessionStatus,

    /// Original request, kept so a paused session can be resumed
    pub request: AnalysisRequest,

    pub started_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of stages that have stored a result so far
    pub stages_completed: usize,

    /// Total number of domain stages in this run
    pub total_stages: usize,

    /// Description of the stage currently executing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,

    /// Error message when `status == Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionState {
    pub fn new(request: AnalysisRequest, total_stages: usize) -> Self {
        Self {
            session_id: request.session_id.clone(),
            status: SessionStatus::Running,
            request,
            started_at: Utc::now(),
            completed_at: None,
            stages_completed: 0,
            total_stages,
            current_stage: None,
            error: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, SessionStatus::Completed | SessionStatus::Error)
    }
}

/// Progress snapshot for a session, consumed by the external layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProgress {
    pub completed: bool,

    /// 0..=100
    pub percentage: f64,

    pub current_step: String,

    pub total_steps: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stage_result_classification() {
        let ok = StageResult::success(json!({"k": 1}), Some("gemini".to_string()));
        assert_eq!(ok.status, StageStatus::Success);
        assert!(!ok.is_fallback());

        let fb = StageResult::fallback(json!({"results": []}));
        assert!(fb.is_fallback());
        assert!(fb.source_provider.is_none());
    }

    #[test]
    fn test_session_lifecycle_flags() {
        let req = AnalysisRequest::new("fitness", "coaching app");
        let mut state = SessionState::new(req, 7);

        assert!(state.is_running());
        assert!(!state.is_finished());

        state.status = SessionStatus::Paused;
        assert!(!state.is_running());
        assert!(!state.is_finished());

        state.status = SessionStatus::Completed;
        assert!(state.is_finished());
    }

    #[test]
    fn test_stage_result_serialization() {
        let result = StageResult::success(json!({"avatar": "x"}), Some("openai".to_string()));
        let json = serde_json::to_string(&result).unwrap();
        let parsed: StageResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.status, StageStatus::Success);
        assert_eq!(parsed.source_provider.as_deref(), Some("openai"));
    }
}
