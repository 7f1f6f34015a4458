//! Error taxonomy for the orchestration core.
//!
//! Router-boundary errors (`ProviderUnavailable`, `OperationNotFound`,
//! `ProviderCallFailed`) are converted into stage-local fallbacks by the
//! pipeline executor and never propagate past a stage. `ConsolidationFailed`
//! is the only error allowed to abort a whole run. `InvalidRequest` is
//! rejected before any stage starts.

use thiserror::Error;

/// Errors produced by the orchestration core
#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// No healthy provider remains in a group
    #[error("no provider available in group '{group}'")]
    ProviderUnavailable { group: String },

    /// None of the requested operation patterns matched the service's table
    /// (or every matching operation failed). Carries the diagnostics a
    /// caller needs to tell a misconfigured capability name from an outage.
    #[error("no operation matched on service '{service}' (tried {tried:?}, available {available:?})")]
    OperationNotFound {
        service: String,
        tried: Vec<String>,
        available: Vec<String>,
    },

    /// The named logical service is not registered at all
    #[error("service '{service}' is not registered (available services: {available:?})")]
    ServiceUnavailable {
        service: String,
        available: Vec<String>,
    },

    /// A matched operation raised or timed out
    #[error("provider '{provider}' call failed: {message}")]
    ProviderCallFailed { provider: String, message: String },

    /// The final consolidation step failed; aborts the whole run
    #[error("report consolidation failed: {0}")]
    ConsolidationFailed(String),

    /// Missing or malformed mandatory input (caller error)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Session-control operation against an unknown session
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    /// Session-control operation against a session in the wrong state
    #[error("session '{session}' is {actual}, expected {expected}")]
    InvalidSessionState {
        session: String,
        expected: String,
        actual: String,
    },

    /// A provider call re-entered the pipeline past the depth limit
    #[error("recursion limit reached for '{key}' (depth {depth})")]
    RecursionLimit { key: String, depth: u32 },
}

impl OrchestratorError {
    /// True for errors that are absorbed at the stage boundary and turned
    /// into a fallback stage result rather than aborting the run.
    pub fn is_stage_local(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. }
                | Self::OperationNotFound { .. }
                | Self::ServiceUnavailable { .. }
                | Self::ProviderCallFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_local_classification() {
        let err = OrchestratorError::ProviderUnavailable {
            group: "generation".to_string(),
        };
        assert!(err.is_stage_local());

        let err = OrchestratorError::ConsolidationFailed("boom".to_string());
        assert!(!err.is_stage_local());

        let err = OrchestratorError::InvalidRequest("segment missing".to_string());
        assert!(!err.is_stage_local());
    }

    #[test]
    fn test_operation_not_found_diagnostics() {
        let err = OrchestratorError::OperationNotFound {
            service: "avatar".to_string(),
            tried: vec!["create_avatar".to_string()],
            available: vec!["build_profile".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("avatar"));
        assert!(msg.contains("create_avatar"));
        assert!(msg.contains("build_profile"));
    }
}
