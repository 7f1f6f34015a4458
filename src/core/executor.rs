//! Pipeline executor.
//!
//! Runs the domain stages strictly in order, converting per-stage failures
//! into deterministic fallback payloads so one dead capability never kills
//! the run. Only consolidation failure (or an unexpected escape) aborts,
//! and even then the failure envelope carries all partial stage data.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument, warn};

use crate::core::router::CapabilityRouter;
use crate::core::session_store::SessionStore;
use crate::core::stages::{
    default_stages, StageSpec, CONSOLIDATION_PATTERNS, CONSOLIDATION_SERVICE,
};
use crate::domain::{
    AnalysisOutcome, AnalysisRequest, DataValidation, SessionProgress, SessionState,
    SessionStatus, StageResult,
};
use crate::error::{OrchestratorError, Result};
use crate::services::OpArgs;

const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Callback invoked as each stage starts and completes. Panics inside
/// the callback are swallowed; observers must never break the pipeline.
pub type ProgressCallback = Arc<dyn Fn(&SessionProgress) + Send + Sync>;

pub struct PipelineExecutor {
    router: Arc<CapabilityRouter>,
    sessions: SessionStore,
    stages: Vec<StageSpec>,
}

impl PipelineExecutor {
    pub fn new(router: Arc<CapabilityRouter>, sessions: SessionStore) -> Self {
        Self {
            router,
            sessions,
            stages: default_stages(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn router(&self) -> &CapabilityRouter {
        &self.router
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Run the full pipeline for a request.
    ///
    /// Always returns an outcome; errors are folded into the failure
    /// envelope rather than propagated, except for request validation and
    /// the recursion limit, which reject before anything runs.
    #[instrument(skip(self, request, on_progress), fields(session_id = %request.session_id))]
    pub async fn run(
        &self,
        request: AnalysisRequest,
        on_progress: Option<ProgressCallback>,
    ) -> Result<AnalysisOutcome> {
        request.validate()?;
        let session_id = request.session_id.clone();
        let _guard = self.sessions.enter(&session_id, "analysis")?;

        let started = Instant::now();
        self.sessions
            .insert(SessionState::new(request.clone(), self.stages.len()));
        info!(stages = self.stages.len(), "pipeline started");

        let mut stage_results: Vec<(String, StageResult)> = Vec::new();
        match self
            .run_inner(&request, &session_id, started, &mut stage_results, on_progress)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                // Anything that escapes the stage loop becomes a failure
                // envelope; the session must never be left running, and
                // partial stage data must survive.
                error!(error = %err, "pipeline aborted");
                self.sessions.mark_error(&session_id, &err.to_string());
                self.sessions.clear_guards(&session_id);
                Ok(AnalysisOutcome::failure(
                    session_id,
                    started.elapsed().as_secs_f64(),
                    stage_results,
                    err.to_string(),
                ))
            }
        }
    }

    async fn run_inner(
        &self,
        request: &AnalysisRequest,
        session_id: &str,
        started: Instant,
        stage_results: &mut Vec<(String, StageResult)>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<AnalysisOutcome> {
        let mut args = OpArgs::new(request.clone());
        let mut fallbacks_used = 0usize;

        for (idx, stage) in self.stages.iter().enumerate() {
            self.wait_if_paused(session_id).await?;
            self.sessions.update(session_id, |s| {
                s.current_stage = Some(stage.description.to_string());
            });
            self.notify(session_id, &on_progress);
            debug!(stage = stage.name, "stage started");

            let result = match self
                .router
                .dispatch(stage.service, stage.patterns, &args)
                .await
            {
                Ok(mut payload) => {
                    let provider = payload
                        .as_object_mut()
                        .and_then(|m| m.remove("provider"))
                        .and_then(|v| v.as_str().map(|s| s.to_string()))
                        .filter(|s| !s.is_empty());
                    StageResult::success(payload, provider)
                }
                Err(err) if err.is_stage_local() => {
                    warn!(stage = stage.name, error = %err, "stage fell back");
                    fallbacks_used += 1;
                    StageResult::fallback((stage.fallback)(request))
                }
                Err(err) => return Err(err),
            };

            args.inputs
                .insert(stage.name.to_string(), result.payload.clone());
            stage_results.push((stage.name.to_string(), result));

            self.sessions.update(session_id, |s| {
                s.stages_completed = idx + 1;
            });
            self.notify(session_id, &on_progress);
        }

        self.wait_if_paused(session_id).await?;
        self.sessions.update(session_id, |s| {
            s.current_stage = Some("Consolidating the report".to_string());
        });

        let report = self
            .router
            .dispatch(CONSOLIDATION_SERVICE, CONSOLIDATION_PATTERNS, &args)
            .await
            .map_err(|err| match err {
                e @ OrchestratorError::ConsolidationFailed(_) => e,
                other => OrchestratorError::ConsolidationFailed(other.to_string()),
            })?;

        self.sessions.mark_completed(session_id);
        self.notify(session_id, &on_progress);
        info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            fallbacks = fallbacks_used,
            "pipeline completed"
        );

        Ok(AnalysisOutcome {
            success: true,
            session_id: session_id.to_string(),
            elapsed_seconds: started.elapsed().as_secs_f64(),
            stage_results: std::mem::take(stage_results),
            report,
            data_validation: DataValidation {
                all_stages_attempted: true,
                fallbacks_used,
            },
            error: None,
        })
    }

    /// Block before a stage while the session is paused
    async fn wait_if_paused(&self, session_id: &str) -> Result<()> {
        loop {
            match self.sessions.get(session_id).map(|s| s.status) {
                Some(SessionStatus::Paused) => {
                    tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
                }
                Some(_) => return Ok(()),
                None => {
                    // Session wiped mid-run (emergency reset)
                    return Err(OrchestratorError::SessionNotFound(session_id.to_string()));
                }
            }
        }
    }

    fn notify(&self, session_id: &str, on_progress: &Option<ProgressCallback>) {
        let Some(cb) = on_progress else { return };
        if let Ok(progress) = self.sessions.progress(session_id) {
            if catch_unwind(AssertUnwindSafe(|| cb(&progress))).is_err() {
                warn!(session_id, "progress callback panicked; ignoring");
            }
        }
    }
}
