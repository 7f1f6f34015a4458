//! End-to-end pipeline behavior: degradation, consolidation failure, and
//! progress reporting.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use common::{orchestrator, MockGeneration, MockSearch};
use panorama::domain::{SessionStatus, StageStatus};
use panorama::AnalysisRequest;

fn request() -> AnalysisRequest {
    AnalysisRequest::new("fitness", "coaching app")
}

#[tokio::test]
async fn full_run_with_healthy_providers() {
    let orch = orchestrator(
        vec![MockGeneration::ok("gemini")],
        vec![MockSearch::ok("serper")],
        3,
    );

    let outcome = orch.analyze(request(), None).await.unwrap();

    assert!(outcome.success);
    assert!(!outcome.is_degraded());
    assert_eq!(outcome.stage_results.len(), 12);
    assert!(outcome.data_validation.all_stages_attempted);
    assert_eq!(outcome.data_validation.fallbacks_used, 0);

    for (name, result) in &outcome.stage_results {
        assert_eq!(result.status, StageStatus::Success, "stage {}", name);
    }

    // Stage results keep execution order: research first, funnel last
    assert_eq!(outcome.stage_results[0].0, "web_research");
    assert_eq!(outcome.stage_results[11].0, "sales_funnel");

    // Generation stages attribute their provider
    let avatar = outcome.stage("avatar").unwrap();
    assert_eq!(avatar.source_provider.as_deref(), Some("gemini"));

    // The consolidated report embeds every stage payload
    assert_eq!(outcome.report["segment"], "fitness");
    assert!(outcome.report["sections"]["web_research"].is_object());
    assert!(outcome.report["sections"]["insights"].is_object());
    assert!(outcome.report["sections"]["sales_funnel"].is_object());
}

#[tokio::test]
async fn dead_search_degrades_but_completes() {
    let orch = orchestrator(
        vec![MockGeneration::ok("gemini")],
        vec![MockSearch::failing("serper")],
        3,
    );

    let outcome = orch.analyze(request(), None).await.unwrap();

    assert!(outcome.success);
    assert!(outcome.is_degraded());
    assert_eq!(outcome.data_validation.fallbacks_used, 1);

    let research = outcome.stage("web_research").unwrap();
    assert_eq!(research.status, StageStatus::Fallback);
    assert_eq!(research.payload["fallback_mode"], true);
    // Fallback payload still carries the derived query and a structurally
    // valid (empty) result list for downstream stages
    assert_eq!(
        research.payload["query"],
        "fitness coaching app market analysis"
    );
    assert!(research
        .payload["results"]
        .as_array()
        .is_some_and(|r| r.is_empty()));

    // Later stages were unaffected
    assert_eq!(
        outcome.stage("avatar").unwrap().status,
        StageStatus::Success
    );
}

#[tokio::test]
async fn mid_pipeline_stage_falls_back_without_stopping_the_run() {
    // Provider only chokes on the mental-drivers prompt; every other
    // stage (including consolidation) still succeeds.
    let orch = orchestrator(
        vec![MockGeneration::failing_on("gemini", "key mental drivers")],
        vec![MockSearch::ok("serper")],
        3,
    );

    let outcome = orch.analyze(request(), None).await.unwrap();

    assert!(outcome.success);
    assert!(outcome.is_degraded());
    assert_eq!(outcome.data_validation.fallbacks_used, 1);

    let drivers = outcome.stage("mental_drivers").unwrap();
    assert_eq!(drivers.status, StageStatus::Fallback);
    assert_eq!(drivers.payload["fallback_mode"], true);

    // Stages on either side were unaffected
    assert_eq!(outcome.stage("avatar").unwrap().status, StageStatus::Success);
    assert_eq!(
        outcome.stage("anti_objection").unwrap().status,
        StageStatus::Success
    );
    assert!(outcome.report["sections"]["mental_drivers"].is_object());
}

#[tokio::test]
async fn no_search_backend_at_all_degrades_but_completes() {
    let orch = orchestrator(vec![MockGeneration::ok("gemini")], vec![], 3);

    let outcome = orch.analyze(request(), None).await.unwrap();

    assert!(outcome.success);
    assert_eq!(
        outcome.stage("web_research").unwrap().status,
        StageStatus::Fallback
    );
}

#[tokio::test]
async fn dead_generation_degrades_every_stage_but_still_completes() {
    // Search works, generation is fully down: every generation stage falls
    // back and the report is merged locally instead of aborting the run.
    let orch = orchestrator(
        vec![MockGeneration::failing("gemini")],
        vec![MockSearch::ok("serper")],
        3,
    );

    let outcome = orch.analyze(request(), None).await.unwrap();

    assert!(outcome.success, "error was: {:?}", outcome.error);
    assert!(outcome.is_degraded());
    assert_eq!(outcome.stage_results.len(), 12);
    assert_eq!(
        outcome.stage("web_research").unwrap().status,
        StageStatus::Success
    );
    assert_eq!(outcome.data_validation.fallbacks_used, 11);

    // The report was merged locally with a placeholder summary
    assert_eq!(outcome.report["segment"], "fitness");
    assert_eq!(outcome.report["summary"]["fallback_mode"], true);
    assert!(outcome.report["sections"]["avatar"].is_object());

    let session = orch.session(&outcome.session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
}

#[tokio::test]
async fn invalid_request_is_rejected_before_any_stage() {
    let orch = orchestrator(
        vec![MockGeneration::ok("gemini")],
        vec![MockSearch::ok("serper")],
        3,
    );

    let request = AnalysisRequest::new("", "coaching app");
    let err = orch.analyze(request, None).await.unwrap_err();
    assert!(matches!(
        err,
        panorama::OrchestratorError::InvalidRequest(_)
    ));
}

#[tokio::test]
async fn progress_callback_sees_monotonic_progress() {
    let orch = orchestrator(
        vec![MockGeneration::ok("gemini")],
        vec![MockSearch::ok("serper")],
        3,
    );

    let max_seen = Arc::new(AtomicU32::new(0));
    let seen = max_seen.clone();
    let callback: panorama::core::ProgressCallback = Arc::new(move |p| {
        let pct = p.percentage as u32;
        let prev = seen.load(Ordering::SeqCst);
        assert!(pct >= prev, "progress went backwards: {prev} -> {pct}");
        seen.store(pct, Ordering::SeqCst);
    });

    let outcome = orch.analyze(request(), Some(callback)).await.unwrap();
    assert!(outcome.success);
    assert_eq!(max_seen.load(Ordering::SeqCst), 100);
}

#[tokio::test]
async fn panicking_progress_callback_does_not_break_the_run() {
    let orch = orchestrator(
        vec![MockGeneration::ok("gemini")],
        vec![MockSearch::ok("serper")],
        3,
    );

    let callback: panorama::core::ProgressCallback = Arc::new(|_| {
        panic!("observer bug");
    });

    let outcome = orch.analyze(request(), Some(callback)).await.unwrap();
    assert!(outcome.success);
}

#[tokio::test]
async fn completed_session_reports_full_progress() {
    let orch = orchestrator(
        vec![MockGeneration::ok("gemini")],
        vec![MockSearch::ok("serper")],
        3,
    );

    let outcome = orch.analyze(request(), None).await.unwrap();
    let progress = orch.progress(&outcome.session_id).unwrap();

    assert!(progress.completed);
    assert!((progress.percentage - 100.0).abs() < f64::EPSILON);
    assert_eq!(progress.current_step, "completed");
    assert_eq!(progress.total_steps, 12);
}
