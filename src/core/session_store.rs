//! In-memory session store, pause/resume control, and recursion guards.
//!
//! Sessions persist for the life of the process. The recursion guard caps
//! how many times a given key may re-enter concurrently for one session;
//! guards release on drop so an early return or a failure can never leak a
//! slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::{SessionProgress, SessionState, SessionStatus};
use crate::error::{OrchestratorError, Result};

/// Progress is estimated from completed stages; the remainder is held back
/// until the run actually finishes
const MAX_INFLIGHT_PERCENTAGE: f64 = 95.0;

#[derive(Default)]
struct StoreInner {
    sessions: HashMap<String, SessionState>,
    depths: HashMap<String, u32>,
}

/// Shared in-memory store of session state
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
    max_depth: u32,
}

/// RAII handle for one recursion slot; releases on drop
pub struct DepthGuard {
    store: SessionStore,
    key: String,
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        let mut inner = self.store.lock();
        if let Some(depth) = inner.depths.get_mut(&self.key) {
            *depth = depth.saturating_sub(1);
            if *depth == 0 {
                inner.depths.remove(&self.key);
            }
        }
    }
}

impl SessionStore {
    pub fn new(max_depth: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner::default())),
            max_depth,
        }
    }

    pub fn insert(&self, state: SessionState) {
        self.lock().sessions.insert(state.session_id.clone(), state);
    }

    pub fn get(&self, session_id: &str) -> Option<SessionState> {
        self.lock().sessions.get(session_id).cloned()
    }

    /// Apply a mutation to a session, if present
    pub fn update<F>(&self, session_id: &str, f: F)
    where
        F: FnOnce(&mut SessionState),
    {
        let mut inner = self.lock();
        if let Some(state) = inner.sessions.get_mut(session_id) {
            f(state);
        }
    }

    /// All known session ids, newest first
    pub fn session_ids(&self) -> Vec<String> {
        let inner = self.lock();
        let mut sessions: Vec<&SessionState> = inner.sessions.values().collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions.iter().map(|s| s.session_id.clone()).collect()
    }

    /// Pause a running session. The stage currently executing finishes;
    /// the next one will not start.
    pub fn pause(&self, session_id: &str) -> Result<()> {
        self.transition(session_id, SessionStatus::Running, SessionStatus::Paused)?;
        info!(session_id, "session paused");
        Ok(())
    }

    /// Resume a paused session
    pub fn resume(&self, session_id: &str) -> Result<()> {
        self.transition(session_id, SessionStatus::Paused, SessionStatus::Running)?;
        info!(session_id, "session resumed");
        Ok(())
    }

    fn transition(
        &self,
        session_id: &str,
        expected: SessionStatus,
        next: SessionStatus,
    ) -> Result<()> {
        let mut inner = self.lock();
        let state = inner
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| OrchestratorError::SessionNotFound(session_id.to_string()))?;
        if state.status != expected {
            return Err(OrchestratorError::InvalidSessionState {
                session: session_id.to_string(),
                expected: format!("{expected:?}").to_lowercase(),
                actual: format!("{:?}", state.status).to_lowercase(),
            });
        }
        state.status = next;
        Ok(())
    }

    pub fn mark_completed(&self, session_id: &str) {
        self.update(session_id, |s| {
            s.status = SessionStatus::Completed;
            s.completed_at = Some(Utc::now());
            s.current_stage = None;
        });
    }

    pub fn mark_error(&self, session_id: &str, error: &str) {
        self.update(session_id, |s| {
            s.status = SessionStatus::Error;
            s.completed_at = Some(Utc::now());
            s.error = Some(error.to_string());
        });
    }

    /// Progress snapshot for a session
    pub fn progress(&self, session_id: &str) -> Result<SessionProgress> {
        let state = self
            .get(session_id)
            .ok_or_else(|| OrchestratorError::SessionNotFound(session_id.to_string()))?;

        let completed = state.status == SessionStatus::Completed;
        let percentage = if completed {
            100.0
        } else if state.total_stages == 0 {
            0.0
        } else {
            let raw = state.stages_completed as f64 / state.total_stages as f64 * 100.0;
            raw.min(MAX_INFLIGHT_PERCENTAGE)
        };

        let current_step = match (&state.status, &state.current_stage) {
            (SessionStatus::Completed, _) => "completed".to_string(),
            (SessionStatus::Error, _) => "error".to_string(),
            (SessionStatus::Paused, _) => "paused".to_string(),
            (_, Some(stage)) => stage.clone(),
            (_, None) => "starting".to_string(),
        };

        Ok(SessionProgress {
            completed,
            percentage,
            current_step,
            total_steps: state.total_stages,
        })
    }

    /// Acquire a recursion slot for `session_id`/`key`.
    ///
    /// Fails when the key is already at the depth limit for this session.
    pub fn enter(&self, session_id: &str, key: &str) -> Result<DepthGuard> {
        let slot = format!("{session_id}:{key}");
        let mut inner = self.lock();
        let depth = inner.depths.entry(slot.clone()).or_insert(0);
        if *depth >= self.max_depth {
            warn!(session_id, key, depth = *depth, "recursion limit hit");
            return Err(OrchestratorError::RecursionLimit {
                key: key.to_string(),
                depth: *depth,
            });
        }
        *depth += 1;
        drop(inner);
        Ok(DepthGuard {
            store: self.clone(),
            key: slot,
        })
    }

    /// Drop all recursion slots for a session, whatever their depth
    pub fn clear_guards(&self, session_id: &str) {
        let prefix = format!("{session_id}:");
        self.lock().depths.retain(|k, _| !k.starts_with(&prefix));
    }

    /// Wipe every session and every guard. Loud, for operator recovery.
    pub fn emergency_reset(&self) {
        let mut inner = self.lock();
        let sessions = inner.sessions.len();
        inner.sessions.clear();
        inner.depths.clear();
        warn!(sessions, "emergency reset: all sessions and guards dropped");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnalysisRequest;

    fn store_with_session() -> (SessionStore, String) {
        let store = SessionStore::new(3);
        let req = AnalysisRequest::new("fitness", "coaching app");
        let id = req.session_id.clone();
        store.insert(SessionState::new(req, 7));
        (store, id)
    }

    #[test]
    fn test_pause_resume_transitions() {
        let (store, id) = store_with_session();

        store.pause(&id).unwrap();
        assert_eq!(store.get(&id).unwrap().status, SessionStatus::Paused);

        // Pausing a paused session is an error
        assert!(matches!(
            store.pause(&id),
            Err(OrchestratorError::InvalidSessionState { .. })
        ));

        store.resume(&id).unwrap();
        assert_eq!(store.get(&id).unwrap().status, SessionStatus::Running);
    }

    #[test]
    fn test_unknown_session() {
        let store = SessionStore::new(3);
        assert!(matches!(
            store.pause("nope"),
            Err(OrchestratorError::SessionNotFound(_))
        ));
        assert!(store.progress("nope").is_err());
    }

    #[test]
    fn test_progress_capped_until_complete() {
        let (store, id) = store_with_session();

        store.update(&id, |s| s.stages_completed = 7);
        let p = store.progress(&id).unwrap();
        assert!(!p.completed);
        assert!((p.percentage - 95.0).abs() < f64::EPSILON);

        store.mark_completed(&id);
        let p = store.progress(&id).unwrap();
        assert!(p.completed);
        assert!((p.percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_depth_guard_limits_and_releases() {
        let store = SessionStore::new(2);

        let g1 = store.enter("s1", "analysis").unwrap();
        let g2 = store.enter("s1", "analysis").unwrap();
        assert!(matches!(
            store.enter("s1", "analysis"),
            Err(OrchestratorError::RecursionLimit { .. })
        ));

        // Other sessions and keys are unaffected
        assert!(store.enter("s2", "analysis").is_ok());
        assert!(store.enter("s1", "other").is_ok());

        drop(g1);
        drop(g2);
        assert!(store.enter("s1", "analysis").is_ok());
    }

    #[test]
    fn test_clear_guards_only_hits_one_session() {
        let store = SessionStore::new(1);
        let _g1 = store.enter("s1", "analysis").unwrap();
        let _g2 = store.enter("s2", "analysis").unwrap();

        store.clear_guards("s1");
        assert!(store.enter("s1", "analysis").is_ok());
        assert!(store.enter("s2", "analysis").is_err());
    }

    #[test]
    fn test_emergency_reset_wipes_everything() {
        let (store, id) = store_with_session();
        let _g = store.enter(&id, "analysis").unwrap();

        store.emergency_reset();
        assert!(store.get(&id).is_none());
        assert!(store.enter(&id, "analysis").is_ok());
    }
}
