//! Domain types for the panorama orchestrator.
//!
//! This module contains the core data structures:
//! - AnalysisRequest: validated pipeline input
//! - Session: per-session status, timing, and stage results
//! - AnalysisOutcome: the aggregate result envelope

pub mod outcome;
pub mod request;
pub mod session;

// Re-export commonly used types
pub use outcome::{AnalysisOutcome, DataValidation};
pub use request::AnalysisRequest;
pub use session::{SessionProgress, SessionState, SessionStatus, StageResult, StageStatus};
