//! panorama - Resilient multi-provider market analysis orchestrator
//!
//! Runs a fixed sequence of market-analysis stages against interchangeable
//! AI and search providers, degrading gracefully when providers fail.
//!
//! # Architecture
//!
//! The system is built around resilience:
//! - Provider failures open per-provider circuit breakers
//! - Stages fall back to deterministic placeholder data instead of aborting
//! - Only final report consolidation can fail a whole run
//!
//! # Modules
//!
//! - `providers`: Concrete HTTP backends (Gemini, Groq, OpenAI, Serper, Google CSE)
//! - `services`: Analysis services and the service catalog
//! - `core`: Registry, router, cache, failover managers, executor
//! - `domain`: Data structures (request, session, outcome)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run a full analysis
//! panorama analyze fitness "coaching app"
//!
//! # Check session progress
//! panorama progress <session-id>
//!
//! # Inspect provider health
//! panorama providers
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod providers;
pub mod services;

// Re-export main types at crate root for convenience
pub use core::Orchestrator;
pub use domain::{AnalysisOutcome, AnalysisRequest, SessionProgress, SessionState, SessionStatus};
pub use error::{OrchestratorError, Result};
