//! Core orchestration logic.
//!
//! This module contains:
//! - ProviderRegistry: circuit breakers over provider groups
//! - CapabilityRouter: operation-pattern dispatch against service tables
//! - ResultCache: TTL cache for search results
//! - GenerationManager / SearchManager: provider failover fronts
//! - SessionStore: session state, pause control, recursion guards
//! - PipelineExecutor: sequential stage execution with fallbacks
//! - Orchestrator: the assembled facade

pub mod cache;
pub mod executor;
pub mod generation;
pub mod orchestrator;
pub mod registry;
pub mod router;
pub mod search;
pub mod session_store;
pub mod stages;

// Re-export commonly used types
pub use cache::ResultCache;
pub use executor::{PipelineExecutor, ProgressCallback};
pub use generation::GenerationManager;
pub use orchestrator::Orchestrator;
pub use registry::{ProviderHealth, ProviderRegistry, GROUP_GENERATION, GROUP_SEARCH};
pub use router::CapabilityRouter;
pub use search::SearchManager;
pub use session_store::{DepthGuard, SessionStore};
pub use stages::{default_stages, StageSpec};
