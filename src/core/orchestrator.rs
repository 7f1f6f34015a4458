//! Top-level orchestrator facade.
//!
//! Wires the registry, cache, failover managers, service catalog, router,
//! and executor into one object the external layer (CLI) talks to.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ResolvedConfig;
use crate::core::cache::ResultCache;
use crate::core::executor::{PipelineExecutor, ProgressCallback};
use crate::core::generation::GenerationManager;
use crate::core::registry::{ProviderHealth, ProviderRegistry};
use crate::core::router::CapabilityRouter;
use crate::core::search::SearchManager;
use crate::core::session_store::SessionStore;
use crate::domain::{AnalysisOutcome, AnalysisRequest, SessionProgress, SessionState};
use crate::error::Result;
use crate::providers::{
    GeminiBackend, GoogleSearchBackend, GroqBackend, OpenAiBackend, SerperBackend,
};
use crate::services::{
    AvatarService, CompetitionService, DriversService, FunnelService, InsightsService,
    KeywordsService, ObjectionsService, PredictionsService, PrePitchService, ReportService,
    ResearchService, ServiceCatalog, SocialService, VisualProofsService,
};

pub struct Orchestrator {
    executor: PipelineExecutor,
    registry: Arc<ProviderRegistry>,
    cache: Arc<ResultCache>,
}

impl Orchestrator {
    /// Assemble the full stack from pre-built managers.
    ///
    /// Tests use this directly with mock backends; `from_env` is the
    /// production path.
    pub fn assemble(
        generation: Arc<GenerationManager>,
        search: Arc<SearchManager>,
        registry: Arc<ProviderRegistry>,
        cache: Arc<ResultCache>,
        max_recursion_depth: u32,
    ) -> Self {
        let mut catalog = ServiceCatalog::new();
        catalog.register(Arc::new(ResearchService::new(search)));
        catalog.register(Arc::new(SocialService::new(generation.clone())));
        catalog.register(Arc::new(AvatarService::new(generation.clone())));
        catalog.register(Arc::new(DriversService::new(generation.clone())));
        catalog.register(Arc::new(VisualProofsService::new(generation.clone())));
        catalog.register(Arc::new(ObjectionsService::new(generation.clone())));
        catalog.register(Arc::new(PrePitchService::new(generation.clone())));
        catalog.register(Arc::new(PredictionsService::new(generation.clone())));
        catalog.register(Arc::new(CompetitionService::new(generation.clone())));
        catalog.register(Arc::new(InsightsService::new(generation.clone())));
        catalog.register(Arc::new(KeywordsService::new(generation.clone())));
        catalog.register(Arc::new(FunnelService::new(generation.clone())));
        catalog.register(Arc::new(ReportService::new(generation)));

        let router = Arc::new(CapabilityRouter::new(catalog));
        let sessions = SessionStore::new(max_recursion_depth);
        let executor = PipelineExecutor::new(router, sessions);

        Self {
            executor,
            registry,
            cache,
        }
    }

    /// Build the orchestrator from configuration and whatever provider
    /// API keys the environment carries.
    pub fn from_env(config: &ResolvedConfig) -> Self {
        let registry = Arc::new(ProviderRegistry::new(config.cooldown));
        let cache = Arc::new(ResultCache::new(config.cache_ttl));

        let mut generation =
            GenerationManager::new(registry.clone(), config.provider_timeout);
        if let Some(backend) = GeminiBackend::from_env() {
            generation.add_backend(Arc::new(backend), 1, config.generation_max_failures);
        }
        if let Some(backend) = GroqBackend::from_env() {
            generation.add_backend(Arc::new(backend), 2, config.generation_max_failures);
        }
        if let Some(backend) = OpenAiBackend::from_env() {
            generation.add_backend(Arc::new(backend), 3, config.generation_max_failures);
        }

        let mut search =
            SearchManager::new(registry.clone(), cache.clone(), config.provider_timeout);
        if let Some(backend) = SerperBackend::from_env() {
            search.add_backend(Arc::new(backend), 1, config.search_max_failures);
        }
        if let Some(backend) = GoogleSearchBackend::from_env() {
            search.add_backend(Arc::new(backend), 2, config.search_max_failures);
        }

        let gen_names = generation.backend_names();
        let search_names = search.backend_names();
        if gen_names.is_empty() {
            warn!("no generation provider configured; generation stages will fall back");
        }
        if search_names.is_empty() {
            warn!("no search provider configured; web research will fall back");
        }
        info!(
            generation = ?gen_names,
            search = ?search_names,
            "orchestrator assembled"
        );

        Self::assemble(
            Arc::new(generation),
            Arc::new(search),
            registry,
            cache,
            config.max_recursion_depth,
        )
    }

    /// Run the full analysis pipeline
    pub async fn analyze(
        &self,
        request: AnalysisRequest,
        on_progress: Option<ProgressCallback>,
    ) -> Result<AnalysisOutcome> {
        self.executor.run(request, on_progress).await
    }

    pub fn session(&self, session_id: &str) -> Option<SessionState> {
        self.executor.sessions().get(session_id)
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.executor.sessions().session_ids()
    }

    pub fn progress(&self, session_id: &str) -> Result<SessionProgress> {
        self.executor.sessions().progress(session_id)
    }

    pub fn pause(&self, session_id: &str) -> Result<()> {
        self.executor.sessions().pause(session_id)
    }

    pub fn resume(&self, session_id: &str) -> Result<()> {
        self.executor.sessions().resume(session_id)
    }

    /// Health snapshot for every registered provider
    pub fn provider_status(&self) -> Vec<ProviderHealth> {
        self.registry.status()
    }

    /// Service catalog self-description
    pub fn capabilities(&self) -> Vec<(String, Vec<String>)> {
        self.executor.router().describe()
    }

    /// Clear breaker state for one provider, or all when `name` is None
    pub fn reset_provider_errors(&self, name: Option<&str>) {
        self.registry.reset_errors(name);
    }

    /// Wipe sessions, recursion guards, breaker state, and the cache
    pub fn emergency_reset(&self) {
        self.executor.sessions().emergency_reset();
        self.registry.reset_all();
        self.cache.clear();
        warn!("emergency reset completed");
    }
}
