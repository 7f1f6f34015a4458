//! Provider registry with per-provider circuit breakers.
//!
//! Each provider group (generation, search) holds an ordered set of
//! providers. A provider accumulates consecutive failures; once it crosses
//! the group's threshold it is disabled and skipped by selection until its
//! cooldown elapses, after which it becomes eligible for one reprobe. Any
//! success fully re-arms the breaker.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

/// Provider group names used throughout the core
pub const GROUP_GENERATION: &str = "generation";
pub const GROUP_SEARCH: &str = "search";

/// Health snapshot for one provider, for diagnostics output
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub name: String,
    pub group: String,
    pub priority: u32,
    pub available: bool,
    pub consecutive_failures: u32,
    pub max_failures: u32,
    /// Seconds until a disabled provider becomes eligible again (0 when
    /// available or already past cooldown)
    pub cooldown_remaining_secs: u64,
}

#[derive(Debug)]
struct ProviderState {
    group: String,
    priority: u32,
    consecutive_failures: u32,
    max_failures: u32,
    /// Set when the breaker opens; cleared on success or reset
    disabled_at: Option<Instant>,
}

impl ProviderState {
    fn is_eligible(&self, cooldown: Duration, now: Instant) -> bool {
        if self.consecutive_failures < self.max_failures {
            return true;
        }
        match self.disabled_at {
            Some(at) => now.duration_since(at) >= cooldown,
            None => true,
        }
    }
}

/// Registry of providers and their breaker state.
///
/// All mutation goes through `record_success` / `record_failure`; selection
/// never mutates state, so a reprobe that fails again simply re-opens the
/// breaker with a fresh cooldown window.
pub struct ProviderRegistry {
    providers: Mutex<HashMap<String, ProviderState>>,
    cooldown: Duration,
}

impl ProviderRegistry {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            providers: Mutex::new(HashMap::new()),
            cooldown,
        }
    }

    /// Register a provider under a group. Lower priority wins selection.
    pub fn register(&self, name: &str, group: &str, priority: u32, max_failures: u32) {
        let mut providers = self.lock();
        providers.insert(
            name.to_string(),
            ProviderState {
                group: group.to_string(),
                priority,
                consecutive_failures: 0,
                max_failures,
                disabled_at: None,
            },
        );
        debug!(provider = name, group, priority, "registered provider");
    }

    /// All currently eligible providers in a group, best first.
    ///
    /// A disabled provider past its cooldown is included (reprobe). When the
    /// group has providers but every one is disabled inside its cooldown,
    /// the whole group's counters are cleared so the group is never
    /// permanently unusable; that reset is logged loudly because it can
    /// also mask a fully-misconfigured deployment.
    pub fn candidates(&self, group: &str) -> Vec<String> {
        let now = Instant::now();
        let mut providers = self.lock();
        let mut eligible = eligible_in(&providers, group, self.cooldown, now);

        if eligible.is_empty() && providers.values().any(|s| s.group == group) {
            warn!(
                group,
                "every provider in group exhausted; clearing failure counters"
            );
            for state in providers.values_mut().filter(|s| s.group == group) {
                state.consecutive_failures = 0;
                state.disabled_at = None;
            }
            eligible = eligible_in(&providers, group, self.cooldown, now);
        }

        eligible
    }

    /// Best eligible provider in a group, if any
    pub fn select_best(&self, group: &str) -> Option<String> {
        self.candidates(group).into_iter().next()
    }

    /// Record a successful call: fully re-arms the breaker
    pub fn record_success(&self, name: &str) {
        let mut providers = self.lock();
        if let Some(state) = providers.get_mut(name) {
            if state.consecutive_failures > 0 {
                info!(provider = name, "provider recovered");
            }
            state.consecutive_failures = 0;
            state.disabled_at = None;
        }
    }

    /// Record a failed call; opens the breaker at the threshold
    pub fn record_failure(&self, name: &str) {
        let mut providers = self.lock();
        if let Some(state) = providers.get_mut(name) {
            state.consecutive_failures += 1;
            if state.consecutive_failures >= state.max_failures {
                state.disabled_at = Some(Instant::now());
                warn!(
                    provider = name,
                    failures = state.consecutive_failures,
                    cooldown_secs = self.cooldown.as_secs(),
                    "provider disabled after consecutive failures"
                );
            } else {
                debug!(
                    provider = name,
                    failures = state.consecutive_failures,
                    "provider failure recorded"
                );
            }
        }
    }

    /// Operator-triggered counter reset: one provider, or every provider
    /// when `name` is None. Logs loudly since breaker history is discarded.
    pub fn reset_errors(&self, name: Option<&str>) {
        let mut providers = self.lock();
        match name {
            Some(name) => {
                if let Some(state) = providers.get_mut(name) {
                    state.consecutive_failures = 0;
                    state.disabled_at = None;
                    warn!(provider = name, "breaker state cleared by operator reset");
                }
            }
            None => {
                for state in providers.values_mut() {
                    state.consecutive_failures = 0;
                    state.disabled_at = None;
                }
                warn!("all provider error counters reset");
            }
        }
    }

    /// Clear error counters for every provider, re-enabling all of them
    pub fn reset_all(&self) {
        self.reset_errors(None);
    }

    /// Health snapshot for every registered provider, grouped and sorted
    pub fn status(&self) -> Vec<ProviderHealth> {
        let now = Instant::now();
        let providers = self.lock();
        let mut out: Vec<ProviderHealth> = providers
            .iter()
            .map(|(name, s)| {
                let available = s.is_eligible(self.cooldown, now);
                let cooldown_remaining_secs = match (available, s.disabled_at) {
                    (false, Some(at)) => {
                        self.cooldown.saturating_sub(now.duration_since(at)).as_secs()
                    }
                    _ => 0,
                };
                ProviderHealth {
                    name: name.clone(),
                    group: s.group.clone(),
                    priority: s.priority,
                    available,
                    consecutive_failures: s.consecutive_failures,
                    max_failures: s.max_failures,
                    cooldown_remaining_secs,
                }
            })
            .collect();
        out.sort_by(|a, b| a.group.cmp(&b.group).then(a.priority.cmp(&b.priority)));
        out
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ProviderState>> {
        // Breaker state stays usable even if a holder panicked mid-update
        match self.providers.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Eligible providers in a group ordered by (priority, consecutive
/// failures), with name as the final tie-breaker for determinism
fn eligible_in(
    providers: &HashMap<String, ProviderState>,
    group: &str,
    cooldown: Duration,
    now: Instant,
) -> Vec<String> {
    let mut eligible: Vec<(&String, &ProviderState)> = providers
        .iter()
        .filter(|(_, s)| s.group == group && s.is_eligible(cooldown, now))
        .collect();
    eligible.sort_by(|a, b| {
        a.1.priority
            .cmp(&b.1.priority)
            .then(a.1.consecutive_failures.cmp(&b.1.consecutive_failures))
            .then(a.0.cmp(b.0))
    });
    eligible.into_iter().map(|(n, _)| n.clone()).collect()
}
