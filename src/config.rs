//! Configuration for the panorama orchestrator.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (PANORAMA_*)
//! 2. Config file (.panorama/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .panorama/config.yaml
//!
//! Provider API keys are read directly from their conventional environment
//! variables by the backends (GEMINI_API_KEY, GROQ_API_KEY, OPENAI_API_KEY,
//! SERPER_API_KEY, GOOGLE_SEARCH_KEY, GOOGLE_CSE_ID); they never live in
//! the config file.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<std::result::Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub resilience: Option<ResilienceConfig>,
    #[serde(default)]
    pub cache: Option<CacheConfig>,
    #[serde(default)]
    pub pipeline: Option<PipelineConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResilienceConfig {
    /// Consecutive failures before a generation provider is disabled
    pub generation_max_failures: Option<u32>,
    /// Consecutive failures before a search provider is disabled
    pub search_max_failures: Option<u32>,
    /// Seconds a disabled provider waits before becoming eligible again
    pub cooldown_seconds: Option<u64>,
    /// Seconds allowed per provider call
    pub provider_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Seconds a cached search result stays valid
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    /// Concurrent re-entries allowed per session/key pair
    pub max_recursion_depth: Option<u32>,
}

/// Resolved configuration with all defaults applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub generation_max_failures: u32,
    pub search_max_failures: u32,
    pub cooldown: Duration,
    pub provider_timeout: Duration,
    pub cache_ttl: Duration,
    pub max_recursion_depth: u32,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            generation_max_failures: 2,
            search_max_failures: 3,
            cooldown: Duration::from_secs(300),
            provider_timeout: Duration::from_secs(60),
            cache_ttl: Duration::from_secs(3600),
            max_recursion_depth: 3,
            config_file: None,
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".panorama").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let defaults = ResolvedConfig::default();
    let config_file = find_config_file();

    let file = match &config_file {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };

    let resilience = file.as_ref().and_then(|f| f.resilience.clone());
    let cache = file.as_ref().and_then(|f| f.cache.clone());
    let pipeline = file.as_ref().and_then(|f| f.pipeline.clone());

    let generation_max_failures = env_u32("PANORAMA_GENERATION_MAX_FAILURES")
        .or(resilience.as_ref().and_then(|r| r.generation_max_failures))
        .unwrap_or(defaults.generation_max_failures);

    let search_max_failures = env_u32("PANORAMA_SEARCH_MAX_FAILURES")
        .or(resilience.as_ref().and_then(|r| r.search_max_failures))
        .unwrap_or(defaults.search_max_failures);

    let cooldown = env_u64("PANORAMA_COOLDOWN_SECONDS")
        .or(resilience.as_ref().and_then(|r| r.cooldown_seconds))
        .map(Duration::from_secs)
        .unwrap_or(defaults.cooldown);

    let provider_timeout = env_u64("PANORAMA_PROVIDER_TIMEOUT_SECONDS")
        .or(resilience.as_ref().and_then(|r| r.provider_timeout_seconds))
        .map(Duration::from_secs)
        .unwrap_or(defaults.provider_timeout);

    let cache_ttl = env_u64("PANORAMA_CACHE_TTL_SECONDS")
        .or(cache.as_ref().and_then(|c| c.ttl_seconds))
        .map(Duration::from_secs)
        .unwrap_or(defaults.cache_ttl);

    let max_recursion_depth = env_u32("PANORAMA_MAX_RECURSION_DEPTH")
        .or(pipeline.as_ref().and_then(|p| p.max_recursion_depth))
        .unwrap_or(defaults.max_recursion_depth);

    Ok(ResolvedConfig {
        generation_max_failures,
        search_max_failures,
        cooldown,
        provider_timeout,
        cache_ttl,
        max_recursion_depth,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ResolvedConfig::default();
        assert_eq!(config.generation_max_failures, 2);
        assert_eq!(config.search_max_failures, 3);
        assert_eq!(config.cooldown, Duration::from_secs(300));
        assert_eq!(config.provider_timeout, Duration::from_secs(60));
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.max_recursion_depth, 3);
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let panorama_dir = temp.path().join(".panorama");
        std::fs::create_dir_all(&panorama_dir).unwrap();

        let config_path = panorama_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
resilience:
  generation_max_failures: 5
  cooldown_seconds: 120
cache:
  ttl_seconds: 600
pipeline:
  max_recursion_depth: 2
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        let resilience = config.resilience.unwrap();
        assert_eq!(resilience.generation_max_failures, Some(5));
        assert_eq!(resilience.cooldown_seconds, Some(120));
        assert_eq!(resilience.search_max_failures, None);
        assert_eq!(config.cache.unwrap().ttl_seconds, Some(600));
        assert_eq!(config.pipeline.unwrap().max_recursion_depth, Some(2));
    }
}
