//! Command-line interface for panorama.
//!
//! Provides commands for running analyses, inspecting sessions and
//! provider health, pausing and resuming runs, and operator recovery.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config;
use crate::core::Orchestrator;
use crate::domain::AnalysisRequest;

/// panorama - Resilient multi-provider market analysis orchestrator
#[derive(Parser, Debug)]
#[command(name = "panorama")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full analysis pipeline
    Analyze {
        /// Business segment (e.g. "fitness")
        segment: String,

        /// Product or service (e.g. "coaching app")
        product: String,

        /// Target audience description
        #[arg(short, long)]
        audience: Option<String>,

        /// Strategic objectives
        #[arg(short, long)]
        objectives: Option<String>,

        /// Explicit research query (derived from segment/product if absent)
        #[arg(short, long)]
        query: Option<String>,

        /// Use a specific session id instead of a generated one
        #[arg(long)]
        session_id: Option<String>,

        /// Print the raw outcome JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show the state of a session
    Status {
        /// Session ID
        session_id: String,
    },

    /// Show progress of a session
    Progress {
        /// Session ID
        session_id: String,
    },

    /// List known sessions
    Sessions,

    /// Pause a running session
    Pause {
        /// Session ID
        session_id: String,
    },

    /// Resume a paused session
    Resume {
        /// Session ID
        session_id: String,
    },

    /// Show provider health and breaker state
    Providers,

    /// List services and their operation tables
    Capabilities,

    /// Drop all sessions, breaker state, and cached results; with
    /// --provider, only clear that provider's breaker
    Reset {
        /// Reset a single provider's error counters instead of everything
        #[arg(long)]
        provider: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;
        let orchestrator = Orchestrator::from_env(cfg);

        match self.command {
            Commands::Analyze {
                segment,
                product,
                audience,
                objectives,
                query,
                session_id,
                json,
            } => {
                run_analysis(
                    &orchestrator,
                    segment,
                    product,
                    audience,
                    objectives,
                    query,
                    session_id,
                    json,
                )
                .await
            }
            Commands::Status { session_id } => show_status(&orchestrator, &session_id),
            Commands::Progress { session_id } => show_progress(&orchestrator, &session_id),
            Commands::Sessions => list_sessions(&orchestrator),
            Commands::Pause { session_id } => {
                orchestrator.pause(&session_id)?;
                println!("Session {} paused", session_id);
                Ok(())
            }
            Commands::Resume { session_id } => {
                orchestrator.resume(&session_id)?;
                println!("Session {} resumed", session_id);
                Ok(())
            }
            Commands::Providers => show_providers(&orchestrator),
            Commands::Capabilities => show_capabilities(&orchestrator),
            Commands::Reset { provider } => {
                match provider {
                    Some(name) => {
                        orchestrator.reset_provider_errors(Some(&name));
                        println!("Breaker state cleared for provider {}", name);
                    }
                    None => {
                        orchestrator.emergency_reset();
                        println!("All sessions, breaker state, and cached results dropped");
                    }
                }
                Ok(())
            }
            Commands::Config => show_config(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_analysis(
    orchestrator: &Orchestrator,
    segment: String,
    product: String,
    audience: Option<String>,
    objectives: Option<String>,
    query: Option<String>,
    session_id: Option<String>,
    json: bool,
) -> Result<()> {
    let mut request = AnalysisRequest::new(segment, product);
    request.target_audience = audience;
    request.objectives = objectives;
    request.query = query;
    if let Some(id) = session_id {
        request.session_id = id;
    }

    let progress: crate::core::ProgressCallback = Arc::new(|p| {
        eprintln!("[{:>5.1}%] {}", p.percentage, p.current_step);
    });

    let outcome = orchestrator.analyze(request, Some(progress)).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
        );
        return Ok(());
    }

    if outcome.success {
        println!("Analysis completed in {:.1}s", outcome.elapsed_seconds);
        println!("Session: {}", outcome.session_id);
        if outcome.is_degraded() {
            println!(
                "Degraded: {} stage(s) used fallback data",
                outcome.data_validation.fallbacks_used
            );
        }
        println!("\nStages:");
        for (name, result) in &outcome.stage_results {
            let provider = result.source_provider.as_deref().unwrap_or("-");
            println!("  {:<16} {:?} (provider: {})", name, result.status, provider);
        }
        println!(
            "\n{}",
            serde_json::to_string_pretty(&outcome.report)
                .context("Failed to serialize report")?
        );
    } else {
        eprintln!(
            "Analysis failed after {:.1}s: {}",
            outcome.elapsed_seconds,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
        if !outcome.stage_results.is_empty() {
            eprintln!("Partial stage data for {} stage(s) retained", outcome.stage_results.len());
        }
        std::process::exit(1);
    }

    Ok(())
}

fn show_status(orchestrator: &Orchestrator, session_id: &str) -> Result<()> {
    let state = orchestrator
        .session(session_id)
        .ok_or_else(|| anyhow::anyhow!("Session not found: {}", session_id))?;

    println!("Session ID: {}", state.session_id);
    println!("Status: {:?}", state.status);
    println!("Segment: {}", state.request.segment);
    println!("Product: {}", state.request.product);
    println!("Started: {}", state.started_at);
    if let Some(completed) = state.completed_at {
        println!("Completed: {}", completed);
    }
    println!(
        "Stages: {}/{} completed",
        state.stages_completed, state.total_stages
    );
    if let Some(stage) = &state.current_stage {
        println!("Current stage: {}", stage);
    }
    if let Some(error) = &state.error {
        println!("Error: {}", error);
    }

    Ok(())
}

fn show_progress(orchestrator: &Orchestrator, session_id: &str) -> Result<()> {
    let progress = orchestrator.progress(session_id)?;
    println!(
        "{:.1}% ({}) - {} steps total",
        progress.percentage, progress.current_step, progress.total_steps
    );
    Ok(())
}

fn list_sessions(orchestrator: &Orchestrator) -> Result<()> {
    let ids = orchestrator.session_ids();
    if ids.is_empty() {
        println!("No sessions found");
        return Ok(());
    }

    println!("{:<38} {:<12} {:<10}", "SESSION ID", "STATUS", "STAGES");
    println!("{}", "-".repeat(62));
    for id in ids {
        if let Some(state) = orchestrator.session(&id) {
            println!(
                "{:<38} {:<12} {}/{}",
                state.session_id,
                format!("{:?}", state.status).to_lowercase(),
                state.stages_completed,
                state.total_stages
            );
        }
    }

    Ok(())
}

fn show_providers(orchestrator: &Orchestrator) -> Result<()> {
    let status = orchestrator.provider_status();
    if status.is_empty() {
        println!("No providers configured. Set API keys in the environment.");
        return Ok(());
    }

    println!(
        "{:<14} {:<12} {:<10} {:<10} {:<10} {:<10}",
        "PROVIDER", "GROUP", "PRIORITY", "AVAILABLE", "FAILURES", "COOLDOWN"
    );
    println!("{}", "-".repeat(70));
    for p in status {
        println!(
            "{:<14} {:<12} {:<10} {:<10} {:<10} {}s",
            p.name,
            p.group,
            p.priority,
            p.available,
            format!("{}/{}", p.consecutive_failures, p.max_failures),
            p.cooldown_remaining_secs
        );
    }

    Ok(())
}

fn show_capabilities(orchestrator: &Orchestrator) -> Result<()> {
    for (service, operations) in orchestrator.capabilities() {
        println!("{}:", service);
        for op in operations {
            println!("  - {}", op);
        }
    }
    Ok(())
}

fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("Panorama Configuration");
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Resilience:");
    println!("  Generation max failures: {}", cfg.generation_max_failures);
    println!("  Search max failures:     {}", cfg.search_max_failures);
    println!("  Cooldown:                {}s", cfg.cooldown.as_secs());
    println!("  Provider timeout:        {}s", cfg.provider_timeout.as_secs());
    println!();
    println!("Cache:");
    println!("  TTL: {}s", cfg.cache_ttl.as_secs());
    println!();
    println!("Pipeline:");
    println!("  Max recursion depth: {}", cfg.max_recursion_depth);

    Ok(())
}
