// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Aegis CLI.

use aegis_core::history::{HistoryStoreRef, InMemoryHistory, SqliteHistory};
use aegis_core::{
    emitter_from_config, load_config, AegisConfig, HistoryBackend, PipelineRunner,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aegis")]
#[command(version, about = "Aegis — the QA control plane", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to .aegis.yaml (default: walk up from the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show all registered services and their health status
    Status {
        /// Per-service health check timeout in seconds
        #[arg(long, default_value = "5")]
        timeout: f64,
    },

    /// Execute a named workflow pipeline
    Run {
        /// Name of the workflow to execute
        workflow: String,

        /// Print the full result as JSON instead of the step summary
        #[arg(long)]
        json: bool,
    },

    /// List configured workflows and their step chains
    Workflows,

    /// Show recent execution history
    History {
        /// Maximum records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Restrict to one workflow
        #[arg(short, long)]
        workflow: Option<String>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("aegis={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match run_command(&cli).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{} {e:#}", "Error:".red().bold());
            1
        }
    };

    if result != 0 {
        std::process::exit(result);
    }
}

async fn run_command(cli: &Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match &cli.command {
        Commands::Status { timeout } => {
            show_status(&config, *timeout).await;
            Ok(0)
        }
        Commands::Run { workflow, json } => run_workflow(config, workflow, *json).await,
        Commands::Workflows => {
            show_workflows(&config);
            Ok(0)
        }
        Commands::History { limit, workflow } => {
            show_history(&config, *limit, workflow.as_deref()).await?;
            Ok(0)
        }
        Commands::Config { action } => match action {
            ConfigCommands::Show => {
                show_config(&config);
                Ok(0)
            }
        },
    }
}

/// Build the history backend named by the config.
async fn history_from_config(config: &AegisConfig) -> Result<HistoryStoreRef> {
    match config.history.backend {
        HistoryBackend::Memory => Ok(Arc::new(InMemoryHistory::new())),
        HistoryBackend::Sqlite => {
            let store = SqliteHistory::connect(&config.history.db_path, config.history.max_records)
                .await
                .with_context(|| {
                    format!("Failed to open history database: {}", config.history.db_path)
                })?;
            Ok(Arc::new(store))
        }
    }
}

async fn show_status(config: &AegisConfig, timeout: f64) {
    let registry = aegis_core::ServiceRegistry::new(config);
    let statuses = registry.statuses(Duration::from_secs_f64(timeout)).await;

    if statuses.is_empty() {
        println!("{}", "No services configured.".yellow());
        return;
    }

    println!("{}", "Aegis Service Status".cyan().bold());
    for status in statuses {
        let label = status.status_label();
        let colored_label = match label {
            "healthy" => label.green(),
            "unreachable" => label.yellow(),
            "unknown" => label.dimmed(),
            _ => label.red(),
        };

        let latency = status
            .health
            .as_ref()
            .filter(|h| h.latency_ms > 0.0)
            .map(|h| format!("{:.0}ms", h.latency_ms))
            .unwrap_or_else(|| "—".to_string());

        println!(
            "  {} {} [{}] {}",
            status.name.bold(),
            status.url,
            colored_label,
            latency.dimmed()
        );
    }
}

async fn run_workflow(config: AegisConfig, workflow: &str, json: bool) -> Result<i32> {
    if !config.workflows.contains_key(workflow) {
        let available: Vec<&str> = config.workflows.keys().map(String::as_str).collect();
        eprintln!("{} Unknown workflow: {workflow}", "Error:".red().bold());
        eprintln!(
            "Available: {}",
            if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            }
        );
        return Ok(1);
    }

    info!(workflow, "Running workflow");
    let history = history_from_config(&config).await?;
    let mut runner = PipelineRunner::new(config.clone()).with_history(history);
    if let Some(emitter) = emitter_from_config(&config) {
        runner = runner.with_emitter(emitter);
    }

    let result = runner.run(workflow).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to encode result")?
        );
        return Ok(if result.success() { 0 } else { 1 });
    }

    println!("\n{} {}", "Workflow:".bold(), result.workflow_name);
    for step in &result.steps {
        let icon = if step.skipped {
            "⊘".dimmed()
        } else if step.success {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("  {} {} ({})", icon, step.step_type, step.service);
        if let Some(error) = &step.error {
            println!("    {}", error.red());
        }
        if step.skipped {
            if let Some(message) = step.data.get("message").and_then(|m| m.as_str()) {
                println!("    {}", message.dimmed());
            }
        }
    }

    if result.success() {
        println!("\n{}", "Pipeline completed successfully.".green().bold());
        Ok(0)
    } else {
        println!("\n{}", "Pipeline completed with errors.".red().bold());
        Ok(1)
    }
}

fn show_workflows(config: &AegisConfig) {
    if config.workflows.is_empty() {
        println!("{}", "No workflows configured.".yellow());
        return;
    }

    println!("{}", "Workflows".cyan().bold());
    let mut names: Vec<&String> = config.workflows.keys().collect();
    names.sort();
    for key in names {
        let workflow = &config.workflows[key];
        let chain: Vec<&str> = workflow.steps.iter().map(|s| s.step_type.as_str()).collect();
        println!("  {}: {} [{}]", key.bold(), workflow.name, chain.join(" → "));
    }
}

async fn show_history(config: &AegisConfig, limit: usize, workflow: Option<&str>) -> Result<()> {
    let history = history_from_config(config).await?;

    let records = match workflow {
        Some(name) => {
            let mut records = history.get_history(name).await?;
            records.truncate(limit);
            records
        }
        None => history.get_recent(limit).await?,
    };

    if records.is_empty() {
        println!("{}", "No execution history.".yellow());
        return Ok(());
    }

    println!("{}", "Execution History".cyan().bold());
    for record in records {
        let outcome = if record.success {
            "ok".green()
        } else {
            "failed".red()
        };
        let duration = record
            .duration_ms()
            .map(|d| format!("{d:.0}ms"))
            .unwrap_or_else(|| "—".to_string());
        println!(
            "  {} {} [{}] {} steps, {}",
            record.started_at.format("%Y-%m-%d %H:%M:%S"),
            record.workflow_name.bold(),
            outcome,
            record.steps.len(),
            duration.dimmed()
        );
    }
    Ok(())
}

fn show_config(config: &AegisConfig) {
    println!(
        "{} {} v{}\n",
        "Aegis".bold(),
        config.aegis.name,
        config.aegis.version
    );

    println!("{}", "Services:".bold());
    let mut keys: Vec<&String> = config.services.keys().collect();
    keys.sort();
    for key in keys {
        let entry = &config.services[key];
        println!("  {}: {} @ {}", key, entry.name, entry.url);
        if !entry.features.is_empty() {
            println!("    Features: {}", entry.features.join(", "));
        }
    }

    println!("\n{}", "Workflows:".bold());
    let mut names: Vec<&String> = config.workflows.keys().collect();
    names.sort();
    for key in names {
        let workflow = &config.workflows[key];
        let chain: Vec<&str> = workflow.steps.iter().map(|s| s.step_type.as_str()).collect();
        println!("  {}: {} [{}]", key, workflow.name, chain.join(" → "));
    }

    println!(
        "\n{} backend={:?} path={} max_records={}",
        "History:".bold(),
        config.history.backend,
        config.history.db_path,
        config.history.max_records
    );

    if !config.webhooks.is_empty() {
        println!("\n{}", "Webhooks:".bold());
        for webhook in &config.webhooks {
            let signed = if webhook.secret.is_empty() {
                "unsigned"
            } else {
                "signed"
            };
            println!(
                "  {} [{}] ({})",
                webhook.url,
                webhook.events.join(", "),
                signed
            );
        }
    }
}
