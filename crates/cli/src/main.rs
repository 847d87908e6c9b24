//! FSC Q&A CLI
//!
//! Main entry point for the penalty-case question answering service.
//! Serves the web UI and JSON API, or answers a single question from the
//! terminal.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ServeCommand, StatusCommand};
use fsc_core::{
    config::AppConfig,
    logging::{self, LogFormat},
};
use std::path::PathBuf;
use tracing::Instrument;

/// FSC Q&A - question answering over financial-regulator penalty cases
#[derive(Parser, Debug)]
#[command(name = "fsc-qa")]
#[command(about = "Question answering over FSC penalty cases", long_about = None)]
#[command(version)]
struct Cli {
    /// Package root; relative paths resolve against it (default: current directory)
    #[arg(short, long, global = true, env = "FSC_ROOT")]
    root: Option<PathBuf>,

    /// Path to config file (default: config/gemini_config.yaml under the root)
    #[arg(short, long, global = true, env = "FSC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directives (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format (pretty, json)
    #[arg(long, global = true, default_value = "pretty")]
    log_format: String,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Model identifier
    #[arg(short, long, global = true, env = "FSC_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web UI and JSON API
    Serve(ServeCommand),

    /// Answer one question and print it
    Ask(AskCommand),

    /// Show store status (no network calls)
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up GEMINI_API_KEY and friends from .env before anything reads the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_format = LogFormat::parse(&cli.log_format)
        .with_context(|| format!("Unknown log format '{}'", cli.log_format))?;

    let config = AppConfig::load_from(cli.root, cli.config)
        .context("Failed to load configuration")?
        .with_overrides(cli.model, cli.log_level, cli.verbose, cli.no_color);

    logging::init_logging(config.log_level.as_deref(), config.no_color, log_format)?;

    config.validate().context("Invalid configuration")?;

    tracing::info!("FSC Q&A starting");
    if !config.config_loaded {
        tracing::warn!("No config file at {:?}, using defaults", config.config_path());
    }
    tracing::debug!("Root: {:?}", config.root);
    tracing::debug!("Model: {}", config.generation.model);
    tracing::debug!("Store metadata: {:?}", config.store_info_path());

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
        Commands::Status(_) => "status",
    };
    let span = tracing::info_span!("command", name = command_name);

    let result = async {
        match cli.command {
            Commands::Serve(cmd) => cmd.execute(&config).await,
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Status(cmd) => cmd.execute(&config),
        }
    }
    .instrument(span)
    .await;

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
