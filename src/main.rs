mod app;
mod commands;
mod ui;

use agentprobe::{AgentRegistry, Config, CredentialSources, RegistryStorage};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE: &str = "agentprobe.log";

/// agentprobe - register chat-completion agents and send them test messages
#[derive(Parser, Debug)]
#[command(name = "agentprobe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ~/.config/agentprobe/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Registry file, overriding the configured location
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Run a single command instead of the interactive UI
    #[command(subcommand)]
    command: Option<commands::Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up file-based logging; the terminal belongs to the UI
    let log_path = std::env::temp_dir().join(LOG_FILE);
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(fmt::layer().with_writer(log_file).with_ansi(false))
        .init();

    // Load .env files (local first, then home directory)
    // Errors are ignored - files are optional
    let _ = dotenvy::from_filename(".env");
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".env"));
    }

    let args = Args::parse();

    // Load configuration
    let mut config = match args.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Apply CLI overrides
    if let Some(registry) = args.registry {
        config.registry.path = Some(registry);
    }

    // A corrupt registry is fatal here rather than silently replaced
    let registry = AgentRegistry::load(RegistryStorage::with_path(config.registry_path()))?;

    // The ambient token is read exactly once
    let credentials = CredentialSources::from_env(&config.auth.token_env);

    match args.command {
        Some(command) => commands::run(command, registry, credentials).await,
        None => {
            let mut app = app::App::new(config, registry, credentials)?;
            app.run().await
        }
    }
}
