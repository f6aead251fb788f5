mod config;
mod error;
mod handlers;
mod middleware;
mod routes;
mod state;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use conduit_adapters::{CredentialCipher, CredentialCodec};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::load_config;
use crate::routes::create_router;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "conduit", version, about = "Connector call dispatch and metrics service")]
struct Cli {
    /// Path to conduit.toml
    #[arg(long, env = "CONDUIT_CONFIG", default_value = "conduit.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Seal a credential JSON document into a stored instance blob.
    Seal {
        /// Organization that will own the instance.
        #[arg(long)]
        organization: Uuid,

        /// File holding the provider credential JSON object.
        #[arg(long)]
        input: PathBuf,
    },

    /// Print a fresh base64 master key.
    Keygen,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(&cli.config).await?,
        Command::Seal {
            organization,
            input,
        } => run_seal(&cli.config, organization, &input)?,
        Command::Keygen => println!("{}", CredentialCipher::generate_master_key()),
    }

    Ok(())
}

async fn run_serve(config_path: &Path) -> anyhow::Result<()> {
    let cfg = load_config(config_path)?;
    let state = Arc::new(AppState::init(&cfg).await?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.server.bind))?;
    tracing::info!(bind = %cfg.server.bind, "conduit listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("conduit stopped");
    Ok(())
}

fn run_seal(config_path: &Path, organization_id: Uuid, input: &Path) -> anyhow::Result<()> {
    let cfg = load_config(config_path)?;
    let cipher = CredentialCipher::from_base64(&cfg.credentials.resolve_master_key()?)?;

    let raw = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let credentials: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    let sealed = cipher.encode(organization_id, &credentials)?;
    tracing::info!(organization_id = %organization_id, "Credentials sealed");
    println!("{}", sealed);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
