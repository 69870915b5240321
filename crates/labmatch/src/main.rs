//! labmatch server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use labmatch::api::{AppState, create_router};
use labmatch::auth::{AuthConfig, AuthState, TokenIssuer};
use labmatch::db::Database;

/// Research collaboration platform backend.
#[derive(Debug, Parser)]
#[command(name = "labmatch", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "labmatch.toml")]
    config: PathBuf,

    /// Listen address (overrides config).
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Database path (overrides config).
    #[arg(long)]
    database: Option<PathBuf>,
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct ServerConfig {
    /// Listen address.
    listen: SocketAddr,

    /// SQLite database path.
    database: PathBuf,

    /// Authentication configuration.
    auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".parse().expect("valid default address"),
            database: PathBuf::from("labmatch.db"),
            auth: AuthConfig::default(),
        }
    }
}

/// Load configuration from the config file (optional) with environment
/// overrides (`LABMATCH_AUTH__ACCESS_SECRET=...` etc).
fn load_config(path: &PathBuf) -> Result<ServerConfig> {
    let config = Config::builder()
        .add_source(
            File::from(path.clone())
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(Environment::with_prefix("LABMATCH").separator("__"))
        .build()
        .context("building configuration")?;

    config
        .try_deserialize()
        .context("deserializing configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(database) = cli.database {
        config.database = database;
    }

    // Fail fast on a misconfigured auth core: secrets must resolve, be long
    // enough, and be distinct.
    config
        .auth
        .validate()
        .context("validating auth configuration")?;

    let issuer = TokenIssuer::from_config(&config.auth)?;
    let auth_state = AuthState::new(issuer);

    info!("Database path: {}", config.database.display());
    let database = Database::new(&config.database).await?;

    let state = AppState::new(&database, auth_state);
    let router = create_router(state);

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding to {}", config.listen))?;
    info!("Listening on {}", config.listen);

    axum::serve(listener, router).await.context("serving")?;

    Ok(())
}
