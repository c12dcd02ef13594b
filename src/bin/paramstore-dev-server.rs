//! Runs the local development server until interrupted.
//!
//! The port comes from `PARAMSTORE_LOCAL_PORT` (default 10641); log output
//! respects `RUST_LOG`.

use paramstore_config::devserver::DevServer;
use paramstore_config::error::{ConfigError, Result};
use paramstore_config::settings::ResolverSettings;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init();

    let settings = ResolverSettings::from_env("PARAMSTORE")?;
    let server = DevServer::bind(("127.0.0.1", settings.local_port)).await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| ConfigError::Other(format!("Failed to listen for shutdown signal: {}", e)))?;

    server.shutdown().await
}
