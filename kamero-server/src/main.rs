//! Kamero activation server
//!
//! Serves the licensing endpoints the desktop UI calls before letting the
//! stock application run.
//!
//! Usage:
//!   kamero-server --port 3000 --database kamero.db

use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use anyhow::{Context, Result};
use clap::Parser;
use kamero_db::Database;
use kamero_license::{HostFingerprint, LicenseConfig};
use kamero_server::{build_router, AppState};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "kamero-server")]
#[command(about = "Kamero license activation server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "KAMERO_PORT", default_value = "3000")]
    port: u16,

    /// Address to bind
    #[arg(long, env = "KAMERO_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Path to the SQLite database
    #[arg(short, long, env = "KAMERO_DATABASE", default_value = "kamero.db")]
    database: PathBuf,

    /// Days a freshly issued key stays activatable
    #[arg(long, env = "KAMERO_VALIDITY_DAYS", default_value = "2")]
    validity_days: u64,

    /// Enable verbose debug logging
    #[arg(short, long, env = "KAMERO_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Kamero server starting...");
    let db = Database::open(&args.database)
        .with_context(|| format!("Failed to open database {}", args.database.display()))?;
    info!("Database: {}", args.database.display());

    let config = LicenseConfig {
        validity_days: args.validity_days,
    };
    let state = Arc::new(AppState::new(Arc::new(db), config, Arc::new(HostFingerprint)));
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Kamero server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!("Cannot listen for ctrl-c, running until killed: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
