use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use secflow::logging::init_tracing;
use secflow::metrics::{init_metrics, set_observability_enabled};
use secflow::router::init_router;
use secflow::state::{AppState, init_app_state};
use secflow_config::AppConfig;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "secflow")]
#[command(about = "SecFlow - bearer token authentication service", long_about = None)]
struct Args {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Skip creating the default admin and user accounts
    #[arg(long)]
    no_seed: bool,
}

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

fn spawn_purge_task(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            state.rate_limiter.purge();
            let evicted = state.tokens.store().evict_expired();
            if evicted > 0 {
                debug!(evicted, "Expired refresh tokens evicted");
            }
        }
    });
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.no_seed {
        config.server.seed_default_users = false;
    }

    let _log_guards = init_tracing(&config.logging);
    set_observability_enabled(config.logging.observability_enabled);
    let metrics_handle = init_metrics();

    let address = config.server.bind_address();
    let state = init_app_state(config).await?;
    spawn_purge_task(state.clone());

    let app = init_router(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!(address = %address, "Server running");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("Server stopped");
    Ok(())
}
