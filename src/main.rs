//! Peercache - A peer-to-peer read-through cache node
//!
//! Starts one cache node: groups backed by a static origin, an HTTP peer
//! pool over the configured cluster, and the peer-facing API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peercache::api::{create_router, AppState};
use peercache::{
    spawn_cleanup_task, spawn_flight_sweeper, Config, GroupRegistry, HttpPool, PeerRouter,
    Retriever, StaticRetriever,
};

/// Main entry point for a cache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Load the origin and create the configured groups
/// 4. Build the peer pool and attach it to every group
/// 5. Start background sweeps
/// 6. Serve the HTTP API until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peercache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting peercache node");

    let config = Config::from_env();
    let policy = config.policy()?;
    info!(
        node = %config.self_addr,
        %policy,
        max_bytes = config.cache_max_bytes,
        peers = ?config.peers,
        groups = ?config.groups,
        "Configuration loaded"
    );

    let origin: Arc<dyn Retriever> = Arc::new(load_origin(&config)?);

    let pool = Arc::new(HttpPool::new(
        config.self_addr.clone(),
        config.ring_replicas,
        config.fetch_timeout(),
    )?);
    pool.set_peers(&config.peers);
    let router: Arc<dyn PeerRouter> = pool;

    let registry = GroupRegistry::new(config.flight_ttl());
    for name in &config.groups {
        let group =
            registry.new_group(name, policy, config.cache_max_bytes, Arc::clone(&origin))?;
        group.register_router(Arc::clone(&router));
    }

    let flight_sweep = config.flight_ttl().max(Duration::from_secs(1));
    let tasks = vec![
        spawn_cleanup_task(registry.clone(), config.cache_ttl(), config.cleanup_interval()),
        spawn_flight_sweeper(registry.clone(), flight_sweep),
    ];
    info!("Background sweeps started");

    let app = create_router(AppState::new(registry, config.self_addr.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(tasks))
        .await
        .context("serving HTTP")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Reads the origin from `ORIGIN_FILE`, or falls back to built-in demo scores.
fn load_origin(config: &Config) -> anyhow::Result<StaticRetriever> {
    match &config.origin_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading origin file {}", path))?;
            let origin = StaticRetriever::from_json(&raw)?;
            info!(path = %path, keys = origin.len(), "origin loaded");
            Ok(origin)
        }
        None => Ok(StaticRetriever::new([
            ("alice", "99.5"),
            ("bob", "87.0"),
            ("carol", "78.25"),
        ])),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts the sweeps.
async fn shutdown_signal(tasks: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for task in tasks {
        task.abort();
    }
    warn!("Background sweeps aborted");
}
