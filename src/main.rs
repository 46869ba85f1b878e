//! Caching Proxy - A forwarding HTTP proxy with an in-memory response cache
//!
//! Usage: `caching_proxy [port]`. Everything else is read from the
//! environment, see [`Config::from_env`].

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caching_proxy::api::{create_router, AppState};
use caching_proxy::{CacheStore, Config, Dispatcher};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables and the CLI port
/// 3. Create the shared cache store
/// 4. Start the admin API, if enabled
/// 5. Run the proxy accept loop until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caching_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting caching proxy");

    let config = Config::from_env().with_args(std::env::args().skip(1))?;
    config.validate()?;
    info!(
        "Configuration loaded: port={}, admin_port={}, cache_size={}, object_size={}, slots={}",
        config.proxy_port,
        config.admin_port,
        config.max_cache_size,
        config.max_object_size,
        config.cache_capacity()
    );

    let cache = Arc::new(CacheStore::from_config(&config));

    let admin_handle = if config.admin_port != 0 {
        Some(spawn_admin(config.admin_port, Arc::clone(&cache)).await?)
    } else {
        None
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.proxy_port));
    let dispatcher = Dispatcher::bind(addr, cache).await?;
    info!("Proxy listening on {}", dispatcher.local_addr()?);

    tokio::select! {
        _ = dispatcher.run() => {}
        _ = shutdown_signal() => {}
    }

    if let Some(handle) = admin_handle {
        handle.abort();
        warn!("Admin API aborted");
    }
    info!("Proxy shutdown complete");
    Ok(())
}

/// Binds the admin API and serves it on a background task.
async fn spawn_admin(port: u16, cache: Arc<CacheStore>) -> anyhow::Result<JoinHandle<()>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Admin API listening on http://{}", addr);

    let app = create_router(AppState::new(cache));
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Admin API stopped: {}", e);
        }
    }))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// Workers still in flight are not waited for.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
}
