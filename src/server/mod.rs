use crate::config::Config;
use crate::metadata::{Engine, ProviderRegistry};
use crate::watch;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes_comicinfo;
pub mod routes_debug;
pub mod routes_providers;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub registry: Arc<ProviderRegistry>,
    pub engine: Engine,
    pub config: Arc<Config>,
}

impl AppContext {
    /// Build a context with an empty registry and an engine configured from
    /// `config`.
    pub fn new(config: Config) -> Result<Self> {
        let engine = Engine::new(config.providers.engine_config())
            .context("Failed to create provider engine")?;
        let registry = Arc::new(ProviderRegistry::new(config.providers.extensions.clone()));
        Ok(Self {
            registry,
            engine,
            config: Arc::new(config),
        })
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .merge(routes_providers::provider_routes())
        .merge(routes_comicinfo::comicinfo_routes())
        .merge(routes_debug::debug_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Bulk-load providers, start the watcher and serve until Ctrl-C/SIGTERM.
pub async fn start_server(ctx: AppContext) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    serve(listener, ctx, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// Providers are bulk-loaded from the configured directories first. The
/// provider watcher, when enabled, is stopped once the server has drained.
pub async fn serve<F>(listener: TcpListener, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let dirs = ctx.config.providers.dirs.clone();
    ctx.registry.load_dirs(&dirs);

    let cancel = CancellationToken::new();
    let watcher = if ctx.config.watch.enabled {
        Some(tokio::spawn(watch::run_watcher(
            Arc::clone(&ctx.registry),
            dirs,
            cancel.clone(),
        )))
    } else {
        tracing::info!("Provider watcher is disabled");
        None
    };

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", listener.local_addr()?);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    cancel.cancel();
    if let Some(handle) = watcher {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "provider watcher task failed");
        }
    }

    result.context("Server error")?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
