use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    response::Response,
    routing::get,
    Router,
};
use casecraft_db::SharedStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod static_files;

pub use error::StaticError;
pub use static_files::StaticFiles;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Image metadata store, connected and migrated before the server starts
    pub store: SharedStore,
    pub assets: Arc<StaticFiles>,
}

impl AppContext {
    pub fn new(config: Config, store: SharedStore) -> Self {
        let assets = Arc::new(StaticFiles::from_config(&config.server));
        Self {
            config: Arc::new(config),
            store,
            assets,
        }
    }
}

/// Create the Axum router. Every `GET` is a static asset lookup; other
/// methods are answered with 405 by the router.
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(serve_static))
        .route("/{*path}", get(serve_static))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn serve_static(
    State(ctx): State<AppContext>,
    req: Request,
) -> Result<Response, StaticError> {
    Ok(ctx.assets.serve(req).await?)
}

/// Start the HTTP server and run until Ctrl+C or SIGTERM
pub async fn start_server(ctx: AppContext) -> Result<()> {
    let server = &ctx.config.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .context("Invalid server address")?;

    tracing::info!(
        "Serving static files from {:?} ({} store)",
        ctx.assets.root(),
        ctx.store.backend_name()
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to listen on {}", addr))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, create_router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

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
