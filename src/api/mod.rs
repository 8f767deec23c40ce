//! HTTP service: routing, shared state and the server loop.

pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::ImageError;
use crate::ports::{ImageGenerator, PromptAnalyzer};
use crate::templates::{Quality, TemplateStore};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Loaded templates.
    pub templates: Arc<TemplateStore>,
    /// Image generator port.
    pub generator: Arc<dyn ImageGenerator>,
    /// Model used when a request names none.
    pub default_model: String,
    /// Tier used when a request names none.
    pub default_quality: Quality,
    /// Text model behind `/enhance?mode=llm`, when one is configured.
    pub analyzer: Option<Arc<dyn PromptAnalyzer>>,
}

impl AppState {
    /// State with the `flash` model and `detailed` tier as defaults and no
    /// text model.
    pub fn new(templates: Arc<TemplateStore>, generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            templates,
            generator,
            default_model: "flash".to_string(),
            default_quality: Quality::default(),
            analyzer: None,
        }
    }
}

/// Build the router with tracing and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/generate", post(handlers::generate))
        .route("/classify", post(handlers::classify))
        .route("/enhance", post(handlers::enhance))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), ImageError> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
