//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, instrument, warn};

use formlens_config::GatewayConfig;
use formlens_core::OcrProvider;
use formlens_media::UploadValidator;
use formlens_understanding::HeaderEnricher;

use crate::analyze::analyze_document;
use crate::archive::ResponseArchiver;
use crate::error_response::{handle_panic, method_not_allowed, not_found};
use crate::health_api::get_health;
use crate::vision_context::analyze_vision_context;

/// Application state shared across routes. Immutable after startup.
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub validator: UploadValidator,
    pub ocr: Arc<dyn OcrProvider>,
    /// `None` when no multimodal API key is configured.
    pub enricher: Option<HeaderEnricher>,
    pub archiver: ResponseArchiver,
}

impl AppState {
    pub fn new(
        config: Arc<GatewayConfig>,
        ocr: Arc<dyn OcrProvider>,
        enricher: Option<HeaderEnricher>,
    ) -> Self {
        let validator = UploadValidator::new(
            config.upload.allowed_extensions.clone(),
            config.upload.allowed_mime_types.clone(),
        );
        let archiver = ResponseArchiver::from_config(&config.archive);
        Self {
            config,
            validator,
            ocr,
            enricher,
            archiver,
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.config.upload.max_file_size
    }
}

/// Build the Axum router with all routes and layers.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.max_file_size()).unwrap_or(usize::MAX);
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(get_health))
        .route("/api/analyze", post(analyze_document))
        .route("/api/analyze-vision-context", post(analyze_vision_context))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(method_not_allowed))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `*` allows any origin; unparseable origins are dropped with a warning.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}

/// Starts the Axum HTTP server and runs until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Gateway HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
