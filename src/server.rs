//! HTTP surface: the conversion endpoint, its CORS preflight and a health
//! probe, all behind the same CORS response headers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::signal;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::ServeArgs;
use crate::engine::{FlowEngine, Renderer};
use crate::error::{ConvertError, RenderError};
use crate::handler::{self, ALLOW_HEADERS, ALLOW_METHODS, ALLOW_ORIGIN};

pub const CONVERT_PATH: &str = "/api/convert_to_pdf";
pub const HEALTH_PATH: &str = "/health";

/// Shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(FlowEngine::default()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Build the application router.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(CONVERT_PATH, post(convert_to_pdf).options(preflight))
        .route(HEALTH_PATH, get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .with_state(state)
}

async fn convert_to_pdf(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    log::info!("HTML to PDF conversion function triggered");
    let renderer = Arc::clone(&state.renderer);
    let joined = tokio::task::spawn_blocking(move || {
        let body = (!body.is_empty()).then_some(&body[..]);
        handler::handle_request(renderer.as_ref(), body)
    })
    .await;

    let (status, response) = match joined {
        Ok(outcome) => outcome,
        Err(e) => {
            let err = ConvertError::Render(RenderError::new(format!("render task failed: {e}")));
            handler::failure(&err)
        }
    };
    (status, Json(response))
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Bind and serve until Ctrl+C / SIGTERM.
pub async fn serve(args: &ServeArgs, state: AppState) -> std::io::Result<()> {
    let app = router(state, args.max_body_bytes);
    let listener = tokio::net::TcpListener::bind(args.bind_address()).await?;
    log::info!(
        "Listening on http://{} (POST {CONVERT_PATH})",
        listener.local_addr()?
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {e}");
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
                log::error!("failed to install SIGTERM handler: {e}");
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
    log::info!("Shutdown signal received");
}
