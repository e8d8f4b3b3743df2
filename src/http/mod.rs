//! HTTP boundary: versioned webhook endpoints and health check.

mod extract;

use axum::extract::{DefaultBodyLimit, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::adapters::RawPayload;
use crate::config::ServerConfig;
use crate::error::Error;
use crate::pipeline::InboundPipeline;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: InboundPipeline,
}

/// Build the Axum router with one webhook route per configured API version.
pub fn email_routes(pipeline: InboundPipeline, server: &ServerConfig) -> Router {
    let state = AppState { pipeline };

    let mut router = Router::new().route("/health", get(health));
    for path in server.endpoint_paths() {
        router = router.route(&path, post(receive_email));
    }

    router
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mailhook"
    }))
}

// ── Webhook ─────────────────────────────────────────────────────────────

async fn receive_email(
    State(state): State<AppState>,
    payload: RawPayload,
) -> Result<impl IntoResponse, Error> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("inbound_email", %request_id);

    state.pipeline.handle(payload).instrument(span).await?;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}
