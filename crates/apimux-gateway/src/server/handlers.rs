//! Gateway HTTP handlers
//!
//! The gateway's own endpoints: liveness and the upstream hand-off
//! fallback. Everything else is decided by the middleware stack before
//! a request lands here.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use apimux_core::AuthorizationContext;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Fallback for requests the pipeline allowed through.
///
/// Forwarding to upstream services lives outside this crate, so an
/// authorized request that reaches the end of the stack answers 502.
/// That keeps "allowed but not forwarded" distinguishable from a
/// denial.
pub async fn upstream_handoff(request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();

    match request.extensions().get::<AuthorizationContext>() {
        Some(ctx) => debug!(
            "[Gateway] No upstream attached for {} {} (team: {})",
            ctx.method,
            ctx.path,
            ctx.team_id.as_deref().unwrap_or("-")
        ),
        None => debug!("[Gateway] No upstream attached for {}", path),
    }

    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": "upstream_unavailable",
            "message": "no upstream service is attached to this route",
        })),
    )
        .into_response()
}
