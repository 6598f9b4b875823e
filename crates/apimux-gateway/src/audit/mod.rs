//! Audit events
//!
//! One structured event per request, emitted after the authorization
//! decision and handler have run. Events go to the `audit` log target;
//! routing them to a sink is the subscriber's concern.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tracing::info;

use crate::authz::DecisionOutcome;

/// Static description of the audited operation.
#[derive(Debug, Clone)]
pub struct AuditDescriptor {
    pub event_type: &'static str,
    pub action: &'static str,
    pub resource_type: &'static str,
}

impl Default for AuditDescriptor {
    fn default() -> Self {
        Self {
            event_type: "gateway.request",
            action: "authorize",
            resource_type: "route",
        }
    }
}

/// Audit middleware.
///
/// Reads the [`DecisionOutcome`] the authorization layer records on the
/// response; requests that never reached a decision (preflights,
/// authentication rejections) are audited with what is known.
pub async fn audit_middleware(
    State(descriptor): State<Arc<AuditDescriptor>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = std::time::Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match response.extensions().get::<DecisionOutcome>() {
        Some(outcome) => {
            info!(
                target: "audit",
                event_type = descriptor.event_type,
                action = descriptor.action,
                resource_type = descriptor.resource_type,
                method = %outcome.method,
                path = %outcome.path,
                principal = outcome.principal_kind,
                team_id = outcome.team_id.as_deref().unwrap_or("-"),
                decision = if outcome.decision.is_allow() { "allow" } else { "deny" },
                status,
                elapsed_ms,
                "authorization decision"
            );
        }
        None => {
            info!(
                target: "audit",
                event_type = descriptor.event_type,
                action = descriptor.action,
                resource_type = descriptor.resource_type,
                method = %method,
                path = %path,
                status,
                elapsed_ms,
                "request finished without a decision"
            );
        }
    }

    response
}
