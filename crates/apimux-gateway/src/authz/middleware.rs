//! Authorization middleware
//!
//! Runs the decision engine against the context attached by
//! authentication. Denials answer with a generic 403 carrying no
//! internal detail; the decision itself is recorded on the response for
//! the audit layer.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use apimux_core::{AuthorizationContext, Decision};

use super::AuthorizationDecisionEngine;

/// What the engine decided for one request.
///
/// Inserted into the response extensions so the audit layer can see the
/// outcome without re-deriving it.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub decision: Decision,
    pub path: String,
    pub method: String,
    pub principal_kind: &'static str,
    pub team_id: Option<String>,
}

/// Authorization middleware.
pub async fn authorization_middleware(
    State(engine): State<Arc<AuthorizationDecisionEngine>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // CORS preflights carry no credentials and are never authorized
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let Some(mut ctx) = request.extensions_mut().remove::<AuthorizationContext>() else {
        warn!(
            "[Authz] {} {} reached authorization without a context, denying",
            request.method(),
            request.uri().path()
        );
        return forbidden_response();
    };

    let decision = engine.authorize(&mut ctx).await;
    let outcome = DecisionOutcome {
        decision,
        path: ctx.path.clone(),
        method: ctx.method.clone(),
        principal_kind: ctx.principal.kind(),
        team_id: ctx.team_id.clone(),
    };

    match decision {
        Decision::Allow => {
            request.extensions_mut().insert(ctx);
            let mut response = next.run(request).await;
            response.extensions_mut().insert(outcome);
            response
        }
        Decision::Deny => {
            let mut response = forbidden_response();
            response.extensions_mut().insert(outcome);
            response
        }
    }
}

/// Generic 403; denial reasons stay in the logs, never in the body.
fn forbidden_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({ "error": "forbidden" })),
    )
        .into_response()
}
