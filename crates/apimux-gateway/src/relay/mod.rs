//! Token relay
//!
//! Swaps the caller's bearer token for a gateway service token before
//! the request continues downstream. The caller's token survives in a
//! side header so upstream services can still see who called. Relay
//! failure never fails a request; it degrades to forwarding the
//! caller's token untouched.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::oauth::ServiceTokenProvider;

/// Side header carrying the caller's original token downstream
pub const USER_TOKEN_HEADER: &str = "x-user-token";

/// Infrastructure paths the relay never touches
const RELAY_SKIP_PREFIXES: [&str; 2] = ["/health", "/favicon"];

/// Marker recording that the relay already ran for this request
#[derive(Debug, Clone, Copy)]
struct RelayProcessed;

/// Rewrites the `Authorization` header with a service token.
pub struct TokenRelayAgent {
    provider: Arc<dyn ServiceTokenProvider>,
}

impl TokenRelayAgent {
    pub fn new(provider: Arc<dyn ServiceTokenProvider>) -> Self {
        Self { provider }
    }

    /// Apply the relay to one request. Runs at most once per request
    /// even if the layer re-enters.
    pub async fn relay(&self, mut request: Request<Body>) -> Request<Body> {
        if Self::skip(request.uri().path()) {
            return request;
        }

        if request.extensions().get::<RelayProcessed>().is_some() {
            return request;
        }
        request.extensions_mut().insert(RelayProcessed);

        let user_token = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        match self.provider.acquire_service_token().await {
            Ok(token) => match HeaderValue::from_str(&token.authorization_header()) {
                Ok(value) => {
                    debug!("[Relay] Authorization rewritten with service token");
                    request.headers_mut().insert(header::AUTHORIZATION, value);
                }
                Err(e) => {
                    warn!("[Relay] Service token is not a valid header value: {}", e);
                }
            },
            Err(e) => {
                warn!(
                    "[Relay] Service token acquisition failed, forwarding caller token: {:#}",
                    e
                );
            }
        }

        // The side header is attached whether or not acquisition worked
        if let Some(user_token) = user_token {
            let stripped = user_token.strip_prefix("Bearer ").unwrap_or(&user_token);
            if let Ok(value) = HeaderValue::from_str(stripped) {
                request.headers_mut().insert(USER_TOKEN_HEADER, value);
            }
        }

        request
    }

    fn skip(path: &str) -> bool {
        RELAY_SKIP_PREFIXES.iter().any(|p| path.starts_with(p))
    }
}

/// Relay middleware: rewrite credentials, then continue the stack.
pub async fn relay_middleware(
    State(agent): State<Arc<TokenRelayAgent>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let request = agent.relay(request).await;
    next.run(request).await
}
