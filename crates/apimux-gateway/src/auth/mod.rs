//! Caller authentication for the gateway
//!
//! Establishes the request principal before authorization runs: decodes
//! HMAC-signed bearer tokens into claims and validates `x-api-key`
//! credentials on proxied paths. Authentication never decides access;
//! it only says who is calling.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use apimux_core::{branding, ApiKeyRecord, ApiKeyRepository, AuthorizationContext, Claims, Principal};
use apimux_storage::hash_api_key;

use crate::authz::{PathClassifier, WEBHOOK_CALLBACK_MARKER};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the raw API key on proxied paths
pub const API_KEY_HEADER: &str = "x-api-key";

/// Optional header naming the key, logged when it disagrees with the stored name
pub const API_KEY_NAME_HEADER: &str = "x-api-key-name";

/// Header through which a caller asks to act as a specific team
pub const REQUESTED_TEAM_HEADER: &str = "x-team-id";

/// API key prefix; issued keys look like `amx_<base64url>`
pub const API_KEY_PREFIX: &str = "amx_";

// ============================================================================
// Token decoding (HMAC-signed bearer tokens)
// ============================================================================

/// Turns a presented bearer token into decoded claims.
///
/// `None` covers every rejection: bad format, bad signature, expired.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Option<Claims>;
}

/// Decoder for `base64(payload).base64(signature)` tokens signed with
/// HMAC-SHA256.
pub struct HmacTokenDecoder {
    secret: Zeroizing<Vec<u8>>,
}

impl HmacTokenDecoder {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: Zeroizing::new(secret.to_vec()),
        }
    }
}

impl TokenDecoder for HmacTokenDecoder {
    fn decode(&self, token: &str) -> Option<Claims> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 2 {
            debug!(
                "[Auth] Invalid token format - expected 2 parts, got {}",
                parts.len()
            );
            return None;
        }

        let payload_b64 = parts[0];
        let signature_b64 = parts[1];

        // Verify signature before touching the payload
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(payload_b64.as_bytes());

        let presented_sig = base64_url_decode(signature_b64)?;
        if mac.verify_slice(&presented_sig).is_err() {
            debug!("[Auth] Invalid token signature");
            return None;
        }

        let payload_bytes = base64_url_decode(payload_b64)?;
        let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).ok()?;
        let claims = Claims::from_value(payload);

        // Reject expired tokens; tokens without `exp` do not expire
        if let Some(exp) = claims.expiration() {
            let now = chrono::Utc::now().timestamp();
            if now > exp {
                debug!("[Auth] Token expired at {}, now is {}", exp, now);
                return None;
            }
        }

        Some(claims)
    }
}

/// Sign a claims payload and produce the token string.
///
/// Counterpart of [`HmacTokenDecoder::decode`], used by token issuance
/// tooling and tests.
pub fn sign_claims(claims: &serde_json::Value, secret: &[u8]) -> String {
    let payload_b64 = base64_url_encode(claims.to_string().as_bytes());

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signature_b64 = base64_url_encode(&signature);

    format!("{}.{}", payload_b64, signature_b64)
}

/// Base64 URL-safe encoding (no padding)
fn base64_url_encode(data: &[u8]) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    URL_SAFE_NO_PAD.encode(data)
}

/// Base64 URL-safe decoding
fn base64_url_decode(s: &str) -> Option<Vec<u8>> {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    URL_SAFE_NO_PAD.decode(s).ok()
}

// ============================================================================
// API keys
// ============================================================================

/// Freshly generated API key material.
///
/// The raw key is shown to the caller exactly once; storage only ever
/// sees its hash.
#[derive(Debug, Clone)]
pub struct ApiKey {
    /// The raw key string
    pub key: String,
    /// Team this key belongs to
    pub team_id: String,
    /// Optional expiry time
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ApiKey {
    /// Generate a new key for a team
    pub fn generate(team_id: impl Into<String>) -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; 24] = rng.gen();
        let key = format!("{}{}", API_KEY_PREFIX, base64_url_encode(&random_bytes));

        Self {
            key,
            team_id: team_id.into(),
            expires_at: None,
        }
    }

    /// Generate a key with an expiry
    pub fn generate_with_expiry(team_id: impl Into<String>, duration: chrono::Duration) -> Self {
        let mut key = Self::generate(team_id);
        key.expires_at = Some(chrono::Utc::now() + duration);
        key
    }

    /// Check if the key is expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => chrono::Utc::now() >= expires_at,
            None => false,
        }
    }

    /// Validate key format without touching storage
    pub fn is_valid_format(key: &str) -> bool {
        key.starts_with(API_KEY_PREFIX) && key.len() >= 36
    }

    /// Persistable record for this key; the raw material is hashed away
    pub fn into_record(self, name: impl Into<String>) -> ApiKeyRecord {
        let record = ApiKeyRecord::new(self.team_id, name, hash_api_key(&self.key));
        match self.expires_at {
            Some(expires_at) => record.with_expiry(expires_at),
            None => record,
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Why authentication failed, surfaced as 401 detail.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token is invalid or expired")]
    InvalidToken,
    #[error("invalid Authorization header format")]
    MalformedAuthorization,
    #[error("unknown API key")]
    UnknownApiKey,
    #[error("API key is expired or revoked")]
    InactiveApiKey,
    #[error("API key lookup failed")]
    KeyLookup(#[source] anyhow::Error),
}

impl AuthError {
    /// OAuth-style error code for the `WWW-Authenticate` challenge
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidToken => "invalid_token",
            AuthError::MalformedAuthorization => "invalid_request",
            AuthError::UnknownApiKey | AuthError::InactiveApiKey => "invalid_key",
            AuthError::KeyLookup(_) => "server_error",
        }
    }
}

/// Resolves the request principal from headers.
///
/// API keys are honored only on proxied and protocol paths; everything
/// else falls back to bearer tokens, then to [`Principal::Anonymous`].
pub struct Authenticator {
    api_keys: Arc<dyn ApiKeyRepository>,
    decoder: Arc<dyn TokenDecoder>,
}

impl Authenticator {
    pub fn new(api_keys: Arc<dyn ApiKeyRepository>, decoder: Arc<dyn TokenDecoder>) -> Self {
        Self { api_keys, decoder }
    }

    /// Establish the caller's principal for this request.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        path: &str,
    ) -> Result<Principal, AuthError> {
        if api_key_applies(path) {
            if let Some(raw_key) = header_str(headers, API_KEY_HEADER) {
                return self
                    .authenticate_api_key(raw_key, header_str(headers, API_KEY_NAME_HEADER))
                    .await;
            }
        }

        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        match auth_header {
            Some(auth) if auth.starts_with("Bearer ") => {
                let token = &auth[7..];
                match self.decoder.decode(token) {
                    Some(claims) => {
                        debug!(
                            "[Auth] Valid token for subject: {}",
                            claims.subject().unwrap_or("-")
                        );
                        Ok(Principal::Jwt(claims))
                    }
                    None => Err(AuthError::InvalidToken),
                }
            }
            Some(_) => Err(AuthError::MalformedAuthorization),
            None => Ok(Principal::Anonymous),
        }
    }

    async fn authenticate_api_key(
        &self,
        raw_key: &str,
        key_name: Option<&str>,
    ) -> Result<Principal, AuthError> {
        if !ApiKey::is_valid_format(raw_key) {
            warn!("[Auth] API key with invalid format rejected");
            return Err(AuthError::UnknownApiKey);
        }

        let record = self
            .api_keys
            .find_by_key(raw_key)
            .await
            .map_err(AuthError::KeyLookup)?;

        let Some(record) = record else {
            warn!("[Auth] Unknown API key rejected");
            return Err(AuthError::UnknownApiKey);
        };

        if let Some(name) = key_name {
            if name != record.name {
                debug!(
                    "[Auth] Key name header {:?} does not match stored name {:?}",
                    name, record.name
                );
            }
        }

        if !record.is_active() {
            warn!(team_id = %record.team_id, key = %record.name, "[Auth] Expired or revoked API key rejected");
            return Err(AuthError::InactiveApiKey);
        }

        debug!(team_id = %record.team_id, key = %record.name, "[Auth] API key accepted");
        Ok(Principal::ApiKey {
            team_id: record.team_id,
        })
    }
}

/// Whether API-key authentication applies to this path.
///
/// Keys are honored on proxied (`/r/`) and protocol (`/mux`) paths,
/// never on health-suffixed paths or the webhook callback exception.
fn api_key_applies(path: &str) -> bool {
    (path.starts_with(branding::ROUTE_PREFIX) || path.starts_with(branding::PROTOCOL_PREFIX))
        && !PathClassifier::is_health_endpoint(path)
        && !path.contains(WEBHOOK_CALLBACK_MARKER)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Authentication middleware.
///
/// Attaches an [`AuthorizationContext`] to every request. Invalid
/// credentials are rejected with 401 on protected paths only; public and
/// health paths are served as anonymous instead.
pub async fn authentication_middleware(
    State(authenticator): State<Arc<Authenticator>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // Skip auth for OPTIONS (CORS preflight)
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let method = request.method().to_string();

    let principal = match authenticator.authenticate(request.headers(), &path).await {
        Ok(principal) => principal,
        Err(err) => {
            if PathClassifier::is_public(&path) || PathClassifier::is_health_endpoint(&path) {
                debug!("[Auth] Ignoring invalid credentials on open path {}", path);
                Principal::Anonymous
            } else {
                warn!("[Auth] {} {} rejected: {}", method, path, err);
                return unauthorized_response(err.error_code(), &err.to_string());
            }
        }
    };

    let mut ctx = AuthorizationContext::new(path, method, principal);
    if let Principal::ApiKey { team_id } = &ctx.principal {
        // Key credentials fix the team before the engine ever runs
        let team_id = team_id.clone();
        ctx = ctx.with_team(team_id);
    }
    if let Some(requested) = header_str(request.headers(), REQUESTED_TEAM_HEADER) {
        ctx = ctx.with_requested_team(requested);
    }

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

/// Generate a 401 Unauthorized response with a `WWW-Authenticate` challenge.
pub fn unauthorized_response(error: &str, description: &str) -> Response {
    let www_authenticate = format!(
        r#"Bearer realm="ApiMux Gateway", error="{}", error_description="{}""#,
        error, description
    );

    let body = serde_json::json!({
        "error": error,
        "error_description": description,
    });

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, www_authenticate)],
        Json(body),
    )
        .into_response()
}
