//! OAuth client-credentials manager
//!
//! Fetches and caches the service token the relay swaps in for the
//! caller's token on downstream calls.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};
use url::Url;

use apimux_core::branding;

use super::token::{ServiceToken, TokenResponse};

/// Seconds before expiry at which the cached token is replaced
const REFRESH_BUFFER_SECONDS: i64 = 300;

/// Token endpoint configuration for the client-credentials flow.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    /// Token endpoint URL
    pub token_url: String,
    /// Client id registered for the gateway itself
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Scope requested for service tokens
    pub scope: Option<String>,
    /// Timeout for the token call
    pub timeout: Duration,
}

impl OAuthClientConfig {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Source of service tokens for the relay.
#[async_trait]
pub trait ServiceTokenProvider: Send + Sync {
    async fn acquire_service_token(&self) -> Result<ServiceToken>;
}

/// Client-credentials manager with a cached token.
///
/// The cached token is reused until it falls inside the refresh buffer
/// of its expiry, then replaced. Concurrent refreshes may race and each
/// fetch; last write wins.
pub struct OAuthClientManager {
    config: OAuthClientConfig,
    http_client: reqwest::Client,
    cached: RwLock<Option<ServiceToken>>,
}

impl OAuthClientManager {
    pub fn new(config: OAuthClientConfig) -> Result<Self> {
        Url::parse(&config.token_url)
            .with_context(|| format!("invalid token endpoint URL: {}", config.token_url))?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(branding::user_agent())
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            config,
            http_client,
            cached: RwLock::new(None),
        })
    }

    async fn fetch_token(&self) -> Result<ServiceToken> {
        debug!(
            "[OAuth] Requesting client-credentials token from {}",
            self.config.token_url
        );

        let mut params = HashMap::new();
        params.insert("grant_type", "client_credentials");
        params.insert("client_id", self.config.client_id.as_str());
        params.insert("client_secret", self.config.client_secret.as_str());
        if let Some(scope) = &self.config.scope {
            params.insert("scope", scope.as_str());
        }

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .context("token endpoint unreachable")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("token request failed: HTTP {} - {}", status, body);
        }

        let token_response: TokenResponse =
            response.json().await.context("malformed token response")?;

        info!("[OAuth] Service token acquired");
        Ok(token_response.into())
    }
}

#[async_trait]
impl ServiceTokenProvider for OAuthClientManager {
    async fn acquire_service_token(&self) -> Result<ServiceToken> {
        {
            let cached = self.cached.read();
            if let Some(token) = cached.as_ref() {
                if !token.expires_soon(REFRESH_BUFFER_SECONDS) {
                    return Ok(token.clone());
                }
            }
        }

        let token = self.fetch_token().await?;
        *self.cached.write() = Some(token.clone());
        Ok(token)
    }
}
