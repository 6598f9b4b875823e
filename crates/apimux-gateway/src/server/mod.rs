//! Gateway Server
//!
//! HTTP front door that authenticates, authorizes, audits, and
//! optionally relays credentials for every request before it is
//! handed to an upstream route.
//! Self-contained with dependency injection for clean architecture.

mod dependencies;
mod handlers;
pub mod logging_middleware;
mod service_container;

pub use dependencies::{DependenciesBuilder, GatewayDependencies};
pub use handlers::HealthResponse;
pub use service_container::ServiceContainer;

use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use apimux_core::{branding, OperatingMode};

use crate::audit::audit_middleware;
use crate::auth::authentication_middleware;
use crate::authz::authorization_middleware;
use crate::relay::relay_middleware;

/// Gateway server configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS for browser access
    pub enable_cors: bool,
    /// Operating mode, resolved once at startup
    pub mode: OperatingMode,
    /// OAuth client whose roles the claims checks inspect
    pub client_id: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: branding::DEFAULT_GATEWAY_PORT,
            enable_cors: true,
            mode: OperatingMode::Strict,
            client_id: branding::SERVICE_NAME.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid address")
    }

    /// Read configuration from `APIMUX_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(host) = std::env::var("APIMUX_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("APIMUX_PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!("[Gateway] Ignoring invalid APIMUX_PORT {:?}", port),
            }
        }
        if let Ok(cors) = std::env::var("APIMUX_CORS") {
            config.enable_cors = cors != "0" && !cors.eq_ignore_ascii_case("false");
        }
        if let Ok(client_id) = std::env::var("APIMUX_CLIENT_ID") {
            config.client_id = client_id;
        }

        let requested = std::env::var("APIMUX_MODE").ok();
        let acknowledged = std::env::var("APIMUX_ALLOW_OPEN_BYPASS")
            .map(|v| v == "1")
            .unwrap_or(false);
        config.mode = resolve_mode(requested.as_deref(), acknowledged);

        config
    }
}

/// Resolve the operating mode from its raw configuration value.
///
/// Open bypass disables permission checks on whitelisted paths, so it
/// takes a second acknowledgment flag (`APIMUX_ALLOW_OPEN_BYPASS=1`).
/// Anything unrecognized or unacknowledged falls back to strict.
fn resolve_mode(requested: Option<&str>, acknowledged: bool) -> OperatingMode {
    let Some(raw) = requested else {
        return OperatingMode::Strict;
    };

    match raw.parse::<OperatingMode>() {
        Ok(OperatingMode::Strict) => OperatingMode::Strict,
        Ok(OperatingMode::OpenBypass) if acknowledged => {
            warn!("[Gateway] OPEN BYPASS mode enabled: whitelisted paths skip permission checks");
            OperatingMode::OpenBypass
        }
        Ok(OperatingMode::OpenBypass) => {
            error!(
                "[Gateway] APIMUX_MODE=open-bypass requires APIMUX_ALLOW_OPEN_BYPASS=1, \
                 staying in strict mode"
            );
            OperatingMode::Strict
        }
        Err(e) => {
            error!("[Gateway] {}, staying in strict mode", e);
            OperatingMode::Strict
        }
    }
}

/// ApiMux Gateway Server
///
/// Self-contained server that manages its own services and lifecycle.
/// All external dependencies are injected through the constructor,
/// making the Gateway testable and environment-agnostic.
pub struct GatewayServer {
    config: GatewayConfig,
    services: ServiceContainer,
}

impl GatewayServer {
    /// Create a new gateway server with dependency injection
    pub fn new(config: GatewayConfig, dependencies: GatewayDependencies) -> Self {
        info!("[Gateway] Initializing with dependency injection...");

        let services = ServiceContainer::initialize(&dependencies, &config);

        info!("[Gateway] Services initialized successfully");

        Self { config, services }
    }

    /// Get a reference to the service container
    pub fn services(&self) -> &ServiceContainer {
        &self.services
    }

    /// Get the server configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Build the Axum router with the full middleware stack.
    ///
    /// Layers run outermost-first in request direction: CORS, tracing,
    /// request logging, authentication, audit, the authorization
    /// decision, and finally the token relay in front of the handler.
    pub fn router(&self) -> Router {
        let services = &self.services;

        let mut router = Router::new()
            // Liveness (public)
            .route("/health", get(handlers::health))
            // Every other path is decided by the middleware stack
            .fallback(handlers::upstream_handoff);

        // Credential rewrite runs innermost so only requests that
        // survived the authorization decision trigger a token fetch,
        // and the authenticator always sees the caller's own header.
        if let Some(relay) = services.relay.clone() {
            router = router.layer(middleware::from_fn_with_state(relay, relay_middleware));
        }

        let mut router = router
            // Authorization decision in front of the handler
            .layer(middleware::from_fn_with_state(
                services.engine.clone(),
                authorization_middleware,
            ))
            // Audit emission wraps the decision
            .layer(middleware::from_fn_with_state(
                services.audit.clone(),
                audit_middleware,
            ))
            // Principal resolution
            .layer(middleware::from_fn_with_state(
                services.authenticator.clone(),
                authentication_middleware,
            ))
            // Request/Response logging with body (DEBUG level)
            .layer(middleware::from_fn(
                logging_middleware::http_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http());

        // Add CORS if enabled
        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Run the gateway server
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.addr();

        info!("[Gateway] Starting on {}", addr);
        info!(
            "[Gateway] CORS: {}",
            if self.config.enable_cors {
                "enabled"
            } else {
                "disabled"
            }
        );
        info!("[Gateway] Operating mode: {}", self.config.mode);

        if self.services.relay.is_some() {
            info!("[Gateway] Token relay: enabled");
        } else {
            warn!("[Gateway] Token relay: disabled (no service token provider configured)");
        }

        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("[Gateway] Ready to accept connections");

        axum::serve(listener, router).await?;

        Ok(())
    }

    /// Start the server in the background
    ///
    /// Returns a JoinHandle that can be used to wait for completion or abort.
    pub fn spawn(self) -> tokio::task::JoinHandle<anyhow::Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
