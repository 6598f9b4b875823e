//! Service Container - holds all initialized services
//!
//! Services are created once at startup and shared by the middleware
//! stack for the lifetime of the server.

use std::sync::Arc;

use crate::audit::AuditDescriptor;
use crate::auth::Authenticator;
use crate::authz::{
    AuthorizationDecisionEngine, ClaimsInspector, PermissionStore, TeamContextResolver,
};
use crate::relay::TokenRelayAgent;

use super::{dependencies::GatewayDependencies, GatewayConfig};

/// Container for all Gateway services
///
/// Only holds service references, doesn't create or manage them beyond
/// the initial wiring.
#[derive(Clone)]
pub struct ServiceContainer {
    /// Principal resolution for incoming requests
    pub authenticator: Arc<Authenticator>,

    /// Decision engine behind the authorization middleware
    pub engine: Arc<AuthorizationDecisionEngine>,

    /// Cached team permission lookups, shared with tooling
    pub permission_store: Arc<PermissionStore>,

    /// Credential rewrite for downstream calls (absent when no token
    /// provider is configured)
    pub relay: Option<Arc<TokenRelayAgent>>,

    /// Shape of emitted audit events
    pub audit: Arc<AuditDescriptor>,

    /// Gateway dependencies (for accessing repositories, etc.)
    pub dependencies: GatewayDependencies,
}

impl ServiceContainer {
    /// Initialize all services from dependencies
    pub fn initialize(deps: &GatewayDependencies, config: &GatewayConfig) -> Self {
        let authenticator = Arc::new(Authenticator::new(
            deps.api_key_repo.clone(),
            deps.token_decoder.clone(),
        ));

        let permission_store = Arc::new(PermissionStore::new(
            deps.route_registry.clone(),
            deps.grant_store.clone(),
            deps.permission_cache.clone(),
        ));

        let engine = Arc::new(AuthorizationDecisionEngine::new(
            deps.route_registry.clone(),
            permission_store.clone(),
            ClaimsInspector::new(config.client_id.clone()),
            TeamContextResolver::new(deps.team_context_source.clone()),
            config.mode,
        ));

        let relay = deps
            .token_provider
            .clone()
            .map(|provider| Arc::new(TokenRelayAgent::new(provider)));

        Self {
            authenticator,
            engine,
            permission_store,
            relay,
            audit: Arc::new(AuditDescriptor::default()),
            dependencies: deps.clone(),
        }
    }
}
