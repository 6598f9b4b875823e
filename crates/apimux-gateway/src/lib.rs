//! ApiMux Gateway
//!
//! Multi-tenant API gateway front end that provides:
//! - Request authorization pipeline (Allow/Deny before any forwarding)
//! - JWT and API-key authentication
//! - Team-scoped route permissions with a read-through cache
//! - Service-token relay for downstream calls
//! - Audit events around every authorization decision
//! - Dependency Injection for clean architecture

pub mod audit;
pub mod auth;
pub mod authz;
pub mod logging;
pub mod oauth;
pub mod relay;
pub mod server;
pub mod services;

pub use audit::AuditDescriptor;
pub use auth::{ApiKey, Authenticator, HmacTokenDecoder, TokenDecoder};
pub use authz::{
    AuthorizationDecisionEngine, ClaimsInspector, ClaimsTeamContextSource, DecisionOutcome,
    PathClassifier, PermissionStore, TeamContextResolver, TeamContextSource,
};
pub use oauth::{OAuthClientConfig, OAuthClientManager, ServiceToken, ServiceTokenProvider};
pub use relay::TokenRelayAgent;
pub use server::{DependenciesBuilder, GatewayConfig, GatewayDependencies, GatewayServer};
pub use services::MemoryCache;
