//! Request authorization pipeline
//!
//! Everything between "who is calling" and "may they proceed": path
//! classification, the team permission cache, claims evaluation, team
//! context resolution, and the decision engine that orders them. The
//! pipeline is fail-closed; every error path collapses to Deny.

mod classifier;
mod claims_inspector;
mod engine;
mod middleware;
mod permission_store;
mod team_context;

pub use apimux_core::{extract_route_identifier, extract_scope_key};
pub use classifier::{PathClassifier, WEBHOOK_CALLBACK_MARKER};
pub use claims_inspector::{ClaimsInspector, BASE_SCOPE, CLIENT_ADMIN_ROLE, REALM_ADMIN_ROLE};
pub use engine::AuthorizationDecisionEngine;
pub use middleware::{authorization_middleware, DecisionOutcome};
pub use permission_store::PermissionStore;
pub use team_context::{
    ClaimsTeamContextSource, TeamContextResolver, TeamContextSource, TEAM_ID_PREFIX,
};
