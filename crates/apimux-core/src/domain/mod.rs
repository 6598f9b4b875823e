//! Domain entities and value objects
//!
//! This module contains all domain-level types for ApiMux:
//! - Entities (RouteRecord, TeamRouteGrant, ApiKeyRecord)
//! - Value Objects (Decision, Principal, Claims, OperatingMode)
//! - The per-request AuthorizationContext

mod api_key;
mod claims;
mod context;
mod mode;
mod route;

pub use api_key::*;
pub use claims::*;
pub use context::*;
pub use mode::*;
pub use route::*;
