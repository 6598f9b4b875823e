//! # ApiMux Core Library
//!
//! Domain types, authorization model, and data access traits for ApiMux.
//!
//! ## Modules
//!
//! - `branding` - Centralized branding constants
//! - `domain` - Core entities (AuthorizationContext, Claims, RouteRecord, TeamRouteGrant)
//! - `extract` - Scope-key and route-identifier extraction from request paths
//! - `matching` - Ant-style path pattern matching
//! - `repository` - Data access traits

pub mod branding;
pub mod domain;
pub mod extract;
pub mod matching;
pub mod repository;

// Re-export commonly used types
pub use domain::*;
pub use extract::{extract_route_identifier, extract_scope_key};
pub use matching::PathPatternSet;
pub use repository::*;
