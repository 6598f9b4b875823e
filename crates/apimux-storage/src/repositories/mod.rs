//! Repository implementations using SQLite.

mod api_key_repository;
mod route_registry;
mod team_grant_store;

pub use api_key_repository::{hash_api_key, SqliteApiKeyRepository};
pub use route_registry::{SqliteRouteRegistry, DEFAULT_WHITELIST};
pub use team_grant_store::SqliteTeamGrantStore;
