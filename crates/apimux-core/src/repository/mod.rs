//! Repository traits for data access
//!
//! These traits define the interface for data storage without specifying
//! the implementation (SQLite, in-memory, etc.)

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ApiKeyRecord, RouteRecord, TeamRouteGrant};

/// Result type for repository operations
pub type RepoResult<T> = anyhow::Result<T>;

/// Route registry trait
#[async_trait]
pub trait RouteRegistry: Send + Sync {
    /// Whether the path matches any whitelist pattern
    async fn is_path_whitelisted(&self, path: &str) -> RepoResult<bool>;

    /// Look up a route by its path identifier
    async fn find_route_by_identifier(
        &self,
        route_identifier: &str,
    ) -> RepoResult<Option<RouteRecord>>;

    /// Required client scope configured for a scope key, if any
    async fn lookup_required_scope(&self, scope_key: &str) -> RepoResult<Option<String>>;
}

/// Team route grant store trait
#[async_trait]
pub trait TeamGrantStore: Send + Sync {
    /// Get the grant a team holds on a route
    async fn find_grant(
        &self,
        team_id: &str,
        route_id: &Uuid,
    ) -> RepoResult<Option<TeamRouteGrant>>;
}

/// Permission decision cache trait
#[async_trait]
pub trait PermissionCache: Send + Sync {
    /// Get a cached value; `None` on miss or expiry
    async fn get(&self, key: &str) -> RepoResult<Option<String>>;

    /// Store a value with a time-to-live
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<()>;
}

/// API key repository trait
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Look up a key by its raw key material (hashed before lookup)
    async fn find_by_key(&self, raw_key: &str) -> RepoResult<Option<ApiKeyRecord>>;

    /// Store a new key record
    async fn create(&self, record: &ApiKeyRecord) -> RepoResult<()>;

    /// Revoke a key
    async fn revoke(&self, id: &Uuid) -> RepoResult<()>;

    /// Get all keys belonging to a team
    async fn list_for_team(&self, team_id: &str) -> RepoResult<Vec<ApiKeyRecord>>;
}
