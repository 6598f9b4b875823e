//! Mock repository implementations for testing
//!
//! In-memory implementations of the repository traits, with call
//! counters where caching behavior needs observing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use apimux_core::{
    domain::{ApiKeyRecord, RouteRecord, TeamRouteGrant},
    matching,
    repository::{ApiKeyRepository, PermissionCache, RepoResult, RouteRegistry, TeamGrantStore},
};
use apimux_gateway::oauth::{ServiceToken, ServiceTokenProvider};
use apimux_gateway::MemoryCache;
use apimux_storage::hash_api_key;

// ============================================================================
// MockRouteRegistry
// ============================================================================

#[derive(Default)]
pub struct MockRouteRegistry {
    whitelist: RwLock<Vec<String>>,
    routes: RwLock<HashMap<String, RouteRecord>>,
    scopes: RwLock<HashMap<String, String>>,
    route_lookups: AtomicUsize,
}

impl MockRouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose whitelist admits every path
    pub fn permissive() -> Self {
        Self::new().with_whitelisted("/**")
    }

    pub fn with_whitelisted(self, pattern: &str) -> Self {
        self.whitelist.write().unwrap().push(pattern.to_string());
        self
    }

    pub fn with_route(self, route: RouteRecord) -> Self {
        self.routes
            .write()
            .unwrap()
            .insert(route.route_identifier.clone(), route);
        self
    }

    pub fn with_required_scope(self, scope_key: &str, scope: &str) -> Self {
        self.scopes
            .write()
            .unwrap()
            .insert(scope_key.to_string(), scope.to_string());
        self
    }

    /// Number of route lookups performed so far
    pub fn route_lookups(&self) -> usize {
        self.route_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RouteRegistry for MockRouteRegistry {
    async fn is_path_whitelisted(&self, path: &str) -> RepoResult<bool> {
        Ok(self
            .whitelist
            .read()
            .unwrap()
            .iter()
            .any(|pattern| matching::pattern_matches(pattern, path)))
    }

    async fn find_route_by_identifier(
        &self,
        route_identifier: &str,
    ) -> RepoResult<Option<RouteRecord>> {
        self.route_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.routes.read().unwrap().get(route_identifier).cloned())
    }

    async fn lookup_required_scope(&self, scope_key: &str) -> RepoResult<Option<String>> {
        Ok(self.scopes.read().unwrap().get(scope_key).cloned())
    }
}

// ============================================================================
// MockTeamGrantStore
// ============================================================================

#[derive(Default)]
pub struct MockTeamGrantStore {
    grants: RwLock<HashMap<(String, Uuid), TeamRouteGrant>>,
    lookups: AtomicUsize,
}

impl MockTeamGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grant(self, grant: TeamRouteGrant) -> Self {
        self.grants
            .write()
            .unwrap()
            .insert((grant.team_id.clone(), grant.route_id), grant);
        self
    }

    /// Remove a grant mid-test (revocation scenarios)
    pub fn remove_grant(&self, team_id: &str, route_id: &Uuid) {
        self.grants
            .write()
            .unwrap()
            .remove(&(team_id.to_string(), *route_id));
    }

    /// Number of grant lookups performed so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TeamGrantStore for MockTeamGrantStore {
    async fn find_grant(
        &self,
        team_id: &str,
        route_id: &Uuid,
    ) -> RepoResult<Option<TeamRouteGrant>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .grants
            .read()
            .unwrap()
            .get(&(team_id.to_string(), *route_id))
            .cloned())
    }
}

// ============================================================================
// MockApiKeyRepository
// ============================================================================

#[derive(Default)]
pub struct MockApiKeyRepository {
    keys: RwLock<HashMap<String, ApiKeyRecord>>,
}

impl MockApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: ApiKeyRecord) -> Self {
        self.keys
            .write()
            .unwrap()
            .insert(record.key_hash.clone(), record);
        self
    }
}

#[async_trait]
impl ApiKeyRepository for MockApiKeyRepository {
    async fn find_by_key(&self, raw_key: &str) -> RepoResult<Option<ApiKeyRecord>> {
        let hash = hash_api_key(raw_key);
        Ok(self.keys.read().unwrap().get(&hash).cloned())
    }

    async fn create(&self, record: &ApiKeyRecord) -> RepoResult<()> {
        self.keys
            .write()
            .unwrap()
            .insert(record.key_hash.clone(), record.clone());
        Ok(())
    }

    async fn revoke(&self, id: &Uuid) -> RepoResult<()> {
        let mut keys = self.keys.write().unwrap();
        match keys.values_mut().find(|record| record.id == *id) {
            Some(record) => {
                record.revoked = true;
                Ok(())
            }
            None => anyhow::bail!("API key not found: {}", id),
        }
    }

    async fn list_for_team(&self, team_id: &str) -> RepoResult<Vec<ApiKeyRecord>> {
        Ok(self
            .keys
            .read()
            .unwrap()
            .values()
            .filter(|record| record.team_id == team_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// CountingCache
// ============================================================================

/// Wraps the in-memory cache and counts reads and writes.
#[derive(Default)]
pub struct CountingCache {
    inner: MemoryCache,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionCache for CountingCache {
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }
}

// ============================================================================
// FailingCache
// ============================================================================

/// Cache whose every operation errors, for degradation tests.
#[derive(Default)]
pub struct FailingCache;

#[async_trait]
impl PermissionCache for FailingCache {
    async fn get(&self, _key: &str) -> RepoResult<Option<String>> {
        anyhow::bail!("cache backend unavailable")
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> RepoResult<()> {
        anyhow::bail!("cache backend unavailable")
    }
}

// ============================================================================
// Token providers
// ============================================================================

/// Provider returning a fixed token and counting acquisitions.
pub struct StaticTokenProvider {
    token: String,
    calls: AtomicUsize,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceTokenProvider for StaticTokenProvider {
    async fn acquire_service_token(&self) -> anyhow::Result<ServiceToken> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ServiceToken {
            access_token: self.token.clone(),
            token_type: "Bearer".to_string(),
            expires_at: None,
            scope: None,
        })
    }
}

/// Provider that never produces a token, for degradation tests.
pub struct FailingTokenProvider;

#[async_trait]
impl ServiceTokenProvider for FailingTokenProvider {
    async fn acquire_service_token(&self) -> anyhow::Result<ServiceToken> {
        anyhow::bail!("token endpoint unreachable")
    }
}
