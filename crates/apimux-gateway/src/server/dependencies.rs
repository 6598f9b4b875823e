//! Dependency Injection Container
//!
//! Provides a clean DI pattern for Gateway dependencies.
//! Makes testing easier and dependencies explicit.

use std::sync::Arc;

use apimux_core::{ApiKeyRepository, PermissionCache, RouteRegistry, TeamGrantStore};
use apimux_storage::{Database, SqliteApiKeyRepository, SqliteRouteRegistry, SqliteTeamGrantStore};
use tokio::sync::Mutex;

use crate::auth::{HmacTokenDecoder, TokenDecoder};
use crate::authz::{ClaimsTeamContextSource, TeamContextSource};
use crate::oauth::ServiceTokenProvider;
use crate::services::MemoryCache;

/// Dependency container for Gateway
///
/// Follows Dependency Injection pattern - all collaborators are injected,
/// making the pipeline testable and decoupled from concrete implementations.
#[derive(Clone)]
pub struct GatewayDependencies {
    // Repositories (Data Layer)
    pub route_registry: Arc<dyn RouteRegistry>,
    pub grant_store: Arc<dyn TeamGrantStore>,
    pub api_key_repo: Arc<dyn ApiKeyRepository>,

    // Pipeline collaborators
    pub permission_cache: Arc<dyn PermissionCache>,
    pub team_context_source: Arc<dyn TeamContextSource>,
    pub token_decoder: Arc<dyn TokenDecoder>,

    /// Service token source for the relay (relay is disabled when absent)
    pub token_provider: Option<Arc<dyn ServiceTokenProvider>>,

    // Database (for Gateway state persistence)
    pub database: Arc<Mutex<Database>>,
}

/// Builder for GatewayDependencies
pub struct DependenciesBuilder {
    route_registry: Option<Arc<dyn RouteRegistry>>,
    grant_store: Option<Arc<dyn TeamGrantStore>>,
    api_key_repo: Option<Arc<dyn ApiKeyRepository>>,
    permission_cache: Option<Arc<dyn PermissionCache>>,
    team_context_source: Option<Arc<dyn TeamContextSource>>,
    token_decoder: Option<Arc<dyn TokenDecoder>>,
    token_provider: Option<Arc<dyn ServiceTokenProvider>>,
    database: Option<Arc<Mutex<Database>>>,
}

impl DependenciesBuilder {
    pub fn new() -> Self {
        Self {
            route_registry: None,
            grant_store: None,
            api_key_repo: None,
            permission_cache: None,
            team_context_source: None,
            token_decoder: None,
            token_provider: None,
            database: None,
        }
    }

    pub fn with_route_registry(mut self, registry: Arc<dyn RouteRegistry>) -> Self {
        self.route_registry = Some(registry);
        self
    }

    pub fn with_grant_store(mut self, store: Arc<dyn TeamGrantStore>) -> Self {
        self.grant_store = Some(store);
        self
    }

    pub fn with_api_key_repo(mut self, repo: Arc<dyn ApiKeyRepository>) -> Self {
        self.api_key_repo = Some(repo);
        self
    }

    pub fn with_permission_cache(mut self, cache: Arc<dyn PermissionCache>) -> Self {
        self.permission_cache = Some(cache);
        self
    }

    pub fn with_team_context_source(mut self, source: Arc<dyn TeamContextSource>) -> Self {
        self.team_context_source = Some(source);
        self
    }

    pub fn with_token_decoder(mut self, decoder: Arc<dyn TokenDecoder>) -> Self {
        self.token_decoder = Some(decoder);
        self
    }

    /// Convenience for the common case: decode bearer tokens with an
    /// HMAC-SHA256 secret.
    pub fn with_jwt_secret(mut self, secret: &[u8]) -> Self {
        self.token_decoder = Some(Arc::new(HmacTokenDecoder::new(secret)));
        self
    }

    pub fn with_token_provider(mut self, provider: Arc<dyn ServiceTokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    pub fn with_database(mut self, db: Arc<Mutex<Database>>) -> Self {
        self.database = Some(db);
        self
    }

    pub fn build(self) -> Result<GatewayDependencies, String> {
        let database = self.database.ok_or("database is required")?;

        // Create repositories from database if not provided
        let route_registry = match self.route_registry {
            Some(registry) => registry,
            None => Arc::new(
                SqliteRouteRegistry::new(database.clone())
                    .map_err(|e| format!("failed to initialize route registry: {e:#}"))?,
            ),
        };

        let grant_store = self
            .grant_store
            .unwrap_or_else(|| Arc::new(SqliteTeamGrantStore::new(database.clone())));

        let api_key_repo = self
            .api_key_repo
            .unwrap_or_else(|| Arc::new(SqliteApiKeyRepository::new(database.clone())));

        let permission_cache = self
            .permission_cache
            .unwrap_or_else(|| Arc::new(MemoryCache::new()));

        let team_context_source = self
            .team_context_source
            .unwrap_or_else(|| Arc::new(ClaimsTeamContextSource));

        Ok(GatewayDependencies {
            route_registry,
            grant_store,
            api_key_repo,
            permission_cache,
            team_context_source,
            token_decoder: self
                .token_decoder
                .ok_or("token_decoder is required (provide a jwt secret)")?,
            token_provider: self.token_provider,
            database,
        })
    }
}

impl Default for DependenciesBuilder {
    fn default() -> Self {
        Self::new()
    }
}
