//! Team route permissions behind a read-through cache

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use apimux_core::{PermissionCache, RepoResult, RoutePermission, RouteRegistry, TeamGrantStore};

/// How long a computed permission may be served from cache
const PERMISSION_TTL: Duration = Duration::from_secs(300);

/// Answers "does this team hold USE on this route" with cached results.
///
/// Concurrent misses for the same key may each recompute and race on the
/// cache write; last write wins. There is deliberately no single-flight.
pub struct PermissionStore {
    registry: Arc<dyn RouteRegistry>,
    grants: Arc<dyn TeamGrantStore>,
    cache: Arc<dyn PermissionCache>,
    ttl: Duration,
}

impl PermissionStore {
    pub fn new(
        registry: Arc<dyn RouteRegistry>,
        grants: Arc<dyn TeamGrantStore>,
        cache: Arc<dyn PermissionCache>,
    ) -> Self {
        Self {
            registry,
            grants,
            cache,
            ttl: PERMISSION_TTL,
        }
    }

    /// Override the cache TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Whether `team_id` holds USE on the route behind `route_identifier`.
    ///
    /// Unknown routes return false and are never cached; the route may be
    /// registered moments later and a stale negative must not stick for a
    /// whole TTL. Cache read failures degrade to a miss; cache write
    /// failures still return the computed value. Registry or grant store
    /// failures propagate.
    pub async fn has_use_permission(
        &self,
        team_id: &str,
        route_identifier: &str,
    ) -> RepoResult<bool> {
        let cache_key = format!("permission:{}:{}", team_id, route_identifier);

        match self.cache.get(&cache_key).await {
            Ok(Some(cached)) => {
                let allowed = cached == "true";
                debug!("[Authz] Permission cache hit {} = {}", cache_key, allowed);
                return Ok(allowed);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    "[Authz] Permission cache read failed for {}: {:#}",
                    cache_key, e
                );
            }
        }

        let Some(route) = self
            .registry
            .find_route_by_identifier(route_identifier)
            .await?
        else {
            debug!(
                "[Authz] No route registered for identifier {}",
                route_identifier
            );
            return Ok(false);
        };

        let allowed = match self.grants.find_grant(team_id, &route.id).await? {
            Some(grant) => grant.has(RoutePermission::Use),
            None => false,
        };

        let value = if allowed { "true" } else { "false" };
        if let Err(e) = self.cache.set(&cache_key, value, self.ttl).await {
            warn!(
                "[Authz] Permission cache write failed for {}: {:#}",
                cache_key, e
            );
        }

        debug!("[Authz] Permission computed {} = {}", cache_key, allowed);
        Ok(allowed)
    }
}
