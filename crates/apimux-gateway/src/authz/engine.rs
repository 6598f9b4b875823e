//! The authorization decision engine
//!
//! Consumes the classifier, registry, permission store, team resolver,
//! and claims inspector in a fixed order. The only concurrency is the
//! whitelist + required-scope lookup pair.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use apimux_core::{
    extract_route_identifier, extract_scope_key, AuthorizationContext, Decision, OperatingMode,
    RouteRegistry,
};

use super::{
    ClaimsInspector, PathClassifier, PermissionStore, TeamContextResolver, WEBHOOK_CALLBACK_MARKER,
};

/// Decides Allow/Deny for every request before anything is forwarded.
pub struct AuthorizationDecisionEngine {
    registry: Arc<dyn RouteRegistry>,
    permissions: Arc<PermissionStore>,
    claims_inspector: ClaimsInspector,
    team_resolver: TeamContextResolver,
    mode: OperatingMode,
}

impl AuthorizationDecisionEngine {
    pub fn new(
        registry: Arc<dyn RouteRegistry>,
        permissions: Arc<PermissionStore>,
        claims_inspector: ClaimsInspector,
        team_resolver: TeamContextResolver,
        mode: OperatingMode,
    ) -> Self {
        Self {
            registry,
            permissions,
            claims_inspector,
            team_resolver,
            mode,
        }
    }

    /// Decide whether this request may proceed.
    ///
    /// Infallible by construction: every error inside evaluation is
    /// logged and collapsed to [`Decision::Deny`].
    pub async fn authorize(&self, ctx: &mut AuthorizationContext) -> Decision {
        match self.evaluate(ctx).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(
                    "[Authz] {} {} denied after evaluation error: {:#}",
                    ctx.method, ctx.path, e
                );
                Decision::Deny
            }
        }
    }

    async fn evaluate(&self, ctx: &mut AuthorizationContext) -> Result<Decision> {
        let path = ctx.path.clone();

        // Public and health paths short-circuit before any I/O
        if PathClassifier::is_public(&path) {
            debug!("[Authz] {} is public", path);
            return Ok(Decision::Allow);
        }
        if PathClassifier::is_health_endpoint(&path) {
            debug!("[Authz] {} is a health probe", path);
            return Ok(Decision::Allow);
        }

        // Whitelist membership and the path's required scope are
        // independent lookups; overlap them.
        let scope_key = extract_scope_key(&path);
        let (whitelisted, required_scope) = tokio::join!(
            self.registry.is_path_whitelisted(&path),
            self.registry.lookup_required_scope(&scope_key),
        );
        let whitelisted = whitelisted?;
        let required_scope = required_scope?;

        if !whitelisted {
            info!("[Authz] {} {} denied: not whitelisted", ctx.method, path);
            return Ok(Decision::Deny);
        }

        if self.mode.is_open_bypass() {
            warn!(
                "[Authz] OPEN BYPASS: {} {} allowed without permission checks",
                ctx.method, path
            );
            return Ok(Decision::Allow);
        }

        if let Some(route_identifier) = extract_route_identifier(&path) {
            if path.contains(WEBHOOK_CALLBACK_MARKER) {
                debug!(
                    "[Authz] {} is a webhook callback, skipping route permission checks",
                    path
                );
            } else {
                return self
                    .evaluate_proxied(ctx, &route_identifier, required_scope.as_deref())
                    .await;
            }
        }

        // Management paths and webhook-exempt callbacks
        self.evaluate_principal(ctx, &path, required_scope.as_deref())
    }

    /// Proxied route: the team must hold USE on the route, then key
    /// callers are done while token callers still face claims checks.
    async fn evaluate_proxied(
        &self,
        ctx: &mut AuthorizationContext,
        route_identifier: &str,
        required_scope: Option<&str>,
    ) -> Result<Decision> {
        let Some(team_id) = self.team_resolver.resolve(ctx).await? else {
            info!(
                "[Authz] {} {} denied: no team context",
                ctx.method, ctx.path
            );
            return Ok(Decision::Deny);
        };
        ctx.attach_team(team_id.clone());

        if !self
            .permissions
            .has_use_permission(&team_id, route_identifier)
            .await?
        {
            info!(
                "[Authz] team {} denied: no USE grant on route {}",
                team_id, route_identifier
            );
            return Ok(Decision::Deny);
        }

        if ctx.principal.is_api_key() {
            debug!(
                "[Authz] API key for team {} allowed on route {}",
                team_id, route_identifier
            );
            return Ok(Decision::Allow);
        }

        let path = ctx.path.clone();
        self.evaluate_principal(ctx, &path, required_scope)
    }

    fn evaluate_principal(
        &self,
        ctx: &AuthorizationContext,
        path: &str,
        required_scope: Option<&str>,
    ) -> Result<Decision> {
        if ctx.principal.is_api_key() {
            debug!("[Authz] API key allowed on {}", path);
            return Ok(Decision::Allow);
        }

        match ctx.principal.claims() {
            Some(claims) => Ok(self.claims_inspector.evaluate(claims, path, required_scope)),
            None => {
                info!(
                    "[Authz] {} {} denied: no token claims to evaluate",
                    ctx.method, path
                );
                Ok(Decision::Deny)
            }
        }
    }
}
