//! Team context resolution
//!
//! Which team is this request acting for? Key and certificate
//! credentials answer directly; token callers are resolved through the
//! pluggable [`TeamContextSource`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use apimux_core::{AuthorizationContext, RepoResult};

/// Prefix carried by entries of the `teams` token claim, stripped during
/// normalization
pub const TEAM_ID_PREFIX: &str = "tm_";

/// External source of team context for callers whose credentials do not
/// fix a team directly.
#[async_trait]
pub trait TeamContextSource: Send + Sync {
    async fn resolve_team(&self, ctx: &AuthorizationContext) -> RepoResult<Option<String>>;
}

/// Default source: inspects the caller's JWT claims.
///
/// An explicit `team_id` claim wins; otherwise the first entry of the
/// `teams` claim, normalized. A requested team (`x-team-id` header) is
/// honored only when the token actually lists that team; a request for a
/// team the token does not list fails resolution outright.
pub struct ClaimsTeamContextSource;

#[async_trait]
impl TeamContextSource for ClaimsTeamContextSource {
    async fn resolve_team(&self, ctx: &AuthorizationContext) -> RepoResult<Option<String>> {
        let Some(claims) = ctx.principal.claims() else {
            return Ok(None);
        };

        let teams: Vec<String> = claims
            .teams()
            .iter()
            .map(|t| normalize_team_id(t))
            .collect();

        if let Some(requested) = ctx.requested_team_id.as_deref() {
            let requested = normalize_team_id(requested);
            let listed = teams.iter().any(|t| *t == requested)
                || claims.team_id().is_some_and(|t| t == requested);
            if listed {
                return Ok(Some(requested));
            }
            debug!(
                "[Authz] Requested team {} is not listed in the token",
                requested
            );
            return Ok(None);
        }

        if let Some(team_id) = claims.team_id() {
            return Ok(Some(team_id.to_string()));
        }

        Ok(teams.into_iter().next())
    }
}

/// Strip the team prefix if present
fn normalize_team_id(raw: &str) -> String {
    raw.strip_prefix(TEAM_ID_PREFIX).unwrap_or(raw).to_string()
}

/// Resolves the acting team for a request. First hit wins:
/// 1. a team already attached to the context,
/// 2. a team carried by the principal itself,
/// 3. the external source.
pub struct TeamContextResolver {
    source: Arc<dyn TeamContextSource>,
}

impl TeamContextResolver {
    pub fn new(source: Arc<dyn TeamContextSource>) -> Self {
        Self { source }
    }

    pub async fn resolve(&self, ctx: &AuthorizationContext) -> RepoResult<Option<String>> {
        if let Some(team_id) = &ctx.team_id {
            return Ok(Some(team_id.clone()));
        }

        if let Some(team_id) = ctx.principal.team_id() {
            return Ok(Some(team_id.to_string()));
        }

        self.source.resolve_team(ctx).await
    }
}
