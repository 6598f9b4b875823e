//! Per-request authorization context, principal, and decision types

use serde::{Deserialize, Serialize};

use super::claims::Claims;

/// Outcome of an authorization evaluation.
///
/// `Allow` is only produced by an explicit positive condition; every
/// error path collapses to `Deny`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// The authenticated caller, as established by the authentication layer.
#[derive(Debug, Clone)]
pub enum Principal {
    /// Bearer token carrying decoded JWT claims
    Jwt(Claims),

    /// API key, already validated and resolved to its owning team
    ApiKey {
        /// Team that issued the key
        team_id: String,
    },

    /// Client certificate identity (string principal)
    Certificate {
        /// Common name from the certificate subject
        common_name: String,
    },

    /// No credentials presented
    Anonymous,
}

impl Principal {
    /// Team id carried directly by the principal, if any.
    ///
    /// API-key principals carry their owning team; certificate principals
    /// use the common name as team identity. JWT principals resolve their
    /// team through the team-context source instead.
    pub fn team_id(&self) -> Option<&str> {
        match self {
            Principal::ApiKey { team_id } => Some(team_id),
            Principal::Certificate { common_name } => Some(common_name),
            Principal::Jwt(_) | Principal::Anonymous => None,
        }
    }

    /// Decoded JWT claims, for JWT principals only
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Principal::Jwt(claims) => Some(claims),
            _ => None,
        }
    }

    pub fn is_api_key(&self) -> bool {
        matches!(self, Principal::ApiKey { .. })
    }

    /// Short label for structured logging
    pub fn kind(&self) -> &'static str {
        match self {
            Principal::Jwt(_) => "jwt",
            Principal::ApiKey { .. } => "api-key",
            Principal::Certificate { .. } => "certificate",
            Principal::Anonymous => "anonymous",
        }
    }
}

/// Everything the decision engine needs to know about one request.
///
/// Built once at the start of the pipeline. `team_id` is the only field
/// written after construction, via [`AuthorizationContext::attach_team`].
#[derive(Debug, Clone)]
pub struct AuthorizationContext {
    /// Request path, as received (no normalization beyond the router's)
    pub path: String,

    /// HTTP method
    pub method: String,

    /// Authenticated caller
    pub principal: Principal,

    /// Resolved team, populated by the engine once resolution succeeds
    pub team_id: Option<String>,

    /// Team the caller asked to act as (`X-Team-ID` header), unverified
    pub requested_team_id: Option<String>,
}

impl AuthorizationContext {
    pub fn new(path: impl Into<String>, method: impl Into<String>, principal: Principal) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            principal,
            team_id: None,
            requested_team_id: None,
        }
    }

    /// Record the team the caller asked to act as
    pub fn with_requested_team(mut self, team_id: impl Into<String>) -> Self {
        self.requested_team_id = Some(team_id.into());
        self
    }

    /// Pre-attach a team id at construction (API-key authentication does this)
    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// Record the resolved team. Called at most once, by the engine.
    pub fn attach_team(&mut self, team_id: impl Into<String>) {
        self.team_id = Some(team_id.into());
    }
}
