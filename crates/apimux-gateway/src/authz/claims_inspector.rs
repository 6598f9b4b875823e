//! JWT claims evaluation
//!
//! Four ordered checks, all conjunctive: the base gateway scope, the
//! path's configured scope, the realm admin role, and the client admin
//! role. Pure; everything it needs arrives as arguments.

use tracing::debug;

use apimux_core::{Claims, Decision};

/// Scope every token-bearing gateway caller must hold
pub const BASE_SCOPE: &str = "gateway.read";

/// Realm-level administrator role, read from `realm_access.roles`
pub const REALM_ADMIN_ROLE: &str = "gateway_admin_realm";

/// Client-level administrator role, read from `resource_access.{client}.roles`
pub const CLIENT_ADMIN_ROLE: &str = "gateway_admin";

/// Internal path prefixes exempt from the per-path scope check.
///
/// Their scopes are implied by the base scope and the admin roles.
const SCOPE_EXEMPT_PREFIXES: [&str; 9] = [
    "/ws",
    "/metrics/",
    "/analysis/",
    "/routes/",
    "/api/",
    "/r/",
    "/health/",
    "/fallback/",
    "/mux",
];

/// Evaluates decoded JWT claims against the gateway's role model.
pub struct ClaimsInspector {
    /// `resource_access` entry expected to carry the client admin role
    client_id: String,
}

impl ClaimsInspector {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }

    /// Run the four checks in order; the first failure denies.
    pub fn evaluate(&self, claims: &Claims, path: &str, required_scope: Option<&str>) -> Decision {
        // 1. Base scope
        if !claims.has_scope(BASE_SCOPE) {
            debug!("[Authz] Token lacks the {} scope", BASE_SCOPE);
            return Decision::Deny;
        }

        // 2. Per-path scope, only outside the internal prefixes. A path
        // with no configured scope passes this check; one with a
        // configured scope must carry it verbatim.
        if !Self::is_scope_exempt(path) {
            match required_scope {
                Some(required) if !claims.has_scope(required) => {
                    debug!(
                        "[Authz] Scope {} required for {} but not granted",
                        required, path
                    );
                    return Decision::Deny;
                }
                Some(required) => {
                    debug!("[Authz] Scope {} granted for {}", required, path);
                }
                None => {
                    debug!("[Authz] No scope configured for {}", path);
                }
            }
        }

        // 3. Realm admin role
        if !claims.realm_roles().iter().any(|r| r == REALM_ADMIN_ROLE) {
            debug!("[Authz] Token lacks realm role {}", REALM_ADMIN_ROLE);
            return Decision::Deny;
        }

        // 4. Client admin role
        if claims
            .client_roles(&self.client_id)
            .iter()
            .any(|r| r == CLIENT_ADMIN_ROLE)
        {
            Decision::Allow
        } else {
            debug!(
                "[Authz] Token lacks client role {} for {}",
                CLIENT_ADMIN_ROLE, self.client_id
            );
            Decision::Deny
        }
    }

    fn is_scope_exempt(path: &str) -> bool {
        SCOPE_EXEMPT_PREFIXES.iter().any(|p| path.starts_with(p))
    }
}
