//! Typed accessors over a decoded JWT payload
//!
//! Keycloak-style layout: space-delimited `scope`, `realm_access.roles`,
//! and `resource_access.{client}.roles`. Accessors tolerate missing or
//! malformed structures by returning empty values, never by panicking.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded JWT claim set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims {
    raw: serde_json::Map<String, Value>,
}

impl Claims {
    /// Build from an already-decoded JSON payload.
    ///
    /// Non-object payloads yield an empty claim set.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(raw) => Self { raw },
            _ => Self::default(),
        }
    }

    /// Raw claim lookup
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }

    /// The `sub` claim
    pub fn subject(&self) -> Option<&str> {
        self.string_claim("sub")
    }

    /// The `exp` claim as a unix timestamp
    pub fn expiration(&self) -> Option<i64> {
        self.raw.get("exp").and_then(Value::as_i64)
    }

    /// The raw space-delimited `scope` claim
    pub fn scope(&self) -> Option<&str> {
        self.string_claim("scope")
    }

    /// Individual scope tokens
    pub fn scopes(&self) -> Vec<&str> {
        self.scope().map_or_else(Vec::new, |s| s.split_whitespace().collect())
    }

    /// Whether `scope` contains the given token exactly
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes().iter().any(|s| *s == scope)
    }

    /// An explicit `team_id` claim
    pub fn team_id(&self) -> Option<&str> {
        self.string_claim("team_id")
    }

    /// The `teams` array claim, raw (prefix normalization is the caller's concern)
    pub fn teams(&self) -> Vec<String> {
        Self::string_array(self.raw.get("teams"))
    }

    /// Roles under `realm_access.roles`; empty when absent or malformed
    pub fn realm_roles(&self) -> Vec<String> {
        Self::string_array(self.raw.get("realm_access").and_then(|v| v.get("roles")))
    }

    /// Roles under `resource_access.{client_id}.roles`; empty when absent or malformed
    pub fn client_roles(&self, client_id: &str) -> Vec<String> {
        Self::string_array(
            self.raw
                .get("resource_access")
                .and_then(|v| v.get(client_id))
                .and_then(|v| v.get("roles")),
        )
    }

    fn string_claim(&self, name: &str) -> Option<&str> {
        self.raw.get(name).and_then(Value::as_str)
    }

    fn string_array(value: Option<&Value>) -> Vec<String> {
        value
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}
