//! Route registry entities and team grants

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered proxied route, addressable as `/r/{route_identifier}/...`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Identifier segment used in request paths
    pub route_identifier: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl RouteRecord {
    /// Create a new route with a fresh id
    pub fn new(route_identifier: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            route_identifier: route_identifier.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Permission a team can hold on a route.
///
/// Authorization only ever checks `Use`; `Manage` exists for tooling that
/// administers routes on a team's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoutePermission {
    Use,
    Manage,
}

impl RoutePermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutePermission::Use => "USE",
            RoutePermission::Manage => "MANAGE",
        }
    }
}

impl fmt::Display for RoutePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown permission names in stored data
#[derive(Debug, thiserror::Error)]
#[error("unknown route permission: {0}")]
pub struct ParsePermissionError(pub String);

impl FromStr for RoutePermission {
    type Err = ParsePermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USE" => Ok(RoutePermission::Use),
            "MANAGE" => Ok(RoutePermission::Manage),
            other => Err(ParsePermissionError(other.to_string())),
        }
    }
}

/// Permissions a team holds on one route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRouteGrant {
    /// Granted team
    pub team_id: String,

    /// Granted route
    pub route_id: Uuid,

    /// Permission set; authorization requires `Use`
    pub permissions: HashSet<RoutePermission>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl TeamRouteGrant {
    /// Create an empty grant (no permissions yet)
    pub fn new(team_id: impl Into<String>, route_id: Uuid) -> Self {
        Self {
            team_id: team_id.into(),
            route_id,
            permissions: HashSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Add a permission
    pub fn with_permission(mut self, permission: RoutePermission) -> Self {
        self.permissions.insert(permission);
        self
    }

    /// Whether the grant carries the given permission
    pub fn has(&self, permission: RoutePermission) -> bool {
        self.permissions.contains(&permission)
    }
}
