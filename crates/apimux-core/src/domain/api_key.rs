//! API key entity
//!
//! Raw key material never touches storage; only its SHA-256 digest does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored API key, identified by the hash of its raw key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Owning team
    pub team_id: String,

    /// Human-readable name, matched against the `x-api-key-name` header
    pub name: String,

    /// Hex-encoded SHA-256 digest of the raw key
    pub key_hash: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Optional expiry; `None` means the key does not expire
    pub expires_at: Option<DateTime<Utc>>,

    /// Revoked keys stay stored for audit but never authenticate
    pub revoked: bool,
}

impl ApiKeyRecord {
    /// Create a new record for an already-hashed key
    pub fn new(
        team_id: impl Into<String>,
        name: impl Into<String>,
        key_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id: team_id.into(),
            name: name.into(),
            key_hash: key_hash.into(),
            created_at: Utc::now(),
            expires_at: None,
            revoked: false,
        }
    }

    /// Set an expiry
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the key has passed its expiry
    pub fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if at <= Utc::now())
    }

    /// Whether the key may authenticate requests
    pub fn is_active(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}
