//! SQLite implementation of ApiKeyRepository.
//!
//! Keys are looked up by the SHA-256 digest of their raw material; the
//! raw key never reaches the database.

use std::sync::Arc;

use anyhow::Result;
use apimux_core::{ApiKeyRecord, ApiKeyRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::Database;

/// Hash raw API key material for storage and lookup.
pub fn hash_api_key(raw_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// SQLite-backed implementation of ApiKeyRepository.
pub struct SqliteApiKeyRepository {
    db: Arc<Mutex<Database>>,
}

impl SqliteApiKeyRepository {
    /// Create a new SQLite API key repository.
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    fn parse_datetime(s: &str) -> DateTime<Utc> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return dt.with_timezone(&Utc);
        }

        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return dt.and_utc();
        }

        Utc::now()
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ApiKeyRecord> {
        let id_str: String = row.get(0)?;
        Ok(ApiKeyRecord {
            id: id_str.parse().unwrap_or_else(|e| {
                tracing::warn!("[ApiKeyRepository] Failed to parse UUID '{}': {}", id_str, e);
                Uuid::new_v4()
            }),
            team_id: row.get(1)?,
            name: row.get(2)?,
            key_hash: row.get(3)?,
            created_at: Self::parse_datetime(&row.get::<_, String>(4)?),
            expires_at: row
                .get::<_, Option<String>>(5)?
                .map(|s| Self::parse_datetime(&s)),
            revoked: row.get::<_, i32>(6)? == 1,
        })
    }
}

#[async_trait]
impl ApiKeyRepository for SqliteApiKeyRepository {
    async fn find_by_key(&self, raw_key: &str) -> Result<Option<ApiKeyRecord>> {
        let key_hash = hash_api_key(raw_key);

        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare(
            "SELECT id, team_id, name, key_hash, created_at, expires_at, revoked
             FROM api_keys
             WHERE key_hash = ?",
        )?;

        let record = stmt
            .query_row(params![key_hash], Self::row_to_record)
            .optional()?;

        Ok(record)
    }

    async fn create(&self, record: &ApiKeyRecord) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute(
            "INSERT INTO api_keys (id, team_id, name, key_hash, created_at, expires_at, revoked)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.to_string(),
                record.team_id,
                record.name,
                record.key_hash,
                record.created_at.to_rfc3339(),
                record.expires_at.map(|at| at.to_rfc3339()),
                if record.revoked { 1 } else { 0 },
            ],
        )?;

        Ok(())
    }

    async fn revoke(&self, id: &Uuid) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let rows_affected = conn.execute(
            "UPDATE api_keys SET revoked = 1 WHERE id = ?",
            params![id.to_string()],
        )?;

        if rows_affected == 0 {
            anyhow::bail!("API key not found: {}", id);
        }

        Ok(())
    }

    async fn list_for_team(&self, team_id: &str) -> Result<Vec<ApiKeyRecord>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare(
            "SELECT id, team_id, name, key_hash, created_at, expires_at, revoked
             FROM api_keys
             WHERE team_id = ?
             ORDER BY created_at ASC",
        )?;

        let records = stmt
            .query_map(params![team_id], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
