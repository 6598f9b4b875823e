//! SQLite implementation of RouteRegistry.
//!
//! Whitelist checks combine a built-in default set with patterns stored
//! in the `whitelisted_paths` table, so deployments can open up paths
//! without a rebuild.

use std::sync::Arc;

use anyhow::Result;
use apimux_core::{matching, PathPatternSet, RouteRecord, RouteRegistry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::Database;

/// Whitelist patterns every deployment starts with.
pub const DEFAULT_WHITELIST: &[&str] = &[
    "/mesh/**",
    "/routes/**",
    "/health/**",
    "/analysis/**",
    "/ws/**",
    "/metrics/**",
    "/api/**",
    "/r/**",
    "/favicon.ico",
    "/fallback/**",
    "/ops/**",
    "/mux/**",
];

/// SQLite-backed implementation of RouteRegistry.
pub struct SqliteRouteRegistry {
    db: Arc<Mutex<Database>>,
    defaults: PathPatternSet,
}

impl SqliteRouteRegistry {
    /// Create a new SQLite route registry.
    pub fn new(db: Arc<Mutex<Database>>) -> Result<Self> {
        Ok(Self {
            db,
            defaults: PathPatternSet::new(DEFAULT_WHITELIST)?,
        })
    }

    /// Parse a datetime string to DateTime<Utc>.
    /// Handles both RFC3339 format and SQLite's `datetime('now')` format.
    fn parse_datetime(s: &str) -> DateTime<Utc> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return dt.with_timezone(&Utc);
        }

        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return dt.and_utc();
        }

        Utc::now()
    }

    fn row_to_route(row: &rusqlite::Row<'_>) -> rusqlite::Result<RouteRecord> {
        let id_str: String = row.get(0)?;
        Ok(RouteRecord {
            id: id_str.parse().unwrap_or_else(|e| {
                tracing::warn!("[RouteRegistry] Failed to parse UUID '{}': {}", id_str, e);
                Uuid::new_v4()
            }),
            route_identifier: row.get(1)?,
            created_at: Self::parse_datetime(&row.get::<_, String>(2)?),
            updated_at: Self::parse_datetime(&row.get::<_, String>(3)?),
        })
    }

    /// Register a new route.
    pub async fn register_route(&self, route: &RouteRecord) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute(
            "INSERT INTO routes (id, route_identifier, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                route.id.to_string(),
                route.route_identifier,
                route.created_at.to_rfc3339(),
                route.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Remove a route; grants on it cascade away.
    pub async fn remove_route(&self, id: &Uuid) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute("DELETE FROM routes WHERE id = ?", params![id.to_string()])?;

        Ok(())
    }

    /// Add a whitelist pattern. The pattern is validated before storage so
    /// a typo cannot silently open or close paths.
    pub async fn add_whitelisted_path(&self, pattern: &str) -> Result<()> {
        matching::compile_pattern(pattern)?;

        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute(
            "INSERT OR IGNORE INTO whitelisted_paths (pattern, created_at)
             VALUES (?1, ?2)",
            params![pattern, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    /// Set (or replace) the required client scope for a scope key.
    pub async fn set_required_scope(&self, scope_key: &str, required_scope: &str) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute(
            "INSERT INTO route_scopes (scope_key, required_scope, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_key) DO UPDATE SET required_scope = excluded.required_scope",
            params![scope_key, required_scope, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }
}

#[async_trait]
impl RouteRegistry for SqliteRouteRegistry {
    async fn is_path_whitelisted(&self, path: &str) -> Result<bool> {
        if self.defaults.matches(path) {
            return Ok(true);
        }

        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare("SELECT pattern FROM whitelisted_paths")?;
        let patterns = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(patterns
            .iter()
            .any(|pattern| matching::pattern_matches(pattern, path)))
    }

    async fn find_route_by_identifier(
        &self,
        route_identifier: &str,
    ) -> Result<Option<RouteRecord>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare(
            "SELECT id, route_identifier, created_at, updated_at
             FROM routes
             WHERE route_identifier = ?",
        )?;

        let route = stmt
            .query_row(params![route_identifier], Self::row_to_route)
            .optional()?;

        Ok(route)
    }

    async fn lookup_required_scope(&self, scope_key: &str) -> Result<Option<String>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let scope = conn
            .query_row(
                "SELECT required_scope FROM route_scopes WHERE scope_key = ?",
                params![scope_key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(scope)
    }
}
