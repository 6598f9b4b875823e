//! SQLite implementation of TeamGrantStore.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use apimux_core::{RoutePermission, TeamGrantStore, TeamRouteGrant};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::Database;

/// SQLite-backed implementation of TeamGrantStore.
pub struct SqliteTeamGrantStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteTeamGrantStore {
    /// Create a new SQLite team grant store.
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

    /// Parse the JSON permissions column. Unreadable data grants nothing.
    fn parse_permissions(raw: &str) -> HashSet<RoutePermission> {
        serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!("[TeamGrantStore] Unreadable permissions column: {}", e);
            HashSet::new()
        })
    }

    /// Create or replace the grant a team holds on a route.
    pub async fn upsert_grant(&self, grant: &TeamRouteGrant) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let permissions = serde_json::to_string(&grant.permissions)?;

        conn.execute(
            "INSERT INTO team_route_grants (id, team_id, route_id, permissions, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(team_id, route_id) DO UPDATE SET permissions = excluded.permissions",
            params![
                Uuid::new_v4().to_string(),
                grant.team_id,
                grant.route_id.to_string(),
                permissions,
                grant.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Remove a team's grant on a route.
    pub async fn remove_grant(&self, team_id: &str, route_id: &Uuid) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute(
            "DELETE FROM team_route_grants WHERE team_id = ?1 AND route_id = ?2",
            params![team_id, route_id.to_string()],
        )?;

        Ok(())
    }
}

#[async_trait]
impl TeamGrantStore for SqliteTeamGrantStore {
    async fn find_grant(
        &self,
        team_id: &str,
        route_id: &Uuid,
    ) -> Result<Option<TeamRouteGrant>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare(
            "SELECT team_id, route_id, permissions, created_at
             FROM team_route_grants
             WHERE team_id = ?1 AND route_id = ?2",
        )?;

        let grant = stmt
            .query_row(params![team_id, route_id.to_string()], |row| {
                let route_id_str: String = row.get(1)?;
                Ok(TeamRouteGrant {
                    team_id: row.get(0)?,
                    route_id: route_id_str.parse().unwrap_or_else(|e| {
                        tracing::warn!(
                            "[TeamGrantStore] Failed to parse UUID '{}': {}",
                            route_id_str,
                            e
                        );
                        Uuid::new_v4()
                    }),
                    permissions: Self::parse_permissions(&row.get::<_, String>(2)?),
                    created_at: Self::parse_datetime(&row.get::<_, String>(3)?),
                })
            })
            .optional()?;

        Ok(grant)
    }
}
