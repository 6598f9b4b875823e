//! ApiMux Storage Layer
//!
//! SQLite persistence for the route registry, team grants, and API keys.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 Gateway / Tooling                    │
//! ├──────────────────────────────────────────────────────┤
//! │                Repository Traits                     │
//! │    (RouteRegistry, TeamGrantStore, ApiKeyRepository) │
//! ├──────────────────────────────────────────────────────┤
//! │             SQLite Implementations                   │
//! │  (SqliteRouteRegistry, SqliteTeamGrantStore, ...)    │
//! ├──────────────────────────────────────────────────────┤
//! │                    Database                          │
//! │            (SQLite, WAL, migrations)                 │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use apimux_storage::{Database, SqliteRouteRegistry, SqliteTeamGrantStore};
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! let db = Database::open(&path)?;
//! let db = Arc::new(Mutex::new(db));
//!
//! let registry = SqliteRouteRegistry::new(db.clone())?;
//! let grants = SqliteTeamGrantStore::new(db.clone());
//! ```

mod database;
mod repositories;

pub use database::Database;
pub use repositories::*;

/// Default database file name.
pub const DATABASE_FILE: &str = "apimux.db";

/// Get the default database path for the current platform.
pub fn default_database_path() -> Option<std::path::PathBuf> {
    dirs::data_local_dir().map(|p| p.join("apimux").join(DATABASE_FILE))
}
