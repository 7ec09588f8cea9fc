//! Server-side shared state.
//!
//! `CoreState` is wrapped in `Arc` at startup and handed to the axum
//! router. It holds no connection: every request opens its own, so
//! handlers never contend on a shared SQLite handle.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::db;

pub struct CoreState {
    db_path: PathBuf,
}

impl CoreState {
    /// Create state for the database at `db_path`, making sure its parent
    /// directory exists and migrations have run.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::DataDir(e.to_string()))?;
        }
        // Open once so migration failures surface at startup
        db::open_database(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database ready");
        Ok(Self { db_path })
    }

    /// Open a database connection. Most common operation in handlers.
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Cannot prepare data directory: {0}")]
    DataDir(String),
}
