//! Database connection and lifecycle management

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

use super::schema::init_schema;

/// SQLite database handle shared by all request handlers
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

impl Database {
    /// Open (or create) the database at `db_path`; `:memory:` is accepted
    pub fn new(db_path: &str) -> Result<Self> {
        info!(path = %db_path, "Initializing database");

        if db_path != ":memory:" {
            Self::prepare_file(Path::new(db_path))?;
        }

        debug!(path = %db_path, "Opening SQLite connection");
        let conn = Connection::open(db_path)
            .inspect_err(|e| error!(path = %db_path, error = %e, "Failed to open SQLite database"))
            .context("Failed to open SQLite database")?;

        conn.pragma_update(None, "foreign_keys", true)
            .context("Failed to enable foreign keys")?;

        let sqlite_version: String = conn
            .query_row("SELECT sqlite_version()", [], |row| row.get(0))
            .unwrap_or_else(|_| "unknown".to_string());

        init_schema(&conn)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: db_path.to_string(),
        };

        let (size_bytes, size_human) = db.get_db_size();
        info!(
            path = %db_path,
            size = %size_human,
            size_bytes = size_bytes,
            sqlite_version = %sqlite_version,
            "Database initialized successfully"
        );

        Ok(db)
    }

    /// Log whether the file exists and create its directory when missing
    fn prepare_file(path: &Path) -> Result<()> {
        match std::fs::metadata(path) {
            Ok(meta) => info!(
                path = %path.display(),
                size = %Self::format_bytes(meta.len()),
                "Found existing database file"
            ),
            Err(_) => info!(path = %path.display(), "Creating new database file"),
        }

        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
                info!(directory = %dir.display(), "Creating database directory");
                std::fs::create_dir_all(dir).context("Failed to create database directory")
            }
            _ => Ok(()),
        }
    }

    /// Lock the connection; a poisoned lock is taken over as is
    pub(super) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// File size in bytes and human-readable; in-memory databases report 0
    pub fn get_db_size(&self) -> (u64, String) {
        let size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);
        (size, Self::format_bytes(size))
    }

    pub(super) fn format_bytes(bytes: u64) -> String {
        const UNITS: [&str; 3] = ["KB", "MB", "GB"];

        if bytes < 1024 {
            return format!("{} B", bytes);
        }
        let mut value = bytes as f64 / 1024.0;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Current time as stored in `created_at` / `updated_at`
pub(super) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
