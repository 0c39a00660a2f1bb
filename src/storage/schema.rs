//! Database schema initialization

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info};

const TABLES: [&str; 8] = [
    "users",
    "assets",
    "vulnerabilities",
    "threats",
    "risks",
    "risk_responses",
    "risk_assessments",
    "risk_assessment_risks",
];

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    let fresh: bool = conn
        .query_row(
            "SELECT COUNT(*) = 0 FROM sqlite_master WHERE type='table' AND name='risks'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(true);

    if fresh {
        info!("Creating new database schema");
    } else {
        debug!("Schema already present, ensuring all objects exist");
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS assets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            value_cents INTEGER NOT NULL CHECK (value_cents >= 0),
            category TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS vulnerabilities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            asset_id INTEGER NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
            severity INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS threats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            threat_type TEXT NOT NULL,
            likelihood INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- vulnerability_id is not tied to asset_id here; the risk form checks it
        CREATE TABLE IF NOT EXISTS risks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            asset_id INTEGER NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
            vulnerability_id INTEGER NOT NULL REFERENCES vulnerabilities(id) ON DELETE CASCADE,
            threat_id INTEGER NOT NULL REFERENCES threats(id) ON DELETE CASCADE,
            likelihood INTEGER NOT NULL,
            impact INTEGER NOT NULL,
            risk_score REAL,
            status TEXT NOT NULL DEFAULT 'identified',
            mitigation_plan TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS risk_responses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            risk_id INTEGER NOT NULL UNIQUE REFERENCES risks(id) ON DELETE CASCADE,
            response_type TEXT NOT NULL,
            details TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS risk_assessments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            status TEXT NOT NULL,
            assessor_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS risk_assessment_risks (
            assessment_id INTEGER NOT NULL REFERENCES risk_assessments(id) ON DELETE CASCADE,
            risk_id INTEGER NOT NULL REFERENCES risks(id) ON DELETE CASCADE,
            PRIMARY KEY (assessment_id, risk_id)
        );

        CREATE INDEX IF NOT EXISTS idx_vulnerabilities_asset ON vulnerabilities(asset_id);
        CREATE INDEX IF NOT EXISTS idx_risks_score ON risks(risk_score);
        CREATE INDEX IF NOT EXISTS idx_risks_status ON risks(status);
        CREATE INDEX IF NOT EXISTS idx_assessments_created_at ON risk_assessments(created_at);
        CREATE INDEX IF NOT EXISTS idx_assessment_risks_risk ON risk_assessment_risks(risk_id);
        "#,
    )
    .context("Failed to initialize database schema")?;

    debug!(tables = ?TABLES, "Database schema initialized");

    Ok(())
}
