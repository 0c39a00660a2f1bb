//! Threat operations

use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

use super::database::{Database, now};
use super::models::{NewThreat, Threat};

fn threat_from_row(row: &Row<'_>) -> rusqlite::Result<Threat> {
    Ok(Threat {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        threat_type: row.get(3)?,
        likelihood: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Database {
    /// Insert a threat
    pub fn create_threat(&self, threat: &NewThreat) -> Result<Threat> {
        let conn = self.lock();
        let ts = now();

        conn.execute(
            "INSERT INTO threats (name, description, threat_type, likelihood, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![threat.name, threat.description, threat.threat_type, threat.likelihood, ts],
        )
        .context("Failed to insert threat")?;

        let id = conn.last_insert_rowid();
        debug!(threat_id = id, threat_type = %threat.threat_type, "Threat created");

        Ok(Threat {
            id,
            name: threat.name.clone(),
            description: threat.description.clone(),
            threat_type: threat.threat_type,
            likelihood: threat.likelihood,
            created_at: ts.clone(),
            updated_at: ts,
        })
    }

    /// Get a threat by ID
    pub fn get_threat(&self, id: i64) -> Result<Option<Threat>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, name, description, threat_type, likelihood, created_at, updated_at FROM threats WHERE id = ?1",
            [id],
            threat_from_row,
        )
        .optional()
        .context("Failed to query threat")
    }

    /// List threats ordered by name
    pub fn list_threats(&self) -> Result<Vec<Threat>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, threat_type, likelihood, created_at, updated_at FROM threats ORDER BY name, id",
        )?;
        let rows = stmt
            .query_map([], threat_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect threat rows")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ThreatType;

    #[test]
    fn test_create_and_list_threats() {
        let db = Database::new(":memory:").expect("Failed to create database");
        for (name, threat_type) in [("Phishing", ThreatType::Human), ("Flood", ThreatType::Natural)] {
            db.create_threat(&NewThreat {
                name: name.to_string(),
                description: String::new(),
                threat_type,
                likelihood: 4,
            })
            .expect("create");
        }

        let threats = db.list_threats().expect("list");
        assert_eq!(threats[0].name, "Flood");
        assert_eq!(threats[0].threat_type, ThreatType::Natural);
        assert_eq!(threats[1].threat_type, ThreatType::Human);

        let fetched = db.get_threat(threats[1].id).expect("query").expect("exists");
        assert_eq!(fetched.name, "Phishing");
    }

    #[test]
    fn test_unknown_threat_type_in_row_is_an_error() {
        let db = Database::new(":memory:").expect("Failed to create database");
        db.lock()
            .execute(
                "INSERT INTO threats (name, description, threat_type, likelihood, created_at, updated_at) VALUES ('x', '', 'cosmic', 1, 'now', 'now')",
                [],
            )
            .expect("raw insert");
        assert!(db.list_threats().is_err());
    }
}
