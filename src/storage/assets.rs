//! Asset and vulnerability operations

use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

use super::database::{Database, now};
use super::models::{Asset, AssetOverview, NewAsset, NewVulnerability, Vulnerability};

const ASSET_COLUMNS: &str = "a.id, a.name, a.description, a.value_cents, a.category, a.created_at, a.updated_at";

const VULNERABILITY_SELECT: &str = r#"
    SELECT v.id, v.name, v.description, v.asset_id, a.name, v.severity, v.created_at, v.updated_at
    FROM vulnerabilities v
    JOIN assets a ON a.id = v.asset_id
"#;

fn asset_from_row(row: &Row<'_>) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        value: row.get(3)?,
        category: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn vulnerability_from_row(row: &Row<'_>) -> rusqlite::Result<Vulnerability> {
    Ok(Vulnerability {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        asset_id: row.get(3)?,
        asset_name: row.get(4)?,
        severity: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Database {
    /// Insert an asset
    pub fn create_asset(&self, asset: &NewAsset) -> Result<Asset> {
        let conn = self.lock();
        let ts = now();

        conn.execute(
            "INSERT INTO assets (name, description, value_cents, category, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![asset.name, asset.description, asset.value, asset.category, ts],
        )
        .context("Failed to insert asset")?;

        let id = conn.last_insert_rowid();
        debug!(asset_id = id, name = %asset.name, "Asset created");

        Ok(Asset {
            id,
            name: asset.name.clone(),
            description: asset.description.clone(),
            value: asset.value,
            category: asset.category.clone(),
            created_at: ts.clone(),
            updated_at: ts,
        })
    }

    /// Get an asset by ID
    pub fn get_asset(&self, id: i64) -> Result<Option<Asset>> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {} FROM assets a WHERE a.id = ?1", ASSET_COLUMNS),
            [id],
            asset_from_row,
        )
        .optional()
        .context("Failed to query asset")
    }

    /// List assets ordered by name, each with its vulnerability count
    pub fn list_assets(&self) -> Result<Vec<AssetOverview>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}, (SELECT COUNT(*) FROM vulnerabilities v WHERE v.asset_id = a.id)
            FROM assets a
            ORDER BY a.name, a.id
            "#,
            ASSET_COLUMNS
        ))?;

        let assets = stmt
            .query_map([], |row| {
                Ok(AssetOverview {
                    asset: asset_from_row(row)?,
                    vulnerability_count: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect asset rows")?;
        Ok(assets)
    }

    /// Insert a vulnerability against an existing asset
    pub fn create_vulnerability(&self, vulnerability: &NewVulnerability) -> Result<Vulnerability> {
        let id = {
            let conn = self.lock();
            let ts = now();
            conn.execute(
                "INSERT INTO vulnerabilities (name, description, asset_id, severity, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    vulnerability.name,
                    vulnerability.description,
                    vulnerability.asset_id,
                    vulnerability.severity,
                    ts
                ],
            )
            .context("Failed to insert vulnerability")?;
            conn.last_insert_rowid()
        };

        debug!(
            vulnerability_id = id,
            asset_id = vulnerability.asset_id,
            severity = vulnerability.severity,
            "Vulnerability created"
        );

        self.get_vulnerability(id)?
            .context("Vulnerability vanished after insert")
    }

    /// Get a vulnerability by ID
    pub fn get_vulnerability(&self, id: i64) -> Result<Option<Vulnerability>> {
        let conn = self.lock();
        conn.query_row(
            &format!("{} WHERE v.id = ?1", VULNERABILITY_SELECT),
            [id],
            vulnerability_from_row,
        )
        .optional()
        .context("Failed to query vulnerability")
    }

    /// List vulnerabilities ordered by name
    pub fn list_vulnerabilities(&self) -> Result<Vec<Vulnerability>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!("{} ORDER BY v.name, v.id", VULNERABILITY_SELECT))?;
        let rows = stmt
            .query_map([], vulnerability_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect vulnerability rows")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Money;
    use crate::storage::testing::sample_asset;

    #[test]
    fn test_create_and_get_asset() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let created = db.create_asset(&sample_asset("Server")).expect("create");

        let fetched = db.get_asset(created.id).expect("query").expect("exists");
        assert_eq!(fetched.name, "Server");
        assert_eq!(fetched.value, Money::from_cents(100_000));
        assert!(db.get_asset(created.id + 1).expect("query").is_none());
    }

    #[test]
    fn test_list_assets_counts_vulnerabilities() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let laptop = db.create_asset(&sample_asset("Laptop")).expect("create");
        db.create_asset(&sample_asset("Database")).expect("create");

        for name in ["Weak password", "Unpatched OS"] {
            db.create_vulnerability(&NewVulnerability {
                name: name.to_string(),
                description: String::new(),
                asset_id: laptop.id,
                severity: 6,
            })
            .expect("create vulnerability");
        }

        let assets = db.list_assets().expect("list");
        let summary: Vec<(&str, i64)> = assets
            .iter()
            .map(|a| (a.asset.name.as_str(), a.vulnerability_count))
            .collect();
        assert_eq!(summary, vec![("Database", 0), ("Laptop", 2)]);
    }

    #[test]
    fn test_vulnerability_requires_existing_asset() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let result = db.create_vulnerability(&NewVulnerability {
            name: "Orphan".to_string(),
            description: String::new(),
            asset_id: 42,
            severity: 3,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_vulnerability_carries_asset_name() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let asset = db.create_asset(&sample_asset("Router")).expect("create");
        let vuln = db
            .create_vulnerability(&NewVulnerability {
                name: "Default credentials".to_string(),
                description: "Factory admin password".to_string(),
                asset_id: asset.id,
                severity: 9,
            })
            .expect("create");

        assert_eq!(vuln.asset_name, "Router");
        assert_eq!(db.list_vulnerabilities().expect("list").len(), 1);
    }
}
