//! Register-wide statistics

use anyhow::{Context, Result};

use super::database::Database;
use super::models::Stats;

impl Database {
    /// Get overall statistics
    pub fn get_stats(&self) -> Result<Stats> {
        let (db_size_bytes, db_size_human) = self.get_db_size();

        let (totals, sqlite_version) = {
            let conn = self.lock();

            let sqlite_version: String = conn
                .query_row("SELECT sqlite_version()", [], |row| row.get(0))
                .unwrap_or_else(|_| "unknown".to_string());

            let totals: [i64; 5] = conn
                .query_row(
                    r#"
                    SELECT
                        (SELECT COUNT(*) FROM assets),
                        (SELECT COUNT(*) FROM vulnerabilities),
                        (SELECT COUNT(*) FROM threats),
                        (SELECT COUNT(*) FROM risks),
                        (SELECT COUNT(*) FROM risk_assessments)
                    "#,
                    [],
                    |row| Ok([row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?]),
                )
                .context("Failed to count register rows")?;

            (totals, sqlite_version)
        };

        let [total_assets, total_vulnerabilities, total_threats, total_risks, total_assessments] =
            totals;

        Ok(Stats {
            total_assets,
            total_vulnerabilities,
            total_threats,
            total_risks,
            total_assessments,
            risks_by_status: self.risk_status_counts()?,
            db_size_bytes,
            db_size_human,
            sqlite_version,
        })
    }
}
