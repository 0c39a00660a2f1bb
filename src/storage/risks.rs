//! Risk and risk response operations
//!
//! Every write that touches a risk stores `risk_score` derived from the
//! likelihood and impact it leaves behind.

use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row, Transaction, params};
use tracing::debug;

use super::database::{Database, now};
use super::models::{NewRisk, Risk, RiskResponse, RiskResponseUpdate, StatusCount};
use crate::domain::{RiskStatus, risk_score};

pub(super) const RISK_SELECT: &str = r#"
    SELECT r.id, r.name, r.description,
           r.asset_id, a.name, r.vulnerability_id, v.name, r.threat_id, t.name,
           r.likelihood, r.impact, r.risk_score, r.status, r.mitigation_plan,
           r.created_at, r.updated_at
    FROM risks r
    JOIN assets a ON a.id = r.asset_id
    JOIN vulnerabilities v ON v.id = r.vulnerability_id
    JOIN threats t ON t.id = r.threat_id
"#;

/// Highest score first; unscored rows last
pub(super) const BY_SCORE: &str = "ORDER BY r.risk_score IS NULL, r.risk_score DESC, r.id";

pub(super) fn risk_from_row(row: &Row<'_>) -> rusqlite::Result<Risk> {
    Ok(Risk {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        asset_id: row.get(3)?,
        asset_name: row.get(4)?,
        vulnerability_id: row.get(5)?,
        vulnerability_name: row.get(6)?,
        threat_id: row.get(7)?,
        threat_name: row.get(8)?,
        likelihood: row.get(9)?,
        impact: row.get(10)?,
        risk_score: row.get(11)?,
        status: row.get(12)?,
        mitigation_plan: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Fill in zero counts so every status appears, in declaration order
pub(super) fn complete_status_counts(found: &[(RiskStatus, i64)]) -> Vec<StatusCount> {
    RiskStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: found
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(0, |(_, c)| *c),
        })
        .collect()
}

fn likelihood_of(tx: &Transaction<'_>, id: i64) -> Result<Option<i64>> {
    tx.query_row("SELECT likelihood FROM risks WHERE id = ?1", [id], |row| row.get(0))
        .optional()
        .context("Failed to query risk likelihood")
}

impl Database {
    /// Insert a risk, deriving its score
    pub fn create_risk(&self, risk: &NewRisk) -> Result<Risk> {
        let score = risk_score(risk.likelihood, risk.impact);
        let id = {
            let conn = self.lock();
            let ts = now();
            conn.execute(
                r#"
                INSERT INTO risks (
                    name, description, asset_id, vulnerability_id, threat_id,
                    likelihood, impact, risk_score, status, mitigation_plan,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
                "#,
                params![
                    risk.name,
                    risk.description,
                    risk.asset_id,
                    risk.vulnerability_id,
                    risk.threat_id,
                    risk.likelihood,
                    risk.impact,
                    score,
                    risk.status,
                    risk.mitigation_plan,
                    ts,
                ],
            )
            .context("Failed to insert risk")?;
            conn.last_insert_rowid()
        };

        debug!(
            risk_id = id,
            likelihood = risk.likelihood,
            impact = risk.impact,
            risk_score = score,
            "Risk created"
        );

        self.get_risk(id)?.context("Risk vanished after insert")
    }

    /// Get a risk by ID
    pub fn get_risk(&self, id: i64) -> Result<Option<Risk>> {
        let conn = self.lock();
        conn.query_row(&format!("{} WHERE r.id = ?1", RISK_SELECT), [id], risk_from_row)
            .optional()
            .context("Failed to query risk")
    }

    /// List risks by descending score, optionally restricted to one status
    pub fn list_risks_by_score(&self, status: Option<RiskStatus>) -> Result<Vec<Risk>> {
        let conn = self.lock();
        let rows = match status {
            Some(status) => {
                let mut stmt =
                    conn.prepare(&format!("{} WHERE r.status = ?1 {}", RISK_SELECT, BY_SCORE))?;
                let rows = stmt
                    .query_map([status], risk_from_row)?
                    .collect::<Result<Vec<_>, _>>();
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!("{} {}", RISK_SELECT, BY_SCORE))?;
                let rows = stmt
                    .query_map([], risk_from_row)?
                    .collect::<Result<Vec<_>, _>>();
                rows
            }
        }
        .context("Failed to collect risk rows")?;
        Ok(rows)
    }

    /// Top `limit` risks scoring at least `threshold`
    pub fn list_high_risks(&self, threshold: f64, limit: usize) -> Result<Vec<Risk>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "{} WHERE r.risk_score >= ?1 {} LIMIT ?2",
            RISK_SELECT, BY_SCORE
        ))?;
        let rows = stmt
            .query_map(params![threshold, limit as i64], risk_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect high risk rows")?;
        Ok(rows)
    }

    /// Update status and mitigation plan, and record the response when given.
    /// Returns false when the risk does not exist.
    pub fn update_risk_response(&self, id: i64, update: &RiskResponseUpdate) -> Result<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let Some(likelihood) = likelihood_of(&tx, id)? else {
            return Ok(false);
        };
        let impact: i64 = tx.query_row("SELECT impact FROM risks WHERE id = ?1", [id], |row| row.get(0))?;
        let ts = now();

        tx.execute(
            "UPDATE risks SET status = ?1, mitigation_plan = ?2, risk_score = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                update.status,
                update.mitigation_plan,
                risk_score(likelihood, impact),
                ts,
                id
            ],
        )
        .context("Failed to update risk status")?;

        if let Some(response) = &update.response {
            tx.execute(
                r#"
                INSERT INTO risk_responses (risk_id, response_type, details, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?4)
                ON CONFLICT(risk_id) DO UPDATE SET
                    response_type = excluded.response_type,
                    details = excluded.details,
                    updated_at = excluded.updated_at
                "#,
                params![id, response.response_type, response.details, ts],
            )
            .context("Failed to upsert risk response")?;
        }

        tx.commit()?;

        debug!(
            risk_id = id,
            status = %update.status,
            response = ?update.response.as_ref().map(|r| r.response_type),
            "Risk response updated"
        );

        Ok(true)
    }

    /// Set a risk's impact and rescore it. Returns false when the risk does not exist.
    pub fn update_risk_impact(&self, id: i64, impact: i64) -> Result<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let Some(likelihood) = likelihood_of(&tx, id)? else {
            return Ok(false);
        };
        let score = risk_score(likelihood, impact);

        tx.execute(
            "UPDATE risks SET impact = ?1, risk_score = ?2, updated_at = ?3 WHERE id = ?4",
            params![impact, score, now(), id],
        )
        .context("Failed to update risk impact")?;
        tx.commit()?;

        debug!(risk_id = id, impact = impact, risk_score = score, "Risk impact updated");
        Ok(true)
    }

    /// Get the recorded response of a risk
    pub fn get_risk_response(&self, risk_id: i64) -> Result<Option<RiskResponse>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, risk_id, response_type, details, created_at, updated_at FROM risk_responses WHERE risk_id = ?1",
            [risk_id],
            |row| {
                Ok(RiskResponse {
                    id: row.get(0)?,
                    risk_id: row.get(1)?,
                    response_type: row.get(2)?,
                    details: row.get(3)?,
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            },
        )
        .optional()
        .context("Failed to query risk response")
    }

    /// Count all risks per status
    pub fn risk_status_counts(&self) -> Result<Vec<StatusCount>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM risks GROUP BY status")?;
        let found: Vec<(RiskStatus, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to count risks by status")?;
        Ok(complete_status_counts(&found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResponseType;
    use crate::storage::models::ResponseDecision;
    use crate::storage::testing::{new_risk, seed_graph};

    fn assert_score_invariant(risk: &Risk) {
        assert_eq!(
            risk.risk_score,
            Some(risk.likelihood as f64 * risk.impact as f64 / 2.0),
            "risk {} has a stale score",
            risk.id
        );
    }

    #[test]
    fn test_create_risk_scores_example() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let graph = seed_graph(&db);

        let risk = db.create_risk(&new_risk(&graph, "Breach", 5, 8)).expect("create");
        assert_eq!(risk.risk_score, Some(20.0));
        assert_eq!(risk.status, RiskStatus::Identified);
        assert_eq!(risk.asset_name, "Web server");
        assert_eq!(risk.threat_name, "Attacker");
    }

    #[test]
    fn test_list_by_score_descending() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let graph = seed_graph(&db);
        for (name, l, i) in [("low", 1, 2), ("high", 9, 9), ("mid", 4, 5)] {
            db.create_risk(&new_risk(&graph, name, l, i)).expect("create");
        }

        let names: Vec<String> = db
            .list_risks_by_score(None)
            .expect("list")
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_list_by_score_filters_status() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let graph = seed_graph(&db);
        let mut accepted = new_risk(&graph, "accepted", 2, 2);
        accepted.status = RiskStatus::Accepted;
        db.create_risk(&accepted).expect("create");
        db.create_risk(&new_risk(&graph, "open", 3, 3)).expect("create");

        let rows = db.list_risks_by_score(Some(RiskStatus::Accepted)).expect("list");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "accepted");
    }

    #[test]
    fn test_high_risks_threshold_and_limit() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let graph = seed_graph(&db);
        // scores: 0.5, 7.0, 8.0, 10.0, 12.5, 18.0, 50.0
        for (l, i) in [(1, 1), (2, 7), (4, 4), (4, 5), (5, 5), (6, 6), (10, 10)] {
            db.create_risk(&new_risk(&graph, &format!("r{}x{}", l, i), l, i))
                .expect("create");
        }

        let high = db.list_high_risks(7.0, 5).expect("list");
        let scores: Vec<f64> = high.iter().filter_map(|r| r.risk_score).collect();
        assert_eq!(scores, vec![50.0, 18.0, 12.5, 10.0, 8.0]);

        let all_high = db.list_high_risks(7.0, 10).expect("list");
        assert_eq!(all_high.len(), 6);
    }

    #[test]
    fn test_update_impact_rescores() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let graph = seed_graph(&db);
        let risk = db.create_risk(&new_risk(&graph, "r", 5, 8)).expect("create");

        assert!(db.update_risk_impact(risk.id, 3).expect("update"));
        let updated = db.get_risk(risk.id).expect("query").expect("exists");
        assert_eq!(updated.impact, 3);
        assert_eq!(updated.risk_score, Some(7.5));
        assert_score_invariant(&updated);

        assert!(!db.update_risk_impact(risk.id + 100, 3).expect("update"));
    }

    #[test]
    fn test_update_response_records_decision() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let graph = seed_graph(&db);
        let risk = db.create_risk(&new_risk(&graph, "r", 6, 7)).expect("create");

        let update = RiskResponseUpdate {
            status: RiskStatus::Mitigated,
            mitigation_plan: Some("Patch and add WAF".to_string()),
            response: Some(ResponseDecision {
                response_type: ResponseType::Mitigate,
                details: "Owned by ops".to_string(),
            }),
        };
        assert!(db.update_risk_response(risk.id, &update).expect("update"));

        let updated = db.get_risk(risk.id).expect("query").expect("exists");
        assert_eq!(updated.status, RiskStatus::Mitigated);
        assert_eq!(updated.mitigation_plan.as_deref(), Some("Patch and add WAF"));
        assert_score_invariant(&updated);

        let response = db.get_risk_response(risk.id).expect("query").expect("exists");
        assert_eq!(response.response_type, ResponseType::Mitigate);

        // A second decision replaces the first (one response per risk)
        let update = RiskResponseUpdate {
            status: RiskStatus::Transferred,
            mitigation_plan: None,
            response: Some(ResponseDecision {
                response_type: ResponseType::Transfer,
                details: "Insurance".to_string(),
            }),
        };
        assert!(db.update_risk_response(risk.id, &update).expect("update"));
        let response = db.get_risk_response(risk.id).expect("query").expect("exists");
        assert_eq!(response.response_type, ResponseType::Transfer);
        assert_eq!(response.details, "Insurance");
    }

    #[test]
    fn test_update_response_unknown_risk() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let update = RiskResponseUpdate {
            status: RiskStatus::Accepted,
            mitigation_plan: None,
            response: None,
        };
        assert!(!db.update_risk_response(99, &update).expect("update"));
    }

    #[test]
    fn test_status_counts_include_zeros() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let graph = seed_graph(&db);
        db.create_risk(&new_risk(&graph, "a", 1, 1)).expect("create");
        db.create_risk(&new_risk(&graph, "b", 1, 1)).expect("create");

        let counts = db.risk_status_counts().expect("counts");
        assert_eq!(counts.len(), RiskStatus::ALL.len());
        assert_eq!(counts[0], StatusCount { status: RiskStatus::Identified, count: 2 });
        assert!(counts[1..].iter().all(|c| c.count == 0));
    }

    #[test]
    fn test_deleting_asset_cascades_to_risks() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let graph = seed_graph(&db);
        db.create_risk(&new_risk(&graph, "r", 2, 2)).expect("create");

        db.lock()
            .execute("DELETE FROM assets WHERE id = ?1", [graph.asset_id])
            .expect("delete");
        assert!(db.list_risks_by_score(None).expect("list").is_empty());
    }
}
