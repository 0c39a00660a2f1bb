//! Risk assessment operations

use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

use super::database::{Database, now};
use super::models::{Assessment, AssessmentSummary, ImpactCount, NewAssessment, Risk};
use super::risks::{BY_SCORE, RISK_SELECT, complete_status_counts, risk_from_row};
use crate::domain::RiskStatus;

const ASSESSMENT_SELECT: &str = r#"
    SELECT ra.id, ra.title, ra.description, ra.start_date, ra.end_date, ra.status,
           ra.assessor_id, u.username,
           (SELECT COUNT(*) FROM risk_assessment_risks l WHERE l.assessment_id = ra.id),
           ra.created_at, ra.updated_at
    FROM risk_assessments ra
    LEFT JOIN users u ON u.id = ra.assessor_id
"#;

fn assessment_from_row(row: &Row<'_>) -> rusqlite::Result<Assessment> {
    Ok(Assessment {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        status: row.get(5)?,
        assessor_id: row.get(6)?,
        assessor_name: row.get(7)?,
        risk_count: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl Database {
    /// Insert an assessment and link its risks in one transaction
    pub fn create_assessment(&self, assessment: &NewAssessment) -> Result<Assessment> {
        let id = {
            let mut conn = self.lock();
            let tx = conn.transaction()?;
            let ts = now();

            tx.execute(
                r#"
                INSERT INTO risk_assessments (
                    title, description, start_date, end_date, status, assessor_id, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                "#,
                params![
                    assessment.title,
                    assessment.description,
                    assessment.start_date,
                    assessment.end_date,
                    assessment.status,
                    assessment.assessor_id,
                    ts,
                ],
            )
            .context("Failed to insert risk assessment")?;
            let id = tx.last_insert_rowid();

            {
                let mut link = tx.prepare(
                    "INSERT OR IGNORE INTO risk_assessment_risks (assessment_id, risk_id) VALUES (?1, ?2)",
                )?;
                for risk_id in &assessment.risk_ids {
                    link.execute(params![id, risk_id])
                        .with_context(|| format!("Failed to link risk {} to assessment", risk_id))?;
                }
            }

            tx.commit()?;
            id
        };

        debug!(
            assessment_id = id,
            risks = assessment.risk_ids.len(),
            start_date = %assessment.start_date,
            end_date = %assessment.end_date,
            "Risk assessment created"
        );

        self.get_assessment(id)?
            .context("Risk assessment vanished after insert")
    }

    /// Get an assessment by ID
    pub fn get_assessment(&self, id: i64) -> Result<Option<Assessment>> {
        let conn = self.lock();
        conn.query_row(
            &format!("{} WHERE ra.id = ?1", ASSESSMENT_SELECT),
            [id],
            assessment_from_row,
        )
        .optional()
        .context("Failed to query risk assessment")
    }

    /// List assessments, newest first, optionally capped
    pub fn list_assessments(&self, limit: Option<usize>) -> Result<Vec<Assessment>> {
        let conn = self.lock();
        let limit = limit.map_or(-1, |l| l as i64);
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY ra.created_at DESC, ra.id DESC LIMIT ?1",
            ASSESSMENT_SELECT
        ))?;
        let rows = stmt
            .query_map([limit], assessment_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect risk assessment rows")?;
        Ok(rows)
    }

    /// Risks linked to an assessment, highest score first
    pub fn assessment_risks(&self, assessment_id: i64) -> Result<Vec<Risk>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "{} JOIN risk_assessment_risks l ON l.risk_id = r.id WHERE l.assessment_id = ?1 {}",
            RISK_SELECT, BY_SCORE
        ))?;
        let rows = stmt
            .query_map([assessment_id], risk_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect assessment risks")?;
        Ok(rows)
    }

    /// Count an assessment's risks by status and by impact.
    /// Returns None when the assessment does not exist.
    pub fn assessment_summary(&self, assessment_id: i64) -> Result<Option<AssessmentSummary>> {
        let conn = self.lock();

        let exists = conn
            .query_row(
                "SELECT 1 FROM risk_assessments WHERE id = ?1",
                [assessment_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT r.status, COUNT(*)
            FROM risks r JOIN risk_assessment_risks l ON l.risk_id = r.id
            WHERE l.assessment_id = ?1
            GROUP BY r.status
            "#,
        )?;
        let by_status: Vec<(RiskStatus, i64)> = stmt
            .query_map([assessment_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to count assessment risks by status")?;

        let mut stmt = conn.prepare(
            r#"
            SELECT r.impact, COUNT(*)
            FROM risks r JOIN risk_assessment_risks l ON l.risk_id = r.id
            WHERE l.assessment_id = ?1
            GROUP BY r.impact
            ORDER BY r.impact DESC
            "#,
        )?;
        let by_impact = stmt
            .query_map([assessment_id], |row| {
                Ok(ImpactCount {
                    impact: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to count assessment risks by impact")?;

        let total_risks = by_status.iter().map(|(_, c)| c).sum();

        Ok(Some(AssessmentSummary {
            assessment_id,
            total_risks,
            by_status: complete_status_counts(&by_status),
            by_impact,
        }))
    }
}
