//! Data models for the storage layer

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Money, ResponseType, RiskStatus, ThreatType};

/// Login account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

/// User row including the stored password hash
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Asset values ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewAsset {
    pub name: String,
    pub description: String,
    pub value: Money,
    pub category: String,
}

/// Stored asset
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Asset {
    pub id: i64,
    #[schema(example = "Customer database")]
    pub name: String,
    pub description: String,
    /// Monetary value with two decimal places
    #[schema(value_type = String, example = "25000.00")]
    pub value: Money,
    #[schema(example = "Data")]
    pub category: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Asset with the number of vulnerabilities recorded against it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssetOverview {
    #[serde(flatten)]
    pub asset: Asset,
    pub vulnerability_count: i64,
}

/// Vulnerability values ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewVulnerability {
    pub name: String,
    pub description: String,
    pub asset_id: i64,
    pub severity: i64,
}

/// Stored vulnerability with its asset name
#[derive(Debug, Clone, Serialize)]
pub struct Vulnerability {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub asset_id: i64,
    pub asset_name: String,
    pub severity: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Threat values ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewThreat {
    pub name: String,
    pub description: String,
    pub threat_type: ThreatType,
    pub likelihood: i64,
}

/// Stored threat
#[derive(Debug, Clone, Serialize)]
pub struct Threat {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub threat_type: ThreatType,
    pub likelihood: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Risk values ready to insert; the score is derived on write
#[derive(Debug, Clone, PartialEq)]
pub struct NewRisk {
    pub name: String,
    pub description: String,
    pub asset_id: i64,
    pub vulnerability_id: i64,
    pub threat_id: i64,
    pub likelihood: i64,
    pub impact: i64,
    pub status: RiskStatus,
    pub mitigation_plan: Option<String>,
}

/// Stored risk joined with the names of what it references
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Risk {
    pub id: i64,
    #[schema(example = "Data breach via SQL injection")]
    pub name: String,
    pub description: String,
    pub asset_id: i64,
    pub asset_name: String,
    pub vulnerability_id: i64,
    pub vulnerability_name: String,
    pub threat_id: i64,
    pub threat_name: String,
    pub likelihood: i64,
    pub impact: i64,
    /// likelihood × impact / 2
    #[schema(example = 20.0)]
    pub risk_score: Option<f64>,
    pub status: RiskStatus,
    pub mitigation_plan: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Response recorded alongside a status change
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDecision {
    pub response_type: ResponseType,
    pub details: String,
}

/// Status change for a risk
#[derive(Debug, Clone, PartialEq)]
pub struct RiskResponseUpdate {
    pub status: RiskStatus,
    pub mitigation_plan: Option<String>,
    pub response: Option<ResponseDecision>,
}

/// Stored risk response
#[derive(Debug, Clone, Serialize)]
pub struct RiskResponse {
    pub id: i64,
    pub risk_id: i64,
    pub response_type: ResponseType,
    pub details: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Assessment values ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssessment {
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub assessor_id: Option<i64>,
    pub risk_ids: Vec<i64>,
}

/// Stored assessment
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub assessor_id: Option<i64>,
    pub assessor_name: Option<String>,
    pub risk_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Count of risks sharing one status
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: RiskStatus,
    pub count: i64,
}

/// Count of risks sharing one impact value
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ImpactCount {
    pub impact: i64,
    pub count: i64,
}

/// Breakdown of the risks linked to an assessment
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssessmentSummary {
    pub assessment_id: i64,
    pub total_risks: i64,
    /// Every status, zero counts included
    pub by_status: Vec<StatusCount>,
    /// Impact values present, highest first
    pub by_impact: Vec<ImpactCount>,
}

/// Overall statistics
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Stats {
    pub total_assets: i64,
    pub total_vulnerabilities: i64,
    pub total_threats: i64,
    pub total_risks: i64,
    pub total_assessments: i64,
    pub risks_by_status: Vec<StatusCount>,
    /// Database size in bytes
    pub db_size_bytes: u64,
    /// Human-readable database size
    #[schema(example = "1.5 MB")]
    pub db_size_human: String,
    pub sqlite_version: String,
}

// Enumerations are stored as their lowercase names.

fn text_column<T: std::str::FromStr>(value: ValueRef<'_>) -> FromSqlResult<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .as_str()?
        .parse()
        .map_err(|e| FromSqlError::Other(Box::new(e)))
}

impl FromSql for RiskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        text_column(value)
    }
}

impl ToSql for RiskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ThreatType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        text_column(value)
    }
}

impl ToSql for ThreatType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ResponseType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        text_column(value)
    }
}

impl ToSql for ResponseType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_i64().map(Money::from_cents)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents()))
    }
}
