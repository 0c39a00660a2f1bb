//! Storage layer for the risk register
//!
//! SQLite persistence for assets, vulnerabilities, threats, risks,
//! risk responses, assessments and login accounts.
//!
//! # Module Structure
//! - `database`: Database connection and lifecycle management
//! - `models`: Data types and structures
//! - `schema`: Database schema initialization
//! - `assets`, `threats`, `risks`, `assessments`, `users`: per-entity operations
//! - `stats`: Register-wide counts

mod assessments;
mod assets;
mod database;
mod models;
mod risks;
mod schema;
mod stats;
mod threats;
mod users;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public types
pub use database::Database;
pub use models::{
    Assessment, AssessmentSummary, Asset, AssetOverview, ImpactCount, NewAssessment, NewAsset,
    NewRisk, NewThreat, NewVulnerability, ResponseDecision, Risk, RiskResponse,
    RiskResponseUpdate, Stats, StatusCount, Threat, User, UserCredentials, Vulnerability,
};
