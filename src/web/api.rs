//! JSON API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, error};

use super::state::AppState;
use super::types::{ErrorResponse, ListResponse, RiskQuery, StatusResponse, VersionResponse};
use crate::storage::{AssessmentSummary, AssetOverview, Risk, Stats};

fn internal_error(e: anyhow::Error, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    error!(error = %e, "{}", message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!(ErrorResponse::new(e.to_string()))),
    )
}

/// List risks ordered by score
#[utoipa::path(
    get,
    path = "/api/v1/risks",
    tag = "Risks",
    params(RiskQuery),
    responses(
        (status = 200, description = "Risks ordered by score, highest first", body = ListResponse<Risk>),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_risks(
    State(state): State<AppState>,
    Query(query): Query<RiskQuery>,
) -> impl IntoResponse {
    debug!(status = ?query.status, "Listing risks");

    match state.db.list_risks_by_score(query.status) {
        Ok(risks) => (
            StatusCode::OK,
            Json(serde_json::json!(ListResponse::from(risks))),
        ),
        Err(e) => internal_error(e, "Failed to list risks"),
    }
}

/// List assets with their vulnerability counts
#[utoipa::path(
    get,
    path = "/api/v1/assets",
    tag = "Assets",
    responses(
        (status = 200, description = "Assets ordered by name", body = ListResponse<AssetOverview>),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_assets(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.list_assets() {
        Ok(assets) => (
            StatusCode::OK,
            Json(serde_json::json!(ListResponse::from(assets))),
        ),
        Err(e) => internal_error(e, "Failed to list assets"),
    }
}

/// Risk counts for one assessment
#[utoipa::path(
    get,
    path = "/api/v1/assessments/{id}/summary",
    tag = "Assessments",
    params(
        ("id" = i64, Path, description = "Risk assessment ID")
    ),
    responses(
        (status = 200, description = "Counts by status and impact", body = AssessmentSummary),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Assessment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_assessment_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!(ErrorResponse::new("Assessment not found"))),
        )
    };
    let Ok(id) = id.parse::<i64>() else {
        return not_found();
    };

    match state.db.assessment_summary(id) {
        Ok(Some(summary)) => (StatusCode::OK, Json(serde_json::json!(summary))),
        Ok(None) => not_found(),
        Err(e) => internal_error(e, "Failed to summarize assessment"),
    }
}

/// Get statistics
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "Statistics",
    responses(
        (status = 200, description = "Record totals and database size", body = Stats),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.get_stats() {
        Ok(stats) => (StatusCode::OK, Json(serde_json::json!(stats))),
        Err(e) => internal_error(e, "Failed to get stats"),
    }
}

/// Get build version information
#[utoipa::path(
    get,
    path = "/api/v1/version",
    tag = "Version",
    responses(
        (status = 200, description = "Build version information", body = VersionResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn get_version() -> impl IntoResponse {
    Json(VersionResponse::current())
}

/// Get server runtime status
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "Status",
    responses(
        (status = 200, description = "Server runtime status", body = StatusResponse),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.list_users() {
        Ok(users) => {
            let status = StatusResponse {
                hostname: state.runtime.hostname.clone(),
                uptime: state.runtime.uptime_string(),
                users: users.len() as i64,
            };
            (StatusCode::OK, Json(serde_json::json!(status)))
        }
        Err(e) => internal_error(e, "Failed to count users"),
    }
}
