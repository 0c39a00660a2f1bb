//! Error type for page handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::pages;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(what) => (
                StatusCode::NOT_FOUND,
                pages::error_page("Not found", &format!("{} not found.", what)),
            )
                .into_response(),
            Self::Internal(e) => {
                error!(error = %format!("{:#}", e), "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    pages::error_page("Server error", "Something went wrong. Please try again."),
                )
                    .into_response()
            }
        }
    }
}
