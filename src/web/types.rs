//! Request and response types for the JSON API

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::RiskStatus;

/// Query parameters for the risk list
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RiskQuery {
    /// Only risks with this status
    pub status: Option<RiskStatus>,
}

/// Response wrapper for list endpoints
#[derive(Serialize, ToSchema)]
pub struct ListResponse<T: ToSchema> {
    /// List of items
    pub items: Vec<T>,
    /// Total count
    pub total: usize,
}

impl<T: ToSchema> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

/// Error response
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Version info response (build-time information)
#[derive(Serialize, ToSchema)]
pub struct VersionResponse {
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Git commit hash
    #[schema(example = "abc1234")]
    pub commit: String,
    /// Build date
    #[schema(example = "2025-01-11T00:00:00Z")]
    pub build_date: String,
    /// Rust version
    #[schema(example = "1.92.0")]
    pub rust_version: String,
    /// Rust channel (stable, beta, nightly)
    #[schema(example = "stable")]
    pub rust_channel: String,
    /// Target platform
    #[schema(example = "aarch64-apple-darwin")]
    pub platform: String,
    /// LLVM version
    #[schema(example = "19.1")]
    pub llvm_version: String,
}

impl VersionResponse {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: env!("VERGEN_GIT_SHA").to_string(),
            build_date: env!("VERGEN_BUILD_TIMESTAMP").to_string(),
            rust_version: env!("VERGEN_RUSTC_SEMVER").to_string(),
            rust_channel: env!("VERGEN_RUSTC_CHANNEL").to_string(),
            platform: env!("VERGEN_RUSTC_HOST_TRIPLE").to_string(),
            llvm_version: option_env!("VERGEN_RUSTC_LLVM_VERSION")
                .unwrap_or("unknown")
                .to_string(),
        }
    }
}

/// Server status response (runtime information)
#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    /// Server hostname
    #[schema(example = "risk-register-abc123")]
    pub hostname: String,
    /// Server uptime
    #[schema(example = "2h 30m 15s")]
    pub uptime: String,
    /// Registered login users
    #[schema(example = 3)]
    pub users: i64,
}
