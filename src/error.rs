use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{database::StoreError, models::ApiResponse};

/// A rate-limit denial is deliberately not represented here: being told to
/// slow down is a normal outcome (429), while `LimiterUnavailable` means no
/// admission decision could be made at all (503).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Search query is required")]
    MissingQuery,

    #[error("Word not found")]
    NotFound,

    #[error("Word population must be positive")]
    InvalidPopulation,

    #[error("No words available")]
    EmptyPopulation,

    #[error("Repository unavailable: {0}")]
    RepositoryUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Rate limiter unavailable: {0}")]
    LimiterUnavailable(#[source] StoreError),
}

impl AppError {
    pub fn repository(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::RepositoryUnavailable(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingQuery => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidPopulation | Self::EmptyPopulation | Self::RepositoryUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::LimiterUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status.is_server_error() {
            error!("Request failed: {self}");
        }

        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
