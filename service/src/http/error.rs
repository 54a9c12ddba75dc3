//! Mapping of core errors onto HTTP responses.

use arteria_core::RunfolderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;
use tokio::task::JoinError;

/// Errors returned by the API handlers.
#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error(transparent)]
    Runfolder(#[from] RunfolderError),
    #[error("background task failed")]
    Join(#[from] JoinError),
}

impl ApiError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        use RunfolderError as RE;
        match *self {
            Self::Runfolder(RE::NotReady(_)) => StatusCode::NOT_FOUND,
            Self::Runfolder(RE::NotMonitored(_) | RE::InvalidState(_)) => StatusCode::BAD_REQUEST,
            Self::Runfolder(_) | Self::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::info!(%status, reason = %self, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}
