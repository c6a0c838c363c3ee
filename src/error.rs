use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Errors a listing handler can surface to the web layer
#[derive(Debug, Error)]
pub enum AppError {
    #[error("an image upload is required")]
    MissingImage,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MissingImage => {
                (StatusCode::BAD_REQUEST, "an image upload is required").into_response()
            }
            AppError::Internal(e) => {
                error!(error = ?e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
        }
    }
}
