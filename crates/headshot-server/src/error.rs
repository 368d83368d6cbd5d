use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use headshot_core::HeadshotError;
use serde_json::json;

/// Wraps a domain error so handlers can return it with `?`.
#[derive(Debug)]
pub struct AppError(pub HeadshotError);

impl From<HeadshotError> for AppError {
    fn from(err: HeadshotError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HeadshotError::NotFound { .. } => StatusCode::NOT_FOUND,
            HeadshotError::Validation(_) => StatusCode::BAD_REQUEST,
            HeadshotError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            HeadshotError::Busy => StatusCode::CONFLICT,
            HeadshotError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}
