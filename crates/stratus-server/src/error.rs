//! HTTP error mapping.
//!
//! Authentication failures are 401 with a generic body that never says
//! which factor was wrong. Store and crypto faults are 500; their full
//! context is logged server-side only.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use stratus_core::StratusError;
use stratus_rbac::RbacError;
use tracing::error;

pub struct ApiError(StratusError);

impl From<StratusError> for ApiError {
    fn from(err: StratusError) -> Self {
        ApiError(err)
    }
}

impl From<RbacError> for ApiError {
    fn from(err: RbacError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            StratusError::AuthenticationFailed { .. } => {
                (StatusCode::UNAUTHORIZED, "authentication failed".to_string())
            }
            StratusError::AuthorizationDenied { .. } => {
                (StatusCode::FORBIDDEN, "forbidden".to_string())
            }
            StratusError::NotFound { entity, .. } => {
                (StatusCode::NOT_FOUND, format!("{entity} not found"))
            }
            StratusError::AlreadyExists { entity } => {
                (StatusCode::CONFLICT, format!("{entity} already exists"))
            }
            StratusError::Validation { message } => (StatusCode::BAD_REQUEST, message.clone()),
            StratusError::Database(_) | StratusError::Crypto(_) | StratusError::Internal(_) => {
                error!(error = %self.0, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
