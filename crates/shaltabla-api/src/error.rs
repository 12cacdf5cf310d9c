//! Error types for the leaderboard API.
//!
//! [`ApiError`] unifies every failure a handler can report and converts
//! into a JSON `{error, status}` response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shaltabla_core::engine::EngineError;
use shaltabla_db::DbError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The request body failed validation or could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// The store rejected the operation.
    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::UnknownFriend { .. } => Self::NotFound(e.to_string()),
            EngineError::DuplicateFriend { .. } => Self::Conflict(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::InvalidRequest(msg) | Self::InvalidUuid(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Store(e) => {
                tracing::warn!(error = %e, "Store operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("store error: {e}"))
            }
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use shaltabla_types::FriendId;

    use super::*;

    #[test]
    fn engine_errors_map_to_statuses() {
        let id = FriendId::new();
        let missing = ApiError::from(EngineError::UnknownFriend { id });
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let duplicate = ApiError::from(EngineError::DuplicateFriend { id });
        assert_eq!(duplicate.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_not_found_is_internal() {
        let err = ApiError::from(DbError::NotFound(FriendId::new()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
