use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use listing_schema::ValidationErrors;
use serde_json::json;
use thiserror::Error;

use crate::pagination::InvalidCursor;
use crate::repository::RepositoryError;
use crate::storage::StorageError;

/// Every failure a handler can return, already mapped to its status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("Invalid cursor")]
    InvalidCursor,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Property not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidCursor => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InvalidCursor> for ApiError {
    fn from(_: InvalidCursor) -> Self {
        ApiError::InvalidCursor
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::NotFound,
            RepositoryError::InvalidCursor(_) => ApiError::InvalidCursor,
            RepositoryError::InvalidMedia { index, .. } => ApiError::Validation(ValidationErrors::single(
                format!("mediaData.{index}.id"),
                "Media does not match an unused upload of yours",
            )),
            RepositoryError::Database(_) | RepositoryError::Pool(_) | RepositoryError::Corrupt(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => {
                log::debug!("Rejected request: {}", errors);
                json!({ "error": "Validation failed", "fields": errors.errors })
            }
            ApiError::Storage(detail) | ApiError::Internal(detail) => {
                log::error!("Request failed: {}", detail);
                json!({ "error": "Something went wrong, please try again" })
            }
            other => {
                log::debug!("Request failed: {}", other);
                json!({ "error": other.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_map_to_status_codes() {
        assert_eq!(ApiError::from(RepositoryError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(RepositoryError::Corrupt("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::from(InvalidCursor).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn foreign_media_points_at_its_reference() {
        let ApiError::Validation(errors) = ApiError::from(RepositoryError::InvalidMedia { index: 2, id: 9 }) else {
            panic!("expected validation error");
        };
        assert_eq!(errors.paths().collect::<Vec<_>>(), vec!["mediaData.2.id"]);
    }
}
