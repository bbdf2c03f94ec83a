use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::ServiceError;
use crate::storage::ObjectStoreError;
use crate::store::StoreError;

/// Error returned by every handler. Rendered as
/// `{"error": <summary>, "details": <diagnostic>}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn bad_request(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, details)
    }

    pub fn not_found(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, details)
    }

    pub fn invalid_body(error: impl Into<String>, rejection: JsonRejection) -> Self {
        Self::bad_request(error, rejection.body_text())
    }

    pub fn validation(error: impl Into<String>, errors: validator::ValidationErrors) -> Self {
        Self::bad_request(error, errors.to_string())
    }

    /// Maps a gateway failure onto a status. `summary` describes the
    /// operation that failed, `not_found` the message used for a 404.
    ///
    /// A create that hits an existing id is reported as 409 Conflict rather
    /// than folded into the generic 500 used for other store failures.
    pub fn from_store(summary: &str, not_found: &str, err: StoreError) -> Self {
        let status = match err {
            StoreError::NotFound => return Self::not_found(not_found, err.to_string()),
            StoreError::Conflict { .. } => StatusCode::CONFLICT,
            StoreError::TableMissing { .. }
            | StoreError::Connection(_)
            | StoreError::Corrupt { .. }
            | StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, summary, err.to_string())
    }

    /// `invalid` is the summary for a rejected request body.
    pub fn from_service(invalid: &str, summary: &str, not_found: &str, err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => Self::validation(invalid, errors),
            ServiceError::Store(err) => Self::from_store(summary, not_found, err),
        }
    }

    pub fn from_object_store(summary: &str, err: ObjectStoreError) -> Self {
        let status = match err {
            ObjectStoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            ObjectStoreError::NoSuchBucket(_) | ObjectStoreError::Backend(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, summary, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.details)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{}", self);
        }
        let body = json!({ "error": self.error, "details": self.details });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn store_kinds_map_to_distinct_statuses_and_hints() {
        let missing = ApiError::from_store(
            "Error creating event",
            "Event not found",
            StoreError::TableMissing { table: "events".into() },
        );
        assert_eq!(missing.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(missing.details.contains("table 'events' does not exist"));

        let connection = ApiError::from_store(
            "Error creating event",
            "Event not found",
            StoreError::Connection("connection refused".into()),
        );
        assert_eq!(connection.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(connection.details.contains("could not reach"));

        let absent = ApiError::from_store("Error getting event", "Event not found", StoreError::NotFound);
        assert_eq!(absent.status, StatusCode::NOT_FOUND);
        assert_eq!(absent.error, "Event not found");
    }

    #[test]
    fn duplicate_id_is_409_not_the_generic_500() {
        let conflict = ApiError::from_store(
            "Error creating event",
            "Event not found",
            StoreError::Conflict { id: Uuid::nil() },
        );
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert_eq!(conflict.error, "Error creating event");
        assert!(conflict.details.contains("already exists"));

        let generic = ApiError::from_store(
            "Error creating event",
            "Event not found",
            StoreError::Backend("boom".into()),
        );
        assert_eq!(generic.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
