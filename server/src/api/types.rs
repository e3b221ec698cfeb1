//! Shared API types
//!
//! Every error response has the shape `{ "error": message }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::StoreError;
use crate::domain::QueryError;

/// Message returned for unclassified failures; details stay in the logs
pub const INTERNAL_ERROR_MESSAGE: &str = "Error processing request";

/// Message returned when the table or index does not exist
pub const NOT_FOUND_MESSAGE: &str = "Table not found";

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Store(StoreError::NotFound(resource)) => {
                tracing::debug!(resource = %resource, "Store resource not found");
                Self::not_found(NOT_FOUND_MESSAGE)
            }
            e if e.is_client_error() => Self::bad_request(e.to_string()),
            e => {
                tracing::error!(error = %e, "Query failed");
                Self::internal(INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest { message }
            | Self::NotFound { message }
            | Self::Internal { message } => message,
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_mapping() {
        let cases = [
            (
                QueryError::underspecified(&["userId".to_string()]),
                StatusCode::BAD_REQUEST,
            ),
            (QueryError::CorruptCursor, StatusCode::BAD_REQUEST),
            (QueryError::MissingTableName, StatusCode::BAD_REQUEST),
            (QueryError::MissingSelector, StatusCode::BAD_REQUEST),
            (
                QueryError::CursorEncoding(
                    serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
                ),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                QueryError::Store(StoreError::NotFound("audit".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                QueryError::Store(StoreError::backend("query", "throttled")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::from(QueryError::Store(StoreError::backend(
            "query",
            "arn:aws:dynamodb:secret",
        )));
        match err {
            ApiError::Internal { message } => assert_eq!(message, INTERNAL_ERROR_MESSAGE),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_client_messages_pass_through() {
        match ApiError::from(QueryError::MissingTableName) {
            ApiError::BadRequest { message } => assert_eq!(message, "TableName is required"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
