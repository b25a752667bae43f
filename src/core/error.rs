//! Typed errors for query composition and execution
//!
//! - [`QueryError`]: what a listing can fail with, as seen by its caller
//! - [`StoreError`]: failures reported by a [`RecordStore`](crate::core::store::RecordStore)
//!
//! Malformed pagination input is never an error: `page` and `limit` fall back
//! to their defaults. Filters are only rejected under
//! [`OperatorPolicy::Strict`](crate::config::OperatorPolicy::Strict); in
//! permissive mode they are not validated against any field or operator
//! allow-list and reach the store as given.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised while composing or executing a listing
#[derive(Debug)]
pub enum QueryError {
    /// Filter on a field outside the schema
    UnknownField { field: String },

    /// Operator outside the vocabulary or not allowed on the field
    UnsupportedOperator { field: String, operator: String },

    /// Value that does not parse as the field's declared kind
    InvalidValue {
        field: String,
        expected: String,
        value: String,
    },

    /// Listing requested for a resource that is not registered
    UnknownResource { resource: String },

    /// The store failed to run the query
    Store(StoreError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnknownField { field } => {
                write!(f, "Field '{}' cannot be used as a filter", field)
            }
            QueryError::UnsupportedOperator { field, operator } => {
                write!(f, "Operator '{}' is not supported on field '{}'", operator, field)
            }
            QueryError::InvalidValue {
                field,
                expected,
                value,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': expected {}",
                    value, field, expected
                )
            }
            QueryError::UnknownResource { resource } => {
                write!(f, "Unknown resource: {}", resource)
            }
            QueryError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Store(e) => Some(e),
            _ => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl QueryError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            QueryError::UnknownField { .. }
            | QueryError::UnsupportedOperator { .. }
            | QueryError::InvalidValue { .. } => StatusCode::BAD_REQUEST,
            QueryError::UnknownResource { .. } => StatusCode::NOT_FOUND,
            QueryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::UnknownField { .. } => "UNKNOWN_FILTER_FIELD",
            QueryError::UnsupportedOperator { .. } => "UNSUPPORTED_OPERATOR",
            QueryError::InvalidValue { .. } => "INVALID_FILTER_VALUE",
            QueryError::UnknownResource { .. } => "UNKNOWN_RESOURCE",
            QueryError::Store(_) => "STORE_ERROR",
        }
    }

    /// Whether the caller's input caused the error
    pub fn is_client_error(&self) -> bool {
        !matches!(self, QueryError::Store(_))
    }

    /// Additional structured details
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            QueryError::UnknownField { field } => Some(serde_json::json!({ "field": field })),
            QueryError::UnsupportedOperator { field, operator } => Some(serde_json::json!({
                "field": field,
                "operator": operator
            })),
            QueryError::InvalidValue {
                field, expected, ..
            } => Some(serde_json::json!({
                "field": field,
                "expected": expected
            })),
            _ => None,
        }
    }
}

impl QueryError {
    /// Convert to an error response
    ///
    /// Store failures keep their message out of the body; it is logged instead.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            QueryError::Store(_) => "Failed to run listing query".to_string(),
            other => other.to_string(),
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details: self.details(),
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        if let QueryError::Store(e) = &self {
            tracing::error!(error = %e, "Listing query failed");
        }

        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        QueryError::Store(err)
    }
}

/// Errors reported by record stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed (connection loss, rejected query, timeout)
    #[error("Store backend error: {0}")]
    Backend(String),

    /// The store cannot evaluate this operator
    #[error("Store does not support operator '{0}'")]
    UnsupportedOperator(String),

    /// A record or query could not be converted
    #[error("Failed to convert record: {0}")]
    Serialization(String),

    #[error("Failed to acquire lock: {0}")]
    LockPoisoned(String),
}
