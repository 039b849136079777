//! HTTP error type and the `{"msg": ...}` error body

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use std::panic::Location;
use std::time::Duration;

use crate::todo::TodoError;

/// Error body returned to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub msg: String,

    /// Source file of an unhandled failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Source line of an unhandled failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// Application error types with proper categorization
#[derive(Debug)]
pub enum AppError {
    // Validation Errors (400)
    InvalidInput(String),

    // Not Found Errors (404)
    TodoNotFound(String),

    // Unsupported method (501)
    MethodNotAllowed(String),

    /// Request exceeded the configured timeout (408). The handler's blocking
    /// work is not cancelled, so a mutation may still be committed.
    Timeout(Duration),

    /// Unexpected failure (500), with the place it was raised
    Internal {
        error: anyhow::Error,
        location: &'static Location<'static>,
    },
}

impl AppError {
    /// Wrap an unexpected failure, recording the caller's location
    #[track_caller]
    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            error: error.into(),
            location: Location::caller(),
        }
    }

    /// Get error code for logs and metrics
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::TodoNotFound(_) => "TODO_NOT_FOUND",
            Self::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            Self::Timeout(_) => "REQUEST_TIMEOUT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::TodoNotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput(msg) | Self::TodoNotFound(msg) => msg.clone(),
            Self::MethodNotAllowed(method) => format!(
                "Unknown request type {method}. This application only responds to GET and POST requests."
            ),
            Self::Timeout(after) => format!(
                "Request timed out after {}s; changes it carried may still have been saved.",
                after.as_secs()
            ),
            Self::Internal { error, .. } => format!("Internal error: {error}"),
        }
    }

    /// Label for the `result` dimension of the todo action counter
    pub fn metric_result(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::MethodNotAllowed(_) => "invalid",
            Self::TodoNotFound(_) => "not_found",
            Self::Timeout(_) => "timeout",
            Self::Internal { .. } => "error",
        }
    }

    /// Convert to structured error response
    pub fn to_response(&self) -> ErrorResponse {
        let location = match self {
            Self::Internal { location, .. } => Some(*location),
            _ => None,
        };
        ErrorResponse {
            msg: self.message(),
            file: location.map(|l| l.file().to_string()),
            line: location.map(|l| l.line()),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl From<TodoError> for AppError {
    fn from(err: TodoError) -> Self {
        if let TodoError::InvalidDueDate { source, .. } = &err {
            tracing::debug!(error = %source, "Due date rejected");
        }
        match err.status() {
            404 => Self::TodoNotFound(err.to_string()),
            _ => Self::InvalidInput(err.to_string()),
        }
    }
}

/// `?` on an `anyhow::Result` records where it was applied
impl From<anyhow::Error> for AppError {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err)
    }
}

/// Axum IntoResponse implementation for proper HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response();

        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            tracing::error!(
                code = self.code(),
                file = body.file.as_deref(),
                line = body.line,
                "{}",
                body.msg
            );
        }

        (status, Json(body)).into_response()
    }
}

/// Response for a panic caught by `CatchPanicLayer`
pub fn panic_response(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "Request handler panicked");

    let body = ErrorResponse {
        msg: format!("Internal error: {detail}"),
        file: None,
        line: None,
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Error from the service layers around the router: a timeout, or anything
/// else a layer failed with
pub fn service_error(err: tower::BoxError, timeout: Duration) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!(timeout_secs = timeout.as_secs(), "Request timed out");
        AppError::Timeout(timeout)
    } else {
        AppError::internal(anyhow::anyhow!("Unhandled service error: {err}"))
    }
}

/// Type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::InvalidInput("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(TodoError::NotFound("7".to_string())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::MethodNotAllowed("PUT".to_string()).status_code(),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            AppError::internal(anyhow::anyhow!("failed")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_core_messages_pass_through() {
        let err = AppError::from(TodoError::NotFound("7".to_string()));
        assert_eq!(err.to_response().msg, "No items found for 7.");

        let err = AppError::from(TodoError::validation("Priority must be a positive integer."));
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(err.message(), "Priority must be a positive integer.");
    }

    #[test]
    fn test_method_message() {
        let err = AppError::MethodNotAllowed("DELETE".to_string());
        assert_eq!(
            err.message(),
            "Unknown request type DELETE. This application only responds to GET and POST requests."
        );
        assert!(err.to_response().file.is_none());
    }

    #[test]
    fn test_internal_records_location() {
        fn fails() -> Result<()> {
            Err::<(), _>(anyhow::anyhow!("disk on fire"))?;
            Ok(())
        }

        let response = fails().unwrap_err().to_response();
        assert!(response.msg.contains("disk on fire"));
        assert_eq!(response.file.as_deref(), Some(file!()));
        assert!(response.line.is_some());
    }

    #[test]
    fn test_error_body_omits_location() {
        let body = serde_json::to_value(AppError::InvalidInput("x".to_string()).to_response())
            .unwrap();
        assert_eq!(body, serde_json::json!({"msg": "x"}));
    }

    #[test]
    fn test_service_error_mapping() {
        let timeout = Duration::from_secs(30);

        let err = service_error(Box::new(tower::timeout::error::Elapsed::new()), timeout);
        assert_eq!(err.status_code(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            err.message(),
            "Request timed out after 30s; changes it carried may still have been saved."
        );

        let err = service_error("layer broke".into(), timeout);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
