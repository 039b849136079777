//! Errors raised by the item store, field setter, query engine and dispatcher

/// Errors from todo operations
///
/// Messages are user-facing and returned verbatim in the `msg` field of
/// error responses.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("No items found for {0}.")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Due date must be a valid date string; could not parse {input}.")]
    InvalidDueDate {
        input: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TodoError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status carried by the error
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::InvalidDueDate { .. } => 400,
        }
    }
}

pub type Result<T> = std::result::Result<T, TodoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_not_found_message() {
        let err = TodoError::NotFound("42".to_string());
        assert_eq!(err.to_string(), "No items found for 42.");
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_due_date_error_keeps_source() {
        let err = TodoError::InvalidDueDate {
            input: "someday".to_string(),
            source: anyhow::anyhow!("unrecognized format").into(),
        };
        assert_eq!(
            err.to_string(),
            "Due date must be a valid date string; could not parse someday."
        );
        assert_eq!(err.status(), 400);
        assert!(err.source().is_some());
    }
}
