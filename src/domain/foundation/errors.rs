//! Domain error types.
//!
//! `ValidationError` is raised while building value objects from client
//! input. `DomainError` pairs a stable `ErrorCode` with a message and is what
//! the HTTP layer turns into a JSON error body.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Rejected client input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::EmptyField { field: field.into() }
    }

    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending input field.
    pub fn field(&self) -> &str {
        match self {
            Self::EmptyField { field }
            | Self::OutOfRange { field, .. }
            | Self::InvalidFormat { field, .. } => field,
        }
    }
}

/// Stable machine-readable codes for HTTP error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    InvalidRequest,
    NotFound,
    UserNotFound,
    MessageNotFound,
    Unauthorized,
    ServiceUnavailable,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::MessageNotFound => "MESSAGE_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coded error with optional key/value details.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let field = err.field().to_string();
        DomainError::new(ErrorCode::ValidationFailed, err.to_string()).with_detail("field", field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_names_bounds_and_value() {
        let err = ValidationError::out_of_range("limit", 1, 100, 150);
        assert_eq!(err.to_string(), "Field 'limit' must be between 1 and 100, got 150");
        assert_eq!(err.field(), "limit");
    }

    #[test]
    fn domain_error_prefixes_code() {
        let err = DomainError::new(ErrorCode::UserNotFound, "User 9 not found");
        assert_eq!(err.to_string(), "[USER_NOT_FOUND] User 9 not found");
        assert!(err.details.is_empty());
    }

    #[test]
    fn validation_failure_becomes_coded_error_with_field() {
        let err: DomainError = ValidationError::empty_field("content").into();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Field 'content' cannot be empty");
        assert_eq!(err.details.get("field").map(String::as_str), Some("content"));
    }

    #[test]
    fn codes_are_screaming_snake_case() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::MessageNotFound,
            ErrorCode::ServiceUnavailable,
        ] {
            let s = code.to_string();
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'), "{}", s);
        }
    }
}
