//! Shared JSON error body and the mapping from delivery errors to HTTP.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::application::DeliveryError;
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Standard error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl From<DomainError> for ErrorResponse {
    fn from(err: DomainError) -> Self {
        let details = if err.details.is_empty() {
            None
        } else {
            serde_json::to_value(&err.details).ok()
        };
        Self {
            code: err.code.to_string(),
            message: err.message,
            details,
        }
    }
}

impl From<ValidationError> for ErrorResponse {
    fn from(err: ValidationError) -> Self {
        DomainError::from(err).into()
    }
}

/// Response tuple returned by handlers on failure.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a `DeliveryError` to a status code and body.
///
/// Infrastructure failures are logged and surface as a generic 500 so no
/// backend detail reaches the client.
pub fn delivery_error_response(error: DeliveryError) -> ApiError {
    match error {
        DeliveryError::InvalidRequest(message) => {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::bad_request(message)))
        }
        DeliveryError::NotFound(message) => {
            (StatusCode::NOT_FOUND, Json(ErrorResponse::not_found(message)))
        }
        DeliveryError::Unauthenticated(e) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::unauthorized(e.to_string())),
        ),
        other => {
            tracing::error!(error = %other, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Internal server error")),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::AuthError;

    #[test]
    fn invalid_request_maps_to_400() {
        let (status, Json(body)) =
            delivery_error_response(DeliveryError::invalid_request("Cannot send message to yourself"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_REQUEST");
        assert_eq!(body.message, "Cannot send message to yourself");
    }

    #[test]
    fn not_found_maps_to_404() {
        let (status, _) = delivery_error_response(DeliveryError::not_found("Receiver 9 not found"));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthenticated_maps_to_401() {
        let (status, _) =
            delivery_error_response(DeliveryError::Unauthenticated(AuthError::InvalidToken));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn persistence_failure_hides_detail() {
        let (status, Json(body)) = delivery_error_response(DeliveryError::Persistence(
            "connection refused at 10.0.0.3:5432".to_string(),
        ));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert!(!body.message.contains("10.0.0.3"));
    }

    #[test]
    fn error_response_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::bad_request("nope")).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["code"], "INVALID_REQUEST");
    }

    #[test]
    fn validation_error_carries_field_detail() {
        let body = ErrorResponse::from(ValidationError::empty_field("q"));
        assert_eq!(body.code, "VALIDATION_FAILED");
        assert_eq!(body.details, Some(serde_json::json!({"field": "q"})));
    }
}
