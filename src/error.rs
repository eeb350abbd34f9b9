//! Error taxonomy for the waitlist endpoint and its HTTP rendering.

use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::any::Any;

use crate::models::ErrorBody;
use crate::store::StoreError;
use crate::validation::EmailError;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum WaitlistError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("request body exceeds the size limit")]
    PayloadTooLarge,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("email address is required")]
    MissingEmail,

    #[error("invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("email address is already registered")]
    Duplicate,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("waitlist storage is not configured")]
    StorageUnavailable,

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl WaitlistError {
    pub fn status(&self) -> StatusCode {
        match self {
            WaitlistError::InvalidBody(_)
            | WaitlistError::MissingEmail
            | WaitlistError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            WaitlistError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            WaitlistError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            WaitlistError::Duplicate => StatusCode::CONFLICT,
            WaitlistError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            WaitlistError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            WaitlistError::Storage(_) | WaitlistError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the caller. Backend detail never leaves the server.
    pub fn client_message(&self) -> &'static str {
        match self {
            WaitlistError::InvalidBody(_) => "Invalid request body",
            WaitlistError::PayloadTooLarge => "Request body is too large",
            WaitlistError::MethodNotAllowed => "Method not allowed",
            WaitlistError::MissingEmail => "Email address is required",
            WaitlistError::InvalidEmail(_) => "Invalid email address format",
            WaitlistError::Duplicate => "This email address is already on the waitlist",
            WaitlistError::RateLimited => "Too many requests. Please try again in a minute.",
            WaitlistError::StorageUnavailable => "The waitlist is temporarily unavailable",
            WaitlistError::Storage(_) | WaitlistError::Internal(_) => GENERIC_FAILURE,
        }
    }

    // metrics label
    pub fn reason(&self) -> &'static str {
        match self {
            WaitlistError::InvalidBody(_) => "invalid_body",
            WaitlistError::PayloadTooLarge => "payload_too_large",
            WaitlistError::MethodNotAllowed => "method_not_allowed",
            WaitlistError::MissingEmail => "missing_email",
            WaitlistError::InvalidEmail(_) => "invalid_email",
            WaitlistError::Duplicate => "duplicate",
            WaitlistError::RateLimited => "rate_limited",
            WaitlistError::StorageUnavailable => "storage_unavailable",
            WaitlistError::Storage(_) => "storage_failure",
            WaitlistError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for WaitlistError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => WaitlistError::Duplicate,
            StoreError::Unavailable => WaitlistError::StorageUnavailable,
            StoreError::Backend(detail) => WaitlistError::Storage(detail),
        }
    }
}

impl From<BytesRejection> for WaitlistError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            WaitlistError::PayloadTooLarge
        } else {
            WaitlistError::InvalidBody(rejection.body_text())
        }
    }
}

impl IntoResponse for WaitlistError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "waitlist request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "waitlist request rejected");
        }

        let body = ErrorBody {
            error: self.client_message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Turns a handler panic into the generic 500 body.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    WaitlistError::Internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(WaitlistError::MissingEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            WaitlistError::InvalidEmail(EmailError::TooLong).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WaitlistError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            WaitlistError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(WaitlistError::Duplicate.status(), StatusCode::CONFLICT);
        assert_eq!(WaitlistError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            WaitlistError::StorageUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            WaitlistError::Storage("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_errors_convert() {
        assert!(matches!(
            WaitlistError::from(StoreError::Duplicate),
            WaitlistError::Duplicate
        ));
        assert!(matches!(
            WaitlistError::from(StoreError::Unavailable),
            WaitlistError::StorageUnavailable
        ));
        assert!(matches!(
            WaitlistError::from(StoreError::Backend("conn reset".into())),
            WaitlistError::Storage(_)
        ));
    }

    #[test]
    fn test_backend_detail_is_not_exposed() {
        let err = WaitlistError::Storage("password authentication failed for user".into());
        assert_eq!(err.client_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_panic_becomes_500() {
        let response = handle_panic(Box::new("handler exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_panic(Box::new(String::from("owned payload")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
