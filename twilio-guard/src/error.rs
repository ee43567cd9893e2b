//! Rejections produced by the webhook guard.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Why the guard refused to hand a request to the wrapped handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("Method {method} not allowed, expected POST")]
    MethodNotAllowed { method: Method },

    #[error("Missing validation field: {0}")]
    MissingValidationField(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Unreadable request body")]
    UnreadableBody,
}

impl GuardError {
    pub fn missing(field: impl Into<String>) -> Self {
        GuardError::MissingValidationField(field.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GuardError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            GuardError::MissingValidationField(_) | GuardError::InvalidSignature => {
                StatusCode::FORBIDDEN
            }
            GuardError::UnreadableBody => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, self.to_string()).into_response();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}
