//! API error kinds and their fixed HTTP status mapping.

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::identity::AuthError;
use crate::medicines::MedicineError;
use crate::validation::ValidationErrors;

pub const UNAUTHENTICATED_MESSAGE: &str = "Authentication required";
pub const MALFORMED_MESSAGE: &str = "Malformed request body";
pub const MALFORMED_QUERY_MESSAGE: &str = "Malformed query string";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";
pub const INTERNAL_MESSAGE: &str = "An error occurred while processing your request";

/// `{ success: false, message }`
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub success: bool,
    pub message: &'static str,
}

/// `{ success: false, errors: { field: message } }`
#[derive(Debug, Serialize)]
pub struct ValidationBody<'a> {
    pub success: bool,
    pub errors: &'a ValidationErrors,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("{0}")]
    Invalid(ValidationErrors),
    #[error("Malformed request body: {0}")]
    MalformedPayload(String),
    #[error("Malformed query string: {0}")]
    MalformedQuery(String),
    #[error("Method {method} not allowed; allowed: {allow}")]
    MethodNotAllowed { method: Method, allow: Method },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Invalid(_) | ApiError::MalformedPayload(_) | ApiError::MalformedQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Invalid(errors) => {
                let body = ValidationBody {
                    success: false,
                    errors,
                };
                return (status, Json(body)).into_response();
            }
            ApiError::Unauthenticated => UNAUTHENTICATED_MESSAGE,
            ApiError::MalformedPayload(detail) => {
                tracing::debug!(detail, "Rejected malformed body");
                MALFORMED_MESSAGE
            }
            ApiError::MalformedQuery(detail) => {
                tracing::debug!(detail, "Rejected malformed query");
                MALFORMED_QUERY_MESSAGE
            }
            ApiError::MethodNotAllowed { .. } => METHOD_NOT_ALLOWED_MESSAGE,
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                INTERNAL_MESSAGE
            }
        };

        let mut response = (
            status,
            Json(MessageBody {
                success: false,
                message,
            }),
        )
            .into_response();
        if let ApiError::MethodNotAllowed { allow, .. } = &self {
            if let Ok(val) = HeaderValue::from_str(allow.as_str()) {
                response.headers_mut().insert(header::ALLOW, val);
            }
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Identity provider failed");
            }
            other => tracing::debug!(reason = %other, "Authentication rejected"),
        }
        ApiError::Unauthenticated
    }
}

impl From<MedicineError> for ApiError {
    fn from(err: MedicineError) -> Self {
        match err {
            MedicineError::Invalid(errors) => ApiError::Invalid(errors),
            MedicineError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}
