use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::rest::dto::ErrorBody;
use crate::domain::error::{DomainError, FieldErrors};

/// REST failure: status plus the JSON error body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                errors: None,
            },
        }
    }

    pub fn validation(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: message.into(),
                errors: Some(errors),
            },
        }
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Body that is not JSON, has the wrong shape, or carries unknown fields.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        let mut errors = FieldErrors::new();
        errors.insert("body".to_string(), vec![rejection.body_text()]);
        Self::validation("Invalid request body", errors)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path: {}", rejection.body_text());
        let mut errors = FieldErrors::new();
        errors.insert("id".to_string(), vec!["Must be a valid UUID.".to_string()]);
        Self::validation("Invalid event id", errors)
    }
}

/// Map a domain error to its HTTP shape.
pub fn map_domain_error(e: &DomainError) -> ApiError {
    match e {
        DomainError::EventNotFound { .. } => ApiError::new(StatusCode::NOT_FOUND, "Event not found"),
        DomainError::ProfileNotFound { .. } => {
            ApiError::new(StatusCode::NOT_FOUND, "Profile not found")
        }
        DomainError::ProfileAlreadyExists { .. } => {
            ApiError::new(StatusCode::CONFLICT, "Profile already exists")
        }
        DomainError::Validation { errors } => ApiError::validation("Invalid input", errors.clone()),
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            ApiError::internal()
        }
    }
}
