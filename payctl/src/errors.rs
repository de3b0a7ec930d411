use crate::db::errors::DbError;
use axum::{
    Json,
    extract::{OriginalUri, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

use crate::{AppState, config::Environment};

pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed or out-of-range input the client can fix
    #[error("Validation failed: {}", summarize(.errors))]
    Validation { errors: Vec<FieldError> },

    /// Signup with an email that is already registered
    #[error("User with this email already exists")]
    DuplicateEmail,

    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Protected route called without a bearer token
    #[error("Access token required")]
    Unauthenticated,

    /// Bearer token failed signature or structure checks
    #[error("Invalid token")]
    TokenInvalid,

    /// Bearer token is well-formed but past its expiry
    #[error("Token expired")]
    TokenExpired,

    /// Settlement declined the payment
    #[error("Payment processing failed. Please try again.")]
    PaymentFailed,

    /// No route matched the request
    #[error("Route {path} not found")]
    NotFound { path: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ")
}

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } | Error::PaymentFailed => StatusCode::BAD_REQUEST,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::InvalidCredentials | Error::Unauthenticated | Error::TokenInvalid | Error::TokenExpired => StatusCode::UNAUTHORIZED,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Database(db_err) => match db_err {
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::NotFound | DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { .. } => "Validation failed".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::NotFound | DbError::Other(_) => GENERIC_INTERNAL_MESSAGE.to_string(),
            },
            Error::Internal { .. } | Error::Other(_) => GENERIC_INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    fn field_errors(&self) -> Option<Vec<FieldError>> {
        match self {
            Error::Validation { errors } => Some(errors.clone()),
            _ => None,
        }
    }
}

/// Body of every failed response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorEnvelope {
    /// Always `"error"`
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>, errors: Option<Vec<FieldError>>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            errors,
            timestamp: Utc::now(),
        }
    }
}

/// Full text of a 5xx error, attached to the response so the development-mode
/// middleware can expose it.
#[derive(Debug, Clone)]
struct InternalDetail(String);

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Internal service error: {:#}", self);
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("Authentication error: {}", self);
        } else {
            tracing::info!("Client error: {}", self);
        }

        let envelope = ErrorEnvelope::new(self.user_message(), self.field_errors());
        let mut response = (status, Json(envelope)).into_response();
        if status.is_server_error() {
            response.extensions_mut().insert(InternalDetail(format!("{self:#}")));
        }
        response
    }
}

/// Body-parse failures become validation errors in the standard envelope.
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::validation("body", rejection.body_text())
    }
}

/// Replace the generic 500 message with the underlying error text when running
/// in development mode.
pub async fn expose_internal_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if state.config.environment != Environment::Development {
        return response;
    }

    match response.extensions().get::<InternalDetail>() {
        Some(InternalDetail(detail)) => {
            let status = response.status();
            (status, Json(ErrorEnvelope::new(detail.clone(), None))).into_response()
        }
        None => response,
    }
}

/// Fallback for unmatched paths and for known paths called with an unsupported
/// method. Reports the path as the client sent it, `/api` prefix included.
pub async fn route_not_found(OriginalUri(uri): OriginalUri) -> Error {
    Error::NotFound { path: uri.path().to_string() }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
