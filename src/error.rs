//! Error types for the onboarding service.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, error};

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Form error: {0}")]
    Form(#[from] FormError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DatabaseError {
    /// Classify a libSQL failure, splitting out constraint violations.
    pub(crate) fn from_libsql(context: &str, err: libsql::Error) -> Self {
        Self::classify(context, err.to_string())
    }

    fn classify(context: &str, message: String) -> Self {
        if message.contains("UNIQUE constraint failed: users.email") {
            Self::DuplicateEmail(format!("{context}: {message}"))
        } else if message.contains("constraint failed") {
            Self::Constraint(format!("{context}: {message}"))
        } else {
            Self::Query(format!("{context}: {message}"))
        }
    }
}

/// Client-facing validation and domain-rule errors.
///
/// All of these are detected before any storage is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Each index must have at least one component")]
    EmptyPage { index: u32 },

    #[error("Page index {index} appears more than once")]
    DuplicatePageIndex { index: u32 },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Zip code must be exactly 5 characters")]
    InvalidZipCode,

    #[error("Field {0} must not be empty")]
    MissingField(&'static str),

    #[error("Birthday must be an ISO 8601 datetime: {0}")]
    InvalidBirthday(String),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

/// Errors raised by the in-memory form engines (layout editing, answers, signup flow).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Page {index} does not exist")]
    PageNotFound { index: u32 },

    #[error("Component {key} not found on page {index}")]
    ComponentNotFound { key: String, index: u32 },

    #[error("Field {path} expects a {expected} value")]
    KindMismatch { path: String, expected: String },

    #[error("Cannot leave step {step}: {reason}")]
    StepBlocked { step: String, reason: String },
}

/// HTTP client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Request not sent: {0}")]
    Rejected(&'static str),
}

/// Password hashing errors.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),

    #[error("Hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// An `Error` on its way out of an HTTP handler.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl<E: Into<Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationError::MalformedBody(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            Error::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Error::Form(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Error::Database(DatabaseError::DuplicateEmail(detail)) => {
                debug!(detail = %detail, "Duplicate email rejected");
                (
                    StatusCode::CONFLICT,
                    "User with this email already exists".to_string(),
                )
            }
            other => {
                error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
