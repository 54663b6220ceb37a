//! Error types for Connector
//!
//! Every route failure funnels through [`ConnectorError`], which knows its own
//! HTTP status and JSON body shape.

use hyper::StatusCode;
use serde::Serialize;

/// One failing input field, reported the way clients expect validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub param: String,
    pub msg: String,
}

impl FieldError {
    pub fn new(param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            msg: msg.into(),
        }
    }
}

/// Main error type for Connector operations
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl ConnectorError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidState(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable machine-readable code for the JSON error body
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Database(_) => "DB_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
        }
    }

    /// Message without the variant prefix, for client-facing bodies
    pub fn message(&self) -> String {
        match self {
            Self::Validation(errors) => errors
                .iter()
                .map(|e| e.msg.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::InvalidState(m)
            | Self::Http(m)
            | Self::Auth(m) => m.clone(),
            // Backend details stay in the logs
            Self::Database(_) | Self::Internal(_) | Self::Config(_) => "Server Error".to_string(),
        }
    }

    /// True for failures the caller could not have caused
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<std::io::Error> for ConnectorError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for ConnectorError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for ConnectorError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for ConnectorError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("BSON encoding failed: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for ConnectorError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for Connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;
