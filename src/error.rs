use thiserror::Error;

use crate::access::policy::DenyReason;
use crate::response::validate::ValidationError;
use crate::survey::validate::SchemaError;

/// How an error is presented to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Error,
    Warning,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Connection(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Conflict(String),

    #[error("Access denied: {0}")]
    Permission(#[from] DenyReason),

    #[error("{0} not found.")]
    NotFound(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cancelled by user")]
    Cancelled,
}

impl AppError {
    /// Alert category and title shown for this error. A vanished document
    /// reports under the same title as a connection failure.
    pub fn alert(&self) -> (AlertKind, &'static str) {
        match self {
            Self::Connection(_) | Self::NotFound(_) => (AlertKind::Error, "Database Error"),
            Self::Validation(ValidationError::MissingAnswers(_)) => {
                (AlertKind::Error, "Validation Error")
            }
            Self::Validation(_) | Self::Schema(_) => (AlertKind::Error, "Input Error"),
            Self::Conflict(_) => (AlertKind::Error, "Update Failed"),
            Self::Permission(_) => (AlertKind::Error, "Security Policy"),
            Self::Settings(_) | Self::Render(_) | Self::Io(_) => (AlertKind::Error, "General Error"),
            Self::Cancelled => (AlertKind::Warning, "Cancelled"),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, message)
                if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(
                    message
                        .clone()
                        .unwrap_or_else(|| "Duplicate value rejected by the database.".to_string()),
                )
            }
            _ => Self::Connection(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Connection(format!("Malformed document: {err}"))
    }
}
