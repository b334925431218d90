//! Unified application error types for Keelson.
//!
//! Every crate maps its internal errors into [`AppError`] so they propagate
//! through the `?` operator. An authorization *denial* is never an error:
//! it is a normal decision value. Errors are either faults (the store or
//! configuration misbehaved) or user-facing domain outcomes such as an
//! expired invitation.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested record was not found.
    NotFound,
    /// The acting principal lacks `manage_access` (or exceeds its own grant).
    Forbidden,
    /// Input validation failed.
    Validation,
    /// A uniqueness or concurrency conflict occurred in the store.
    Conflict,
    /// No active grant exists for the (resource, principal) pair.
    GrantNotFound,
    /// No invitation matches the presented token.
    InvalidToken,
    /// The invitation expired before it was redeemed.
    InvitationExpired,
    /// The invitation was withdrawn by an administrator.
    InvitationCancelled,
    /// The redeeming principal is not the invited identity.
    IdentityMismatch,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Return the kind as a stable upper-case code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::GrantNotFound => "GRANT_NOT_FOUND",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvitationExpired => "INVITATION_EXPIRED",
            Self::InvitationCancelled => "INVITATION_CANCELLED",
            Self::IdentityMismatch => "IDENTITY_MISMATCH",
            Self::Database => "DATABASE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether this kind is an infrastructure fault rather than a domain outcome.
    ///
    /// Faults must be treated as a denial by authorization callers but are
    /// reported separately so they can be retried or alerted on.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::Conflict
                | Self::Database
                | Self::Configuration
                | Self::Serialization
                | Self::Internal
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified application error used throughout Keelson.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a grant-not-found error.
    pub fn grant_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GrantNotFound, message)
    }

    /// Create an invalid-token error.
    pub fn invalid_token() -> Self {
        Self::new(ErrorKind::InvalidToken, "Invitation link is not valid")
    }

    /// Create an invitation-expired error.
    pub fn invitation_expired() -> Self {
        Self::new(ErrorKind::InvitationExpired, "Invitation has expired")
    }

    /// Create an invitation-cancelled error.
    pub fn invitation_cancelled() -> Self {
        Self::new(
            ErrorKind::InvitationCancelled,
            "Invitation has been withdrawn",
        )
    }

    /// Create an identity-mismatch error.
    ///
    /// The message is fixed so it never reveals who the invitation was for.
    pub fn identity_mismatch() -> Self {
        Self::new(
            ErrorKind::IdentityMismatch,
            "Invitation was issued to a different account",
        )
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error is an infrastructure fault.
    pub fn is_fault(&self) -> bool {
        self.kind.is_fault()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => ErrorKind::Conflict,
            _ => ErrorKind::Database,
        };
        Self::with_source(kind, format!("Database error: {err}"), err)
    }
}
