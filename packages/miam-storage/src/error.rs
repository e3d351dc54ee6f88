//! Error types for miam-storage

use std::fmt;
use thiserror::Error;

/// Storage error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Requested id is absent
    NotFound,
    /// Malformed id, duplicate entry, value rejected by a guard
    InvalidValue,
    /// Database errors (SQLite)
    Database,
    /// Transaction begin/commit errors
    Transaction,
    /// Serialization/deserialization errors
    Serialization,
    /// Operation used a handle after it was closed
    Closed,
    /// Caller cancelled the operation
    Cancelled,
    /// Caller deadline expired before the operation finished
    DeadlineExceeded,
    /// Internal errors (bugs, poisoned locks)
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidValue => "invalid_value",
            ErrorKind::Database => "database",
            ErrorKind::Transaction => "transaction",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Closed => "closed",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
            ErrorKind::Internal => "internal",
        }
    }

    /// Coarse classification exposed to the transport layer.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::NotFound => ErrorCategory::NotFound,
            ErrorKind::InvalidValue => ErrorCategory::InvalidValue,
            _ => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The three error shapes a caller has to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCategory {
    NotFound,
    InvalidValue,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::InvalidValue => "invalid_value",
            ErrorCategory::Internal => "internal",
        }
    }

    /// Stable wire code for error response bodies
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "RESOURCE_NOT_FOUND",
            ErrorCategory::InvalidValue => "INVALID_ARGUMENT",
            ErrorCategory::Internal => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct StorageError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Prefix the message with the operation that failed, keeping kind and source.
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{}: {}", context, self.message);
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Wire code; expired deadlines get their own code so callers can retry.
    pub fn code(&self) -> &'static str {
        match self.kind {
            ErrorKind::DeadlineExceeded | ErrorKind::Cancelled => "TIMEOUT",
            kind => kind.category().code(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_invalid_value(&self) -> bool {
        self.kind == ErrorKind::InvalidValue
    }

    // Convenience constructors
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn recipe_not_found(recipe_id: impl fmt::Display) -> Self {
        Self::not_found(format!("recipe [{}] not found", recipe_id))
    }

    pub fn ingredient_not_found(ingredient_id: impl fmt::Display) -> Self {
        Self::not_found(format!("ingredient [{}] not found", ingredient_id))
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidValue, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transaction, message)
    }

    pub fn closed(handle: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Closed, format!("{} is closed", handle))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

// SQLite error conversions
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::database(format!("SQLite error: {}", err)).with_source(err)
    }
}

// JSON error conversions
impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::new(ErrorKind::Serialization, format!("JSON error: {}", err)).with_source(err)
    }
}

// Mutex Poison Error (for Mutex<Connection>)
impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(_err: std::sync::PoisonError<T>) -> Self {
        StorageError::internal("Mutex poisoned")
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StorageError>;
