use miam_search::IndexError;
use miam_storage::{ErrorCategory, ErrorKind, StorageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Search index error: {0}")]
    Index(#[from] IndexError),

    /// Request rejected by a service-level guard
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ServiceError::Storage(err) => err.category(),
            ServiceError::InvalidValue(_) => ErrorCategory::InvalidValue,
            ServiceError::Index(_) | ServiceError::Config(_) => ErrorCategory::Internal,
        }
    }

    /// Stable wire code (`RESOURCE_NOT_FOUND`, `INVALID_ARGUMENT`,
    /// `INTERNAL_ERROR` or `TIMEOUT`)
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Storage(err) => err.code(),
            other => other.category().code(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ServiceError::Storage(StorageError {
                kind: ErrorKind::Cancelled | ErrorKind::DeadlineExceeded,
                ..
            })
        )
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Error body handed to the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
