//! Search index errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// Request the index cannot serve as given
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Index directory could not be opened or created
    #[error("Index directory error: {0}")]
    Directory(String),

    /// Any failure reported by Tantivy (writer, commit, reader, search)
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Operation on an index after `close()`
    #[error("Index is closed")]
    Closed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl<T> From<std::sync::PoisonError<T>> for IndexError {
    fn from(_err: std::sync::PoisonError<T>) -> Self {
        IndexError::Internal("Index writer lock poisoned".to_string())
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
