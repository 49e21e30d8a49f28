//! Error types for the link shortener
//!
//! Three closed enums cover the whole crate:
//! - [`GeneratorError`] for bad code generator configuration
//! - [`StorageError`] for failures reported by a [`crate::storage::LinkRecords`] backend
//! - [`LinkError`] for everything the link store hands back to its callers

use thiserror::Error;

/// Raised when a [`crate::generator::CodeGenerator`] is built or reconfigured
/// with an unusable alphabet or length.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("invalid generator configuration: {0}")]
    InvalidConfiguration(String),
}

/// Failure reported by the record storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The unique constraint on the short code column rejected an insert.
    #[error("short code '{0}' is already taken")]
    DuplicateCode(String),

    /// The backend itself failed (I/O, transaction, table access).
    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A stored record could not be encoded or decoded.
    #[error("record serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StorageError::Backend(Box::new(err))
    }
}

// redb reports a different error type per stage of a transaction. Some of
// them carry live transaction handles, so only the message is kept.
macro_rules! backend_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StorageError {
                fn from(err: $ty) -> Self {
                    StorageError::Backend(err.to_string().into())
                }
            }
        )*
    };
}

backend_error_from!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Outcome of a failed link store operation.
///
/// Every variant except [`LinkError::Storage`] is an expected result the
/// caller can act on. `Storage` means the system is unhealthy, and its
/// message is safe to show while `source` keeps the backend detail for logs.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("failed to generate unique code after {attempts} attempts")]
    Exhausted { attempts: usize },

    #[error("{message}")]
    Storage {
        message: String,
        #[source]
        source: StorageError,
    },
}

impl LinkError {
    pub fn validation<T: Into<String>>(message: T) -> Self {
        LinkError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found<T: Into<String>>(message: T) -> Self {
        LinkError::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict<T: Into<String>>(message: T) -> Self {
        LinkError::Conflict {
            message: message.into(),
        }
    }

    pub fn storage<T: Into<String>>(message: T, source: StorageError) -> Self {
        LinkError::Storage {
            message: message.into(),
            source,
        }
    }

    /// Stable machine-readable kind, used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            LinkError::Validation { .. } => "validation",
            LinkError::NotFound { .. } => "not_found",
            LinkError::Conflict { .. } => "conflict",
            LinkError::Exhausted { .. } => "exhausted",
            LinkError::Storage { .. } => "storage",
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
