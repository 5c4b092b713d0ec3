//! Error types for vibe-db.
//!
//! vibe-db uses a hierarchical error system:
//! - `VibeDBError` is the top-level error returned by all public APIs
//! - Specific error types (`StorageError`, `ValidationError`) provide detail
//!
//! Absence is never an error here. A missing or inactive vibe check, an
//! experiment without options, or options that all weigh zero come back as
//! `None` or an empty collection.

use thiserror::Error;

/// Result type alias for vibe-db operations.
pub type Result<T> = std::result::Result<T, VibeDBError>;

/// Top-level error enum for all vibe-db operations.
#[derive(Debug, Error)]
pub enum VibeDBError {
    /// Storage layer error (I/O, corruption, transactions, constraints).
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error.
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of what's wrong with the configuration.
        reason: String,
    },

    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An option payload could not be encoded or decoded as the requested type.
    ///
    /// This signals a schema mismatch between the writer and the reader of a
    /// vibe check and is always surfaced to the caller.
    #[error("Payload error: {0}")]
    Payload(String),

    /// A blocking storage task could not be joined (panicked or cancelled).
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl VibeDBError {
    /// Creates a configuration error with the given reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates a payload error with the given message.
    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }

    /// Creates a runtime error with the given message.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is a payload encoding/decoding error.
    pub fn is_payload(&self) -> bool {
        matches!(self, Self::Payload(_))
    }

    /// Returns true if this error is a uniqueness constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Storage(StorageError::UniqueViolation { .. }))
    }
}

/// Storage-related errors.
///
/// These errors indicate problems with the underlying storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database file or data is corrupted.
    #[error("Database corrupted: {0}")]
    Corrupted(String),

    /// Database is locked by another process.
    #[error("Database is locked by another writer")]
    DatabaseLocked,

    /// Transaction failed (commit, rollback, etc.).
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Record serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error from the redb storage engine.
    #[error("Storage engine error: {0}")]
    Redb(String),

    /// Database schema version doesn't match expected version.
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Expected schema version.
        expected: u32,
        /// Actual schema version found in database.
        found: u32,
    },

    /// A write collided with an existing row under a unique key.
    #[error("Unique constraint violated in '{table}': {key}")]
    UniqueViolation {
        /// Table holding the constraint.
        table: &'static str,
        /// Human-readable form of the colliding key.
        key: String,
    },
}

impl StorageError {
    /// Creates a corruption error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Creates a transaction error with the given message.
    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a unique constraint violation for the given table and key.
    pub fn unique_violation(table: &'static str, key: impl Into<String>) -> Self {
        Self::UniqueViolation {
            table,
            key: key.into(),
        }
    }
}

impl From<redb::Error> for StorageError {
    fn from(err: redb::Error) -> Self {
        StorageError::Redb(err.to_string())
    }
}

impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        StorageError::Redb(err.to_string())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(err: redb::TransactionError) -> Self {
        StorageError::Transaction(err.to_string())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        StorageError::Transaction(format!("Commit failed: {}", err))
    }
}

impl From<redb::TableError> for StorageError {
    fn from(err: redb::TableError) -> Self {
        StorageError::Redb(format!("Table error: {}", err))
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(err: redb::StorageError) -> Self {
        StorageError::Redb(format!("Storage error: {}", err))
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<redb::Error> for VibeDBError {
    fn from(err: redb::Error) -> Self {
        VibeDBError::Storage(StorageError::from(err))
    }
}

impl From<redb::DatabaseError> for VibeDBError {
    fn from(err: redb::DatabaseError) -> Self {
        VibeDBError::Storage(StorageError::from(err))
    }
}

impl From<redb::TransactionError> for VibeDBError {
    fn from(err: redb::TransactionError) -> Self {
        VibeDBError::Storage(StorageError::from(err))
    }
}

impl From<redb::CommitError> for VibeDBError {
    fn from(err: redb::CommitError) -> Self {
        VibeDBError::Storage(StorageError::from(err))
    }
}

impl From<redb::TableError> for VibeDBError {
    fn from(err: redb::TableError) -> Self {
        VibeDBError::Storage(StorageError::from(err))
    }
}

impl From<redb::StorageError> for VibeDBError {
    fn from(err: redb::StorageError) -> Self {
        VibeDBError::Storage(StorageError::from(err))
    }
}

impl From<bincode::Error> for VibeDBError {
    fn from(err: bincode::Error) -> Self {
        VibeDBError::Storage(StorageError::from(err))
    }
}

/// Validation errors for input data.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A field has an invalid value.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the invalid field.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// Content exceeds maximum allowed size.
    #[error("Content too large: {size} bytes (max: {max} bytes)")]
    ContentTooLarge {
        /// Actual content size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max: usize,
    },

    /// A required field is missing or empty.
    #[error("Required field missing: {field}")]
    RequiredField {
        /// Name of the missing field.
        field: String,
    },

    /// Too many items in a collection field.
    #[error("Too many items in '{field}': {count} (max: {max})")]
    TooManyItems {
        /// Name of the field.
        field: String,
        /// Actual count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Another vibe check with the same name is active during part of the
    /// requested window.
    #[error("Vibe check '{name}' overlaps an existing vibe check with the same name")]
    OverlappingVibeCheck {
        /// The conflicting name.
        name: String,
    },
}

impl ValidationError {
    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a content too large error.
    pub fn content_too_large(size: usize, max: usize) -> Self {
        Self::ContentTooLarge { size, max }
    }

    /// Creates a required field error.
    pub fn required_field(field: impl Into<String>) -> Self {
        Self::RequiredField {
            field: field.into(),
        }
    }

    /// Creates a too many items error.
    pub fn too_many_items(field: impl Into<String>, count: usize, max: usize) -> Self {
        Self::TooManyItems {
            field: field.into(),
            count,
            max,
        }
    }

    /// Creates an overlapping vibe check error.
    pub fn overlapping_vibe_check(name: impl Into<String>) -> Self {
        Self::OverlappingVibeCheck { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VibeDBError::config("cache_size_mb must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration error: cache_size_mb must be positive"
        );
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::SchemaVersionMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "Schema version mismatch: expected 2, found 1"
        );
    }

    #[test]
    fn test_unique_violation_display() {
        let err = StorageError::unique_violation("vibes", "abc/def");
        assert_eq!(
            err.to_string(),
            "Unique constraint violated in 'vibes': abc/def"
        );
    }

    #[test]
    fn test_is_unique_violation() {
        let err: VibeDBError = StorageError::unique_violation("vibes", "k").into();
        assert!(err.is_unique_violation());
        assert!(err.is_storage());

        let err: VibeDBError = StorageError::corrupted("bad").into();
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_is_validation() {
        let err: VibeDBError = ValidationError::required_field("name").into();
        assert!(err.is_validation());
        assert!(!err.is_payload());
    }

    #[test]
    fn test_overlap_display() {
        let err = ValidationError::overlapping_vibe_check("button-color");
        assert!(err.to_string().contains("button-color"));
    }

    #[test]
    fn test_payload_error() {
        let err = VibeDBError::payload("expected u32");
        assert!(err.is_payload());
        assert_eq!(err.to_string(), "Payload error: expected u32");
    }

    #[test]
    fn test_error_conversion_chain() {
        fn inner() -> Result<()> {
            Err(StorageError::corrupted("test corruption"))?
        }

        let result = inner();
        assert!(result.unwrap_err().is_storage());
    }
}
