//! Crate-scoped error handling for governors-keys.
//!
//! Key construction and parsing fail with [`KeyError`]. Everything that
//! touches the database folds into [`Error`], which wraps the codec error
//! unchanged so callers can still match on it.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or parsing keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Buffer shorter than its declared fields require.
    #[error("key too short: expected at least {expected} bytes, got {actual}")]
    KeyTooShort { expected: usize, actual: usize },

    /// Leading bytes differ from the prefix the decoder expects.
    #[error(
        "invalid prefix; expected: {}, got: {}",
        hex::encode_upper(.expected),
        hex::encode_upper(.got)
    )]
    InvalidPrefix { expected: Vec<u8>, got: Vec<u8> },

    /// A length-prefixed field does not line up with the rest of the key.
    #[error("declared length {declared} does not match {remaining} remaining bytes")]
    LengthMismatch { declared: usize, remaining: usize },

    /// Address cannot be length-prefixed with a single byte.
    #[error("address length {0} exceeds the 255 byte maximum")]
    AddressTooLong(usize),

    /// Display-format address could not be resolved to raw bytes.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Time field could not be decoded.
    #[error("invalid time bytes: {0}")]
    InvalidTime(String),
}

impl KeyError {
    /// True when the caller handed in a value no key can be built from.
    ///
    /// These indicate a bug upstream rather than a missing or corrupt row.
    pub fn is_precondition(&self) -> bool {
        matches!(self, KeyError::AddressTooLong(_) | KeyError::InvalidAddress(_))
    }
}

/// Main error type exposed to users of the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Key construction or parsing failed
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// Configuration rejected at construction
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Underlying redb failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// A secondary index row points at a missing primary row
    #[error("Dangling index entry {}", hex::encode_upper(.index_key))]
    DanglingIndex { index_key: Vec<u8> },

    /// The prefix table recorded in the store differs from this build's
    #[error(
        "Prefix layout changed: stored {}, current {}",
        hex::encode_upper(.stored),
        hex::encode_upper(.current)
    )]
    PrefixLayoutChanged { stored: Vec<u8>, current: Vec<u8> },
}

impl From<redb::StorageError> for Error {
    fn from(err: redb::StorageError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<redb::TableError> for Error {
    fn from(err: redb::TableError) -> Self {
        Error::Storage(format!("table: {}", err))
    }
}

impl From<redb::TransactionError> for Error {
    fn from(err: redb::TransactionError) -> Self {
        Error::Storage(format!("transaction: {}", err))
    }
}

impl From<redb::CommitError> for Error {
    fn from(err: redb::CommitError) -> Self {
        Error::Storage(format!("commit: {}", err))
    }
}

impl From<redb::DatabaseError> for Error {
    fn from(err: redb::DatabaseError) -> Self {
        Error::Storage(format!("database: {}", err))
    }
}
