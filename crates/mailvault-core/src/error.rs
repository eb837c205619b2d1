//! Error types for Mailvault core operations.
//!
//! Every storage-layer failure is normalized into [`VaultError`] before it
//! reaches a caller, whether the operation ran in-process or was relayed from
//! a restricted context. Callers branch on one shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Mailvault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Core error type for Mailvault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Opening the store is blocked by another holder (retry later)
    #[error("Store is blocked by another open handle")]
    Blocked,

    /// The backing store could not be opened at all
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A write transaction was aborted
    #[error("Write aborted: {0}")]
    Write(String),

    /// A query carried a key outside the recognized set
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Key material could not be interpreted
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The privileged context could not be reached
    #[error("Relay unavailable: {0}")]
    RelayUnavailable(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Encryption or decryption error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl VaultError {
    /// Whether the caller may simply retry later.
    ///
    /// Recoverable conditions are never sent to the error reporter.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VaultError::Blocked | VaultError::Unavailable(_))
    }

    /// Stable machine-readable kind, used on the relay wire.
    pub fn kind(&self) -> &'static str {
        match self {
            VaultError::Blocked => "blocked",
            VaultError::Unavailable(_) => "unavailable",
            VaultError::Write(_) => "write",
            VaultError::InvalidQuery(_) => "invalid_query",
            VaultError::InvalidKey(_) => "invalid_key",
            VaultError::RelayUnavailable(_) => "relay_unavailable",
            VaultError::InvalidInput(_) => "invalid_input",
            VaultError::NotFound(_) => "not_found",
            VaultError::Crypto(_) => "crypto",
            VaultError::Storage(_) | VaultError::Sqlite { .. } | VaultError::Io { .. } => {
                "storage"
            }
            VaultError::Json { .. } => "json",
        }
    }

    fn detail(&self) -> String {
        match self {
            VaultError::Blocked => String::new(),
            VaultError::Unavailable(m)
            | VaultError::Write(m)
            | VaultError::InvalidQuery(m)
            | VaultError::InvalidKey(m)
            | VaultError::RelayUnavailable(m)
            | VaultError::InvalidInput(m)
            | VaultError::NotFound(m)
            | VaultError::Crypto(m)
            | VaultError::Storage(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

/// Serializable form of a [`VaultError`] carried in relay responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub kind: String,
    pub message: String,
}

impl From<&VaultError> for WireError {
    fn from(err: &VaultError) -> Self {
        WireError {
            kind: err.kind().to_string(),
            message: err.detail(),
        }
    }
}

impl From<WireError> for VaultError {
    fn from(wire: WireError) -> Self {
        let WireError { kind, message } = wire;
        match kind.as_str() {
            "blocked" => VaultError::Blocked,
            "unavailable" => VaultError::Unavailable(message),
            "write" => VaultError::Write(message),
            "invalid_query" => VaultError::InvalidQuery(message),
            "invalid_key" => VaultError::InvalidKey(message),
            "relay_unavailable" => VaultError::RelayUnavailable(message),
            "invalid_input" => VaultError::InvalidInput(message),
            "not_found" => VaultError::NotFound(message),
            "crypto" => VaultError::Crypto(message),
            _ => VaultError::Storage(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(VaultError::Blocked.is_recoverable());
        assert!(VaultError::Unavailable("gone".into()).is_recoverable());
        assert!(!VaultError::Write("abort".into()).is_recoverable());
        assert!(!VaultError::InvalidQuery("bad".into()).is_recoverable());
    }

    #[test]
    fn test_wire_error_preserves_variant() {
        let original = VaultError::InvalidQuery("unknown key: sort".into());
        let wire = WireError::from(&original);
        assert_eq!(wire.kind, "invalid_query");

        let rebuilt = VaultError::from(wire);
        assert!(matches!(rebuilt, VaultError::InvalidQuery(ref m) if m == "unknown key: sort"));
    }

    #[test]
    fn test_sqlite_errors_travel_as_storage() {
        let err = VaultError::from(rusqlite::Error::InvalidQuery);
        let wire = WireError::from(&err);
        assert_eq!(wire.kind, "storage");
        assert!(matches!(VaultError::from(wire), VaultError::Storage(_)));
    }
}
