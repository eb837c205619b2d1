//! Storage layer for Mailvault.
//!
//! ## Architecture
//!
//! - **directory**: SQLite contact directory with its prefix, key-presence
//!   and longid indexes, plus the query engine
//! - **settings**: durable account-namespaced key-value tier
//! - **session**: volatile in-memory tier of the privileged context
//! - **local**: [`LocalStore`], the direct implementation of [`StoreBackend`]
//!
//! Restricted contexts use `relay::RelayedStore` instead; both implement the
//! same trait, and the choice is made once when the context starts.

pub mod directory;
pub mod index;
pub mod local;
pub mod schema;
pub mod session;
pub mod settings;
pub mod traits;
pub mod types;

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, ErrorCode};

use crate::error::{Result, VaultError};

pub use directory::DirectoryStore;
pub use local::LocalStore;
pub use session::SessionStore;
pub use settings::SettingsStore;
pub use traits::StoreBackend;
pub use types::{Contact, ContactQuery, ContactUpdate, NewContact};

/// How long a connection waits on another writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Open a configured SQLite connection to the shared store file.
pub(crate) fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(classify_open_error)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(classify_open_error)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(classify_open_error)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(classify_open_error)?;
    Ok(conn)
}

/// Map a low-level open failure onto the open error taxonomy.
pub(crate) fn classify_open_error(err: rusqlite::Error) -> VaultError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => VaultError::Blocked,
        Some(ErrorCode::CannotOpen) => VaultError::Unavailable(err.to_string()),
        _ => VaultError::from(err),
    }
}

/// Failures inside a write transaction surface as aborted writes.
pub(crate) fn write_error(err: VaultError) -> VaultError {
    match err {
        VaultError::Sqlite { source } => VaultError::Write(source.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("vault.db");
        let err = open_connection(&path).unwrap_err();
        assert!(matches!(err, VaultError::Unavailable(_)), "got {:?}", err);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_write_error_wraps_sqlite() {
        let err = write_error(VaultError::from(rusqlite::Error::InvalidQuery));
        assert!(matches!(err, VaultError::Write(_)));
    }
}
