//! Store backend trait definition.
//!
//! `StoreBackend` is the single surface that the key vault, pass-phrase store
//! and account registry are written against. [`LocalStore`] performs every
//! operation in-process; `RelayedStore` forwards it to a privileged context
//! that owns a `LocalStore`. Callers pick one when their context starts and
//! never branch on it again.
//!
//! [`LocalStore`]: super::LocalStore

use serde_json::{Map, Value};

use super::types::{Contact, ContactQuery, ContactUpdate, NewContact};
use crate::error::Result;

/// Storage operations reachable from any execution context.
///
/// Every method is one logical operation. Writes run in their own
/// transaction; there is no transaction spanning several calls.
pub trait StoreBackend: Send + Sync {
    // --- Contact directory ---

    /// Save contacts, replacing any existing record with the same email.
    ///
    /// Each contact is written in its own transaction. An empty slice
    /// returns immediately.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Write` if a transaction is aborted.
    fn contact_save(&self, contacts: &[NewContact]) -> Result<()>;

    /// Merge `update` into each listed contact.
    ///
    /// Unpatched fields keep their stored values and every key-derived field
    /// is recomputed. Unknown emails are created from the patch.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Write` if a transaction is aborted.
    fn contact_update(&self, emails: &[String], update: &ContactUpdate) -> Result<()>;

    /// Look up contacts by email or longid.
    ///
    /// # Returns
    ///
    /// One slot per input, in input order, `None` for misses.
    fn contact_get(&self, ids: &[String]) -> Result<Vec<Option<Contact>>>;

    /// Search the directory.
    ///
    /// Contacts with a known key rank ahead of contacts without one.
    ///
    /// # Errors
    ///
    /// Relayed implementations return `VaultError::InvalidQuery` when the
    /// query carries an unrecognized key.
    fn contact_search(&self, query: &ContactQuery) -> Result<Vec<Contact>>;

    /// Delete every contact whose key has this longid.
    ///
    /// # Returns
    ///
    /// The number of contacts removed.
    fn contact_remove_by_longid(&self, longid: &str) -> Result<usize>;

    /// Placeholder contacts still waiting for a remote key lookup.
    fn contact_pending_lookups(&self, limit: Option<usize>) -> Result<Vec<Contact>>;

    // --- Durable settings ---

    /// Write values under an account (`None` for the global scope).
    fn settings_set(&self, account: Option<&str>, values: &Map<String, Value>) -> Result<()>;

    /// Read values under an account; missing keys are absent from the map.
    fn settings_get(&self, account: Option<&str>, keys: &[String]) -> Result<Map<String, Value>>;

    /// Delete keys under an account.
    fn settings_remove(&self, account: Option<&str>, keys: &[String]) -> Result<()>;

    // --- Session tier ---

    /// Store a session value; `None` removes it.
    fn session_set(&self, account: &str, key: &str, value: Option<&str>) -> Result<()>;

    fn session_get(&self, account: &str, key: &str) -> Result<Option<String>>;
}
