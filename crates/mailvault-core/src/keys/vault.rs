//! Per-account list of the user's own keys.
//!
//! The list is stored as one JSON array under the account's `keys` setting.
//! At steady state exactly one entry is primary: the first key added to an
//! empty list, or whichever key inherits the flag when the primary is removed.

use serde_json::{Map, Value};

use super::{build_key_record, KeyInfo, KeyInspector};
use crate::error::{Result, VaultError};
use crate::storage::StoreBackend;

/// Selector matching the primary key.
pub const PRIMARY: &str = "primary";

/// Settings key holding the key list.
pub const KEYS_SETTING: &str = "keys";

pub struct KeyVault<'a> {
    backend: &'a dyn StoreBackend,
    inspector: &'a dyn KeyInspector,
}

impl<'a> KeyVault<'a> {
    pub fn new(backend: &'a dyn StoreBackend, inspector: &'a dyn KeyInspector) -> Self {
        Self { backend, inspector }
    }

    /// All keys for the account, in insertion order.
    pub fn list(&self, account: &str) -> Result<Vec<KeyInfo>> {
        let stored = self
            .backend
            .settings_get(Some(account), &[KEYS_SETTING.to_string()])?;
        match stored.get(KEYS_SETTING) {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(value) => Ok(serde_json::from_value(value.clone())?),
        }
    }

    fn store(&self, account: &str, keys: &[KeyInfo]) -> Result<()> {
        let mut values = Map::new();
        values.insert(KEYS_SETTING.to_string(), serde_json::to_value(keys)?);
        self.backend.settings_set(Some(account), &values)
    }

    /// Add a private key, replacing any key with the same longid.
    ///
    /// A replaced key keeps its primary flag; a new key is primary only if
    /// the list was empty.
    ///
    /// # Returns
    ///
    /// The stored record, or `None` when the key material is unreadable.
    /// Unreadable keys are ignored with a warning, not an error.
    pub fn add(&self, account: &str, armored_private: &str) -> Result<Option<KeyInfo>> {
        let mut keys = self.list(account)?;
        let Some(longid) = self.inspector.longid(armored_private) else {
            tracing::warn!(account, "ignoring key with no readable longid");
            return Ok(None);
        };

        let existing = keys.iter().position(|k| k.longid == longid);
        let primary = match existing {
            Some(index) => keys[index].primary,
            None => keys.is_empty(),
        };
        let record = match build_key_record(self.inspector, armored_private, primary) {
            Ok(record) => record,
            Err(VaultError::InvalidKey(reason)) => {
                tracing::warn!(account, %longid, "ignoring unreadable key: {}", reason);
                return Ok(None);
            }
            Err(other) => return Err(other),
        };

        match existing {
            Some(index) => keys[index] = record.clone(),
            None => keys.push(record.clone()),
        }
        self.store(account, &keys)?;
        Ok(Some(record))
    }

    /// Remove a key by longid.
    ///
    /// If the primary key is removed, the first remaining key becomes
    /// primary.
    ///
    /// # Returns
    ///
    /// `true` if a key was removed.
    pub fn remove(&self, account: &str, longid: &str) -> Result<bool> {
        let mut keys = self.list(account)?;
        let before = keys.len();
        keys.retain(|k| k.longid != longid);
        if keys.len() == before {
            return Ok(false);
        }

        if !keys.iter().any(|k| k.primary) {
            if let Some(first) = keys.first_mut() {
                first.primary = true;
            }
        }
        self.store(account, &keys)?;
        Ok(true)
    }

    /// Select one key by longid, or the primary key with [`PRIMARY`].
    pub fn get(&self, account: &str, selector: &str) -> Result<Option<KeyInfo>> {
        Ok(self
            .list(account)?
            .into_iter()
            .find(|k| matches(k, selector)))
    }

    /// Select every key matching any of the selectors, in list order.
    pub fn get_many<S: AsRef<str>>(&self, account: &str, selectors: &[S]) -> Result<Vec<KeyInfo>> {
        Ok(self
            .list(account)?
            .into_iter()
            .filter(|k| selectors.iter().any(|s| matches(k, s.as_ref())))
            .collect())
    }

    /// Make the key with this longid the only primary key.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::NotFound` if the account has no such key.
    pub fn set_primary(&self, account: &str, longid: &str) -> Result<()> {
        let mut keys = self.list(account)?;
        if !keys.iter().any(|k| k.longid == longid) {
            return Err(VaultError::NotFound(format!("key {}", longid)));
        }
        for key in &mut keys {
            key.primary = key.longid == longid;
        }
        self.store(account, &keys)
    }
}

fn matches(key: &KeyInfo, selector: &str) -> bool {
    if selector == PRIMARY {
        key.primary
    } else {
        key.longid == selector
    }
}
