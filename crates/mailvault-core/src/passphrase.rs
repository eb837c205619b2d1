//! Two-tier pass-phrase storage.
//!
//! Entries are keyed by `(account, longid)`. The durable tier survives
//! restarts; the session tier lives only as long as the privileged context.
//! Reads try durable first, then session unless told to skip it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::storage::StoreBackend;

/// Which tier a pass-phrase is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageTier {
    /// Persisted across restarts
    #[serde(rename = "local")]
    Durable,
    /// Kept in memory of the privileged context only
    Session,
}

/// Logical settings key for a pass-phrase.
pub fn passphrase_key(longid: &str) -> String {
    format!("passphrase_{}", longid)
}

/// Alternative durable tier, such as a platform keychain.
pub trait DurableSecrets: Send + Sync {
    /// Store a secret, or remove it when `value` is `None`.
    fn store(&self, account: &str, key: &str, value: Option<&str>) -> Result<()>;

    fn load(&self, account: &str, key: &str) -> Result<Option<String>>;
}

pub struct PassphraseStore<'a> {
    backend: &'a dyn StoreBackend,
    durable: Option<&'a dyn DurableSecrets>,
}

impl<'a> PassphraseStore<'a> {
    /// Pass-phrase store whose durable tier is the settings store.
    pub fn new(backend: &'a dyn StoreBackend) -> Self {
        Self {
            backend,
            durable: None,
        }
    }

    /// Use `durable` instead of the settings store for the durable tier.
    pub fn with_durable(mut self, durable: &'a dyn DurableSecrets) -> Self {
        self.durable = Some(durable);
        self
    }

    /// Save a pass-phrase to one tier. `None` removes it from that tier.
    pub fn save(
        &self,
        tier: StorageTier,
        account: &str,
        longid: &str,
        passphrase: Option<&str>,
    ) -> Result<()> {
        let key = passphrase_key(longid);
        match (tier, self.durable) {
            (StorageTier::Session, _) => self.backend.session_set(account, &key, passphrase),
            (StorageTier::Durable, Some(durable)) => durable.store(account, &key, passphrase),
            (StorageTier::Durable, None) => match passphrase {
                Some(value) => {
                    let mut values = Map::new();
                    values.insert(key, Value::String(value.to_string()));
                    self.backend.settings_set(Some(account), &values)
                }
                None => self.backend.settings_remove(Some(account), &[key]),
            },
        }
    }

    /// Read a pass-phrase: durable tier first, then the session tier unless
    /// `ignore_session` is set.
    pub fn get(&self, account: &str, longid: &str, ignore_session: bool) -> Result<Option<String>> {
        let key = passphrase_key(longid);
        if let Some(stored) = self.load_durable(account, &key)? {
            return Ok(Some(stored));
        }
        if ignore_session {
            return Ok(None);
        }
        self.backend.session_get(account, &key)
    }

    fn load_durable(&self, account: &str, key: &str) -> Result<Option<String>> {
        if let Some(durable) = self.durable {
            return durable.load(account, key);
        }
        let stored = self
            .backend
            .settings_get(Some(account), &[key.to_string()])?;
        Ok(match stored.get(key) {
            Some(Value::String(value)) => Some(value.clone()),
            _ => None,
        })
    }
}
