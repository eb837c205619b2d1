//! Volatile session tier.
//!
//! Lives only in the memory of the privileged context. Values are wiped when
//! replaced, removed, or when the store is dropped.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use zeroize::Zeroizing;

use crate::error::{Result, VaultError};
use crate::namespace::storage_key;

#[derive(Default)]
pub struct SessionStore {
    values: Mutex<HashMap<String, Zeroizing<String>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Zeroizing<String>>>> {
        self.values
            .lock()
            .map_err(|_| VaultError::Storage("session store poisoned".to_string()))
    }

    /// Store a value, or remove it when `value` is `None`.
    pub fn set(&self, account: &str, key: &str, value: Option<&str>) -> Result<()> {
        let namespaced = storage_key(Some(account), key);
        let mut values = self.lock()?;
        match value {
            Some(value) => {
                values.insert(namespaced, Zeroizing::new(value.to_string()));
            }
            None => {
                values.remove(&namespaced);
            }
        }
        Ok(())
    }

    pub fn get(&self, account: &str, key: &str) -> Result<Option<String>> {
        let values = self.lock()?;
        Ok(values
            .get(&storage_key(Some(account), key))
            .map(|v| v.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let session = SessionStore::new();
        session.set("a@x.com", "passphrase_ABCDEF0123456789", Some("hunter22")).unwrap();
        assert_eq!(
            session.get("a@x.com", "passphrase_ABCDEF0123456789").unwrap().as_deref(),
            Some("hunter22")
        );
        assert_eq!(session.get("b@x.com", "passphrase_ABCDEF0123456789").unwrap(), None);

        session.set("a@x.com", "passphrase_ABCDEF0123456789", None).unwrap();
        assert_eq!(session.get("a@x.com", "passphrase_ABCDEF0123456789").unwrap(), None);
    }
}
