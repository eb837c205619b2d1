//! Platform keychain as the durable pass-phrase tier.

use mailvault_core::namespace::storage_key;
use mailvault_core::passphrase::DurableSecrets;
use mailvault_core::{Result, VaultError};

use crate::constants::APP_NAME;

/// Durable secrets kept in the platform keychain, one entry per
/// account-scoped key.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeychainSecrets;

impl DurableSecrets for KeychainSecrets {
    fn store(&self, account: &str, key: &str, value: Option<&str>) -> Result<()> {
        let entry = keychain_entry(&storage_key(Some(account), key))?;
        match value {
            Some(secret) => entry
                .set_password(secret)
                .map_err(|e| VaultError::Storage(format!("Keychain write failed: {}", e))),
            None => match entry.delete_password() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(err) => Err(VaultError::Storage(format!(
                    "Keychain delete failed: {}",
                    err
                ))),
            },
        }
    }

    fn load(&self, account: &str, key: &str) -> Result<Option<String>> {
        let entry = keychain_entry(&storage_key(Some(account), key))?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(VaultError::Storage(format!(
                "Keychain read failed: {}",
                err
            ))),
        }
    }
}

fn keychain_entry(account: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(APP_NAME, account)
        .map_err(|e| VaultError::Storage(format!("Keychain entry failed: {}", e)))
}
