//! Pass-phrase encrypted key backups.
//!
//! A backup is the account's key list serialized as JSON and wrapped with
//! age passphrase encryption (scrypt KDF).

use std::io::{Read, Write};
use std::iter;
use std::path::Path;

use age::secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::KeyInfo;
use crate::error::{Result, VaultError};

/// Settings key recording how the account's keys were last backed up.
pub const BACKUP_METHOD_KEY: &str = "key_backup_method";

/// Minimum pass-phrase length in characters.
const MIN_PASSPHRASE_LENGTH: usize = 8;

const BACKUP_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct BackupPayload {
    version: u32,
    keys: Vec<KeyInfo>,
}

/// Validate a backup pass-phrase.
///
/// # Requirements
///
/// - Not empty or only whitespace
/// - At least 8 characters long
///
/// # Examples
///
/// ```
/// use mailvault_core::keys::backup::validate_passphrase;
///
/// assert!(validate_passphrase("correct horse battery").is_ok());
/// assert!(validate_passphrase("short").is_err());
/// ```
pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.trim().is_empty() {
        return Err(VaultError::InvalidInput(
            "Passphrase cannot be empty".to_string(),
        ));
    }

    let length = passphrase.chars().count();
    if length < MIN_PASSPHRASE_LENGTH {
        return Err(VaultError::InvalidInput(format!(
            "Passphrase must be at least {} characters (got {})",
            MIN_PASSPHRASE_LENGTH, length
        )));
    }

    Ok(())
}

/// Encrypt a key list into backup bytes.
///
/// # Errors
///
/// Returns `VaultError::InvalidInput` for a weak pass-phrase and
/// `VaultError::Crypto` if encryption fails.
pub fn export_backup(keys: &[KeyInfo], passphrase: &str) -> Result<Vec<u8>> {
    validate_passphrase(passphrase)?;
    let payload = serde_json::to_vec(&BackupPayload {
        version: BACKUP_FORMAT_VERSION,
        keys: keys.to_vec(),
    })?;
    encrypt(&payload, passphrase)
}

/// Decrypt backup bytes into the stored key list.
///
/// # Errors
///
/// Returns `VaultError::Crypto` if the pass-phrase is wrong or the data is
/// corrupted, and `VaultError::InvalidInput` for an unknown backup version.
pub fn import_backup(data: &[u8], passphrase: &str) -> Result<Vec<KeyInfo>> {
    let plaintext = decrypt(data, passphrase)?;
    let payload: BackupPayload = serde_json::from_slice(&plaintext)?;
    if payload.version != BACKUP_FORMAT_VERSION {
        return Err(VaultError::InvalidInput(format!(
            "Unsupported backup version {}",
            payload.version
        )));
    }
    Ok(payload.keys)
}

/// Encrypt and write a backup file atomically.
pub fn write_backup(path: &Path, keys: &[KeyInfo], passphrase: &str) -> Result<()> {
    let data = export_backup(keys, passphrase)?;
    crate::fs::write_atomic(path, &data)
}

/// Read and decrypt a backup file.
pub fn read_backup(path: &Path, passphrase: &str) -> Result<Vec<KeyInfo>> {
    let data = std::fs::read(path)?;
    import_backup(&data, passphrase)
}

fn encrypt(data: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let encryptor =
        age::Encryptor::with_user_passphrase(SecretString::from(passphrase.to_string()));

    let mut encrypted = Vec::new();
    let mut writer = encryptor
        .wrap_output(&mut encrypted)
        .map_err(|e| VaultError::Crypto(format!("Failed to create encryptor: {}", e)))?;
    writer
        .write_all(data)
        .map_err(|e| VaultError::Crypto(format!("Encryption write failed: {}", e)))?;
    writer
        .finish()
        .map_err(|e| VaultError::Crypto(format!("Encryption finish failed: {}", e)))?;

    Ok(encrypted)
}

fn decrypt(encrypted: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let decryptor = age::Decryptor::new(encrypted)
        .map_err(|e| VaultError::Crypto(format!("Not a key backup: {}", e)))?;

    let identity = age::scrypt::Identity::new(SecretString::from(passphrase.to_string()));
    let mut reader = decryptor
        .decrypt(iter::once(&identity as &dyn age::Identity))
        .map_err(|e| match e {
            age::DecryptError::NoMatchingKeys
            | age::DecryptError::DecryptionFailed
            | age::DecryptError::KeyDecryptionFailed => {
                VaultError::Crypto("Incorrect passphrase".to_string())
            }
            other => VaultError::Crypto(format!("Decryption failed: {}", other)),
        })?;

    let mut decrypted = Vec::new();
    reader
        .read_to_end(&mut decrypted)
        .map_err(|e| VaultError::Crypto(format!("Failed to read backup: {}", e)))?;
    Ok(decrypted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keywords;

    fn key(longid: &str, primary: bool) -> KeyInfo {
        KeyInfo {
            public: format!("PUBLIC KEY:{}", longid),
            private: format!("PRIVATE KEY:{}", longid),
            fingerprint: format!("{:0>40}", longid),
            longid: longid.to_string(),
            primary,
            keywords: keywords::mnemonic(longid),
        }
    }

    #[test]
    fn test_backup_restores_keys() {
        let keys = vec![key("ABCDEF0123456789", true), key("0123456789ABCDEF", false)];
        let data = export_backup(&keys, "correct horse battery").unwrap();
        assert!(!data.is_empty());

        let restored = import_backup(&data, "correct horse battery").unwrap();
        assert_eq!(restored, keys);
    }

    #[test]
    fn test_wrong_passphrase_is_crypto_error() {
        let data = export_backup(&[key("ABCDEF0123456789", true)], "correct horse battery").unwrap();
        let result = import_backup(&data, "wrong horse battery");
        assert!(matches!(result, Err(VaultError::Crypto(_))));
    }

    #[test]
    fn test_weak_passphrase_rejected() {
        assert!(matches!(export_backup(&[], "short"), Err(VaultError::InvalidInput(_))));
        assert!(validate_passphrase("   \t   ").is_err());
        assert!(validate_passphrase("exactly8").is_ok());
    }

    #[test]
    fn test_garbage_is_not_a_backup() {
        let result = import_backup(b"not an age file", "correct horse battery");
        assert!(matches!(result, Err(VaultError::Crypto(_))));
    }

    #[test]
    fn test_backup_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.age");
        let keys = vec![key("ABCDEF0123456789", true)];

        write_backup(&path, &keys, "correct horse battery").unwrap();
        assert_eq!(read_backup(&path, "correct horse battery").unwrap(), keys);
    }
}
