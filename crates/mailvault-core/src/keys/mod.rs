//! The user's own key material.
//!
//! OpenPGP primitives are not implemented here. Everything that needs to look
//! inside armored key material goes through a [`KeyInspector`], supplied by the
//! embedding application.

pub mod backup;
pub mod keywords;
pub mod vault;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

pub use vault::{KeyVault, PRIMARY};

/// Read-only view into armored key material.
pub trait KeyInspector: Send + Sync {
    /// 16 uppercase hex characters identifying the key, if it can be read.
    fn longid(&self, armored: &str) -> Option<String>;

    /// Full fingerprint, if the key can be read.
    fn fingerprint(&self, armored: &str) -> Option<String>;

    /// Armored public half of a private key.
    fn public_armor(&self, armored_private: &str) -> Option<String>;

    /// BIP39 word rendering of a longid.
    fn keywords(&self, longid: &str) -> String {
        keywords::mnemonic(longid)
    }
}

/// One key owned by the user, scoped to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    pub public: String,
    pub private: String,
    pub fingerprint: String,
    pub longid: String,
    pub primary: bool,
    pub keywords: String,
}

/// Build a [`KeyInfo`] with every metadata field derived from the key.
///
/// # Errors
///
/// Returns `VaultError::InvalidKey` when the inspector cannot read a longid,
/// fingerprint or public half from the armored key.
pub fn build_key_record(
    inspector: &dyn KeyInspector,
    armored_private: &str,
    primary: bool,
) -> Result<KeyInfo> {
    let longid = inspector
        .longid(armored_private)
        .ok_or_else(|| VaultError::InvalidKey("cannot derive longid".to_string()))?;
    let fingerprint = inspector
        .fingerprint(armored_private)
        .ok_or_else(|| VaultError::InvalidKey("cannot derive fingerprint".to_string()))?;
    let public = inspector
        .public_armor(armored_private)
        .ok_or_else(|| VaultError::InvalidKey("cannot derive public key".to_string()))?;
    let keywords = inspector.keywords(&longid);

    Ok(KeyInfo {
        public,
        private: armored_private.to_string(),
        fingerprint,
        longid,
        primary,
        keywords,
    })
}

/// Whether `value` has the shape of a longid: exactly 16 uppercase hex digits.
///
/// Lowercase hex is deliberately rejected; such input is an email lookup.
pub fn is_longid(value: &str) -> bool {
    value.len() == 16 && value.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::KeyInspector;

    /// Reads `KEY:<LONGID>` markers; anything else is unreadable.
    pub struct MarkerInspector;

    impl KeyInspector for MarkerInspector {
        fn longid(&self, armored: &str) -> Option<String> {
            let (_, id) = armored.split_once("KEY:")?;
            let id: String = id.chars().take(16).collect();
            super::is_longid(&id).then_some(id)
        }

        fn fingerprint(&self, armored: &str) -> Option<String> {
            self.longid(armored).map(|id| format!("{:0>40}", id))
        }

        fn public_armor(&self, armored_private: &str) -> Option<String> {
            self.longid(armored_private)
                .map(|id| format!("PUBLIC KEY:{}", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MarkerInspector;
    use super::*;

    #[test]
    fn test_is_longid() {
        assert!(is_longid("ABCDEF0123456789"));
        assert!(!is_longid("abcdef0123456789"));
        assert!(!is_longid("ABCDEF012345678"));
        assert!(!is_longid("ABCDEF012345678G"));
        assert!(!is_longid("a@x.com"));
    }

    #[test]
    fn test_build_key_record_derives_metadata() {
        let record = build_key_record(&MarkerInspector, "PRIVATE KEY:ABCDEF0123456789", true)
            .expect("key should be readable");
        assert_eq!(record.longid, "ABCDEF0123456789");
        assert_eq!(record.fingerprint, "000000000000000000000000ABCDEF0123456789");
        assert_eq!(record.public, "PUBLIC KEY:ABCDEF0123456789");
        assert_eq!(record.keywords, keywords::mnemonic("ABCDEF0123456789"));
        assert!(record.primary);
    }

    #[test]
    fn test_build_key_record_rejects_unreadable_key() {
        let result = build_key_record(&MarkerInspector, "garbage", false);
        assert!(matches!(result, Err(VaultError::InvalidKey(_))));
    }
}
