//! Account-scoped storage key derivation.
//!
//! Every logical settings key is stored as `prefix(account) + key`. The
//! prefix keeps only the ASCII alphanumerics of the account, lower-cased, so
//! the separator can never occur inside it and a namespaced key always splits
//! back into exactly one logical key for a given account.

use std::collections::BTreeMap;

/// Reserved scope for settings that belong to no single account.
pub const GLOBAL_SCOPE: &str = "global";

const KEY_PREFIX: &str = "mailvault_";
const SEPARATOR: char = '_';

/// Namespace prefix for an account (`None` selects the global scope).
pub fn account_prefix(account: Option<&str>) -> String {
    let account = account.unwrap_or(GLOBAL_SCOPE);
    let sanitized: String = account
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    format!("{}{}{}", KEY_PREFIX, sanitized, SEPARATOR)
}

/// Derive the storage key for one logical key.
pub fn storage_key(account: Option<&str>, key: &str) -> String {
    format!("{}{}", account_prefix(account), key)
}

/// Derive storage keys for every (account, key) pair, accounts outermost.
pub fn storage_keys<A, K>(accounts: &[A], keys: &[K]) -> Vec<String>
where
    A: AsRef<str>,
    K: AsRef<str>,
{
    accounts
        .iter()
        .flat_map(|account| {
            let prefix = account_prefix(Some(account.as_ref()));
            keys.iter()
                .map(move |key| format!("{}{}", prefix, key.as_ref()))
        })
        .collect()
}

/// Undo [`storage_key`] for a record read back from storage.
///
/// Entries that do not carry this account's prefix are dropped.
pub fn strip_namespace<V: Clone>(
    account: Option<&str>,
    record: &BTreeMap<String, V>,
) -> BTreeMap<String, V> {
    let prefix = account_prefix(account);
    record
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(prefix.as_str())
                .map(|logical| (logical.to_string(), value.clone()))
        })
        .collect()
}

/// Split a record holding several accounts' keys into one record per account.
pub fn strip_namespace_by_account<A, V>(
    accounts: &[A],
    record: &BTreeMap<String, V>,
) -> BTreeMap<String, BTreeMap<String, V>>
where
    A: AsRef<str>,
    V: Clone,
{
    accounts
        .iter()
        .map(|account| {
            let account = account.as_ref();
            (account.to_string(), strip_namespace(Some(account), record))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_sanitizes_account() {
        assert_eq!(account_prefix(Some("Ann.Lee+work@Example.com")), "mailvault_annleeworkexamplecom_");
        assert_eq!(account_prefix(None), "mailvault_global_");
    }

    #[test]
    fn test_storage_keys_cover_every_pair() {
        let keys = storage_keys(&["a@x.com", "b@y.com"], &["keys", "setup_done"]);
        assert_eq!(
            keys,
            vec![
                "mailvault_axcom_keys",
                "mailvault_axcom_setup_done",
                "mailvault_byycom_keys",
                "mailvault_byycom_setup_done",
            ]
        );
    }

    #[test]
    fn test_round_trip() {
        let account = Some("someone@example.org");
        for key in ["keys", "passphrase_ABCDEF0123456789", "", "mailvault_nested_key"] {
            let mut stored = BTreeMap::new();
            stored.insert(storage_key(account, key), 7);
            let restored = strip_namespace(account, &stored);
            assert_eq!(restored.len(), 1);
            assert_eq!(restored.get(key), Some(&7));
        }
    }

    #[test]
    fn test_strip_ignores_other_accounts() {
        let mut stored = BTreeMap::new();
        stored.insert(storage_key(Some("a@x.com"), "keys"), "mine");
        stored.insert(storage_key(Some("b@x.com"), "keys"), "theirs");

        let restored = strip_namespace(Some("a@x.com"), &stored);
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.get("keys"), Some(&"mine"));
    }

    #[test]
    fn test_strip_by_account() {
        let mut stored = BTreeMap::new();
        stored.insert(storage_key(Some("a@x.com"), "keys"), 1);
        stored.insert(storage_key(Some("b@x.com"), "keys"), 2);

        let split = strip_namespace_by_account(&["a@x.com", "b@x.com", "c@x.com"], &stored);
        assert_eq!(split["a@x.com"].get("keys"), Some(&1));
        assert_eq!(split["b@x.com"].get("keys"), Some(&2));
        assert!(split["c@x.com"].is_empty());
    }
}
