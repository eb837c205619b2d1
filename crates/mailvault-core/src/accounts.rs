//! Registry of accounts known to this installation.

use serde_json::{Map, Value};

use crate::error::{Result, VaultError};
use crate::report::{funnel, ErrorReporter};
use crate::storage::StoreBackend;

/// Global settings key holding the account list.
pub const ACCOUNTS_SETTING: &str = "account_emails";

pub struct Accounts<'a> {
    backend: &'a dyn StoreBackend,
    reporter: &'a dyn ErrorReporter,
}

impl<'a> Accounts<'a> {
    pub fn new(backend: &'a dyn StoreBackend, reporter: &'a dyn ErrorReporter) -> Self {
        Self { backend, reporter }
    }

    /// Known accounts, lower-cased and deduplicated, in insertion order.
    pub fn list(&self) -> Result<Vec<String>> {
        let stored = self
            .backend
            .settings_get(None, &[ACCOUNTS_SETTING.to_string()])?;
        let raw: Vec<String> = match stored.get(ACCOUNTS_SETTING) {
            Some(Value::Null) | None => Vec::new(),
            Some(value) => serde_json::from_value(value.clone())?,
        };

        let mut accounts: Vec<String> = Vec::with_capacity(raw.len());
        for email in raw {
            let email = email.trim().to_lowercase();
            if !email.is_empty() && !accounts.contains(&email) {
                accounts.push(email);
            }
        }
        Ok(accounts)
    }

    /// Register an account.
    ///
    /// # Returns
    ///
    /// `true` if the account was not known before.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::InvalidInput` for an empty email; the failure is
    /// also sent to the error reporter.
    pub fn add(&self, email: &str) -> Result<bool> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return funnel(
                self.reporter,
                Err(VaultError::InvalidInput(
                    "cannot register an empty account email".to_string(),
                )),
            );
        }

        let mut accounts = self.list()?;
        if accounts.contains(&email) {
            return Ok(false);
        }
        accounts.push(email);

        let mut values = Map::new();
        values.insert(ACCOUNTS_SETTING.to_string(), serde_json::to_value(accounts)?);
        self.backend.settings_set(None, &values)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::keys::testing::MarkerInspector;
    use crate::report::testing::RecordingReporter;
    use crate::report::TracingReporter;
    use crate::storage::LocalStore;

    fn backend() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(
            &dir.path().join("vault.db"),
            Arc::new(MarkerInspector),
            Arc::new(TracingReporter),
        )
        .unwrap();
        (dir, store)
    }

    #[test]
    fn test_add_dedupes_case_insensitively() {
        let (_dir, store) = backend();
        let reporter = RecordingReporter::default();
        let accounts = Accounts::new(&store, &reporter);

        assert!(accounts.add("Ann@X.com").unwrap());
        assert!(!accounts.add("ann@x.com ").unwrap());
        assert!(accounts.add("bob@y.org").unwrap());
        assert_eq!(accounts.list().unwrap(), vec!["ann@x.com", "bob@y.org"]);
    }

    #[test]
    fn test_empty_email_is_reported() {
        let (_dir, store) = backend();
        let reporter = RecordingReporter::default();
        let accounts = Accounts::new(&store, &reporter);

        let err = accounts.add("  ").unwrap_err();
        assert!(matches!(err, VaultError::InvalidInput(_)));
        assert_eq!(reporter.count(), 1);
        assert!(accounts.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_normalizes_stored_values() {
        let (_dir, store) = backend();
        let mut values = Map::new();
        values.insert(
            ACCOUNTS_SETTING.to_string(),
            serde_json::json!(["A@x.com", "a@x.com", "", "b@x.com"]),
        );
        store.settings().set(None, &values).unwrap();

        let reporter = RecordingReporter::default();
        let accounts = Accounts::new(&store, &reporter);
        assert_eq!(accounts.list().unwrap(), vec!["a@x.com", "b@x.com"]);
    }
}
