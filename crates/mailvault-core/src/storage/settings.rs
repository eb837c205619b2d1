//! Durable key-value settings, namespaced per account.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Value};

use super::{open_connection, write_error};
use crate::error::{Result, VaultError};
use crate::namespace::{storage_key, storage_keys, strip_namespace, strip_namespace_by_account};
use crate::report::{funnel, ErrorReporter, TracingReporter};

/// Settings tier backed by the shared SQLite file.
pub struct SettingsStore {
    conn: Mutex<Connection>,
    reporter: Arc<dyn ErrorReporter>,
}

impl SettingsStore {
    /// Open the settings table, creating it if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_connection(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            reporter: Arc::new(TracingReporter),
        })
    }

    /// Replace the error reporter used by this store.
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| VaultError::Storage("SQLite connection poisoned".to_string()))
    }

    /// Write several values for one account in a single transaction.
    pub fn set(&self, account: Option<&str>, values: &Map<String, Value>) -> Result<()> {
        funnel(self.reporter.as_ref(), self.set_inner(account, values))
    }

    fn set_inner(&self, account: Option<&str>, values: &Map<String, Value>) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|e| write_error(e.into()))?;
        for (key, value) in values {
            let encoded = serde_json::to_string(value)?;
            tx.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                (storage_key(account, key), encoded),
            )
            .map_err(|e| write_error(e.into()))?;
        }
        tx.commit().map_err(|e| write_error(e.into()))?;
        Ok(())
    }

    /// Read values for one account; missing keys are simply absent.
    pub fn get<K: AsRef<str>>(&self, account: Option<&str>, keys: &[K]) -> Result<Map<String, Value>> {
        let namespaced: Vec<String> = keys.iter().map(|k| storage_key(account, k.as_ref())).collect();
        let result = self
            .read_raw(&namespaced)
            .map(|raw| strip_namespace(account, &raw).into_iter().collect());
        funnel(self.reporter.as_ref(), result)
    }

    /// Read the same keys for several accounts at once.
    pub fn get_accounts<A, K>(
        &self,
        accounts: &[A],
        keys: &[K],
    ) -> Result<BTreeMap<String, Map<String, Value>>>
    where
        A: AsRef<str>,
        K: AsRef<str>,
    {
        let result = self.read_raw(&storage_keys(accounts, keys)).map(|raw| {
            strip_namespace_by_account(accounts, &raw)
                .into_iter()
                .map(|(account, values)| (account, values.into_iter().collect()))
                .collect()
        });
        funnel(self.reporter.as_ref(), result)
    }

    /// Delete keys for one account. Missing keys are ignored.
    pub fn remove<K: AsRef<str>>(&self, account: Option<&str>, keys: &[K]) -> Result<()> {
        funnel(self.reporter.as_ref(), self.remove_inner(account, keys))
    }

    fn remove_inner<K: AsRef<str>>(&self, account: Option<&str>, keys: &[K]) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|e| write_error(e.into()))?;
        for key in keys {
            tx.execute(
                "DELETE FROM settings WHERE key = ?1",
                [storage_key(account, key.as_ref())],
            )
            .map_err(|e| write_error(e.into()))?;
        }
        tx.commit().map_err(|e| write_error(e.into()))?;
        Ok(())
    }

    fn read_raw(&self, namespaced: &[String]) -> Result<BTreeMap<String, Value>> {
        if namespaced.is_empty() {
            return Ok(BTreeMap::new());
        }
        let conn = self.lock_conn()?;
        let placeholders = vec!["?"; namespaced.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT key, value FROM settings WHERE key IN ({})",
            placeholders
        ))?;
        let rows = stmt.query_map(params_from_iter(namespaced.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut raw = BTreeMap::new();
        for row in rows {
            let (key, encoded) = row?;
            let value: Value = serde_json::from_str(&encoded)
                .map_err(|e| VaultError::Storage(format!("Invalid setting JSON for {}: {}", key, e)))?;
            raw.insert(key, value);
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(&dir.path().join("vault.db")).unwrap();
        (dir, store)
    }

    fn values(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_set_get_remove() {
        let (_dir, store) = store();
        let account = Some("ann@x.com");
        store
            .set(account, &values(&[("setup_done", json!(true)), ("full_name", json!("Ann"))]))
            .unwrap();

        let read = store.get(account, &["setup_done", "full_name", "missing"]).unwrap();
        assert_eq!(read.get("setup_done"), Some(&json!(true)));
        assert_eq!(read.get("full_name"), Some(&json!("Ann")));
        assert!(!read.contains_key("missing"));

        store.remove(account, &["setup_done"]).unwrap();
        let read = store.get(account, &["setup_done"]).unwrap();
        assert!(read.is_empty());
    }

    #[test]
    fn test_accounts_are_isolated() {
        let (_dir, store) = store();
        store.set(Some("a@x.com"), &values(&[("keys", json!([1]))])).unwrap();
        store.set(Some("b@x.com"), &values(&[("keys", json!([2]))])).unwrap();
        store.set(None, &values(&[("keys", json!([0]))])).unwrap();

        assert_eq!(store.get(Some("a@x.com"), &["keys"]).unwrap()["keys"], json!([1]));
        assert_eq!(store.get(None, &["keys"]).unwrap()["keys"], json!([0]));

        let split = store.get_accounts(&["a@x.com", "b@x.com"], &["keys"]).unwrap();
        assert_eq!(split["a@x.com"]["keys"], json!([1]));
        assert_eq!(split["b@x.com"]["keys"], json!([2]));
    }

    #[test]
    fn test_overwrite_value() {
        let (_dir, store) = store();
        store.set(None, &values(&[("version", json!(1))])).unwrap();
        store.set(None, &values(&[("version", json!(2))])).unwrap();
        assert_eq!(store.get(None, &["version"]).unwrap()["version"], json!(2));
    }

    #[test]
    fn test_empty_key_list() {
        let (_dir, store) = store();
        assert!(store.get::<&str>(None, &[]).unwrap().is_empty());
    }
}
