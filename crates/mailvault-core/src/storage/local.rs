//! Direct, in-process store backend.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::directory::DirectoryStore;
use super::session::SessionStore;
use super::settings::SettingsStore;
use super::traits::StoreBackend;
use super::types::{Contact, ContactQuery, ContactUpdate, NewContact};
use crate::error::Result;
use crate::keys::KeyInspector;
use crate::report::ErrorReporter;

/// Store backend for a context that can open the store file itself.
pub struct LocalStore {
    directory: DirectoryStore,
    settings: SettingsStore,
    session: SessionStore,
}

impl LocalStore {
    /// Open the directory and settings tiers on the same file.
    pub fn open(
        path: &Path,
        inspector: Arc<dyn KeyInspector>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self> {
        let directory = DirectoryStore::open(path, inspector, reporter.clone())?;
        let settings = SettingsStore::open(path)?.with_reporter(reporter);
        Ok(Self {
            directory,
            settings,
            session: SessionStore::new(),
        })
    }

    pub fn directory(&self) -> &DirectoryStore {
        &self.directory
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }
}

impl StoreBackend for LocalStore {
    fn contact_save(&self, contacts: &[NewContact]) -> Result<()> {
        self.directory.save_many(contacts)
    }

    fn contact_update(&self, emails: &[String], update: &ContactUpdate) -> Result<()> {
        self.directory.update_many(emails, update)
    }

    fn contact_get(&self, ids: &[String]) -> Result<Vec<Option<Contact>>> {
        self.directory.get_many(ids)
    }

    fn contact_search(&self, query: &ContactQuery) -> Result<Vec<Contact>> {
        self.directory.search(query)
    }

    fn contact_remove_by_longid(&self, longid: &str) -> Result<usize> {
        self.directory.remove_by_longid(longid)
    }

    fn contact_pending_lookups(&self, limit: Option<usize>) -> Result<Vec<Contact>> {
        self.directory.pending_lookups(limit)
    }

    fn settings_set(&self, account: Option<&str>, values: &Map<String, Value>) -> Result<()> {
        self.settings.set(account, values)
    }

    fn settings_get(&self, account: Option<&str>, keys: &[String]) -> Result<Map<String, Value>> {
        self.settings.get(account, keys)
    }

    fn settings_remove(&self, account: Option<&str>, keys: &[String]) -> Result<()> {
        self.settings.remove(account, keys)
    }

    fn session_set(&self, account: &str, key: &str, value: Option<&str>) -> Result<()> {
        self.session.set(account, key, value)
    }

    fn session_get(&self, account: &str, key: &str) -> Result<Option<String>> {
        self.session.get(account, key)
    }
}
