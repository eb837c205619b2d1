//! SQLite contact directory.
//!
//! Contacts live in the `contacts` table, keyed by lower-cased email. The
//! prefix-search index is the `contact_search` table, one row per
//! (token, contact). The key-presence and longid indexes are plain SQLite
//! indexes on `contacts`.
//!
//! Every write goes through [`Contact::build`], so key-derived fields are
//! never copied from a previous record.

mod query;
mod row;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use super::schema;
use super::types::{canonical_email, Contact, ContactQuery, ContactUpdate, NewContact};
use super::{classify_open_error, open_connection, write_error};
use crate::error::{Result, VaultError};
use crate::keys::{is_longid, KeyInspector};
use crate::report::{funnel, ErrorReporter, OpenAttempt};

use row::ContactRow;

/// Handle to an open, migrated contact directory.
pub struct DirectoryStore {
    conn: Mutex<Connection>,
    inspector: Arc<dyn KeyInspector>,
    reporter: Arc<dyn ErrorReporter>,
}

impl DirectoryStore {
    /// Open the directory and bring its schema up to date.
    ///
    /// # Errors
    ///
    /// - `VaultError::Blocked` if another handle holds the store while it
    ///   still needs an upgrade (retry later)
    /// - `VaultError::Unavailable` if the backing file cannot be opened
    /// - anything else is unexpected and is reported once for this attempt
    pub fn open(
        path: &Path,
        inspector: Arc<dyn KeyInspector>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self> {
        let attempt = OpenAttempt::new(reporter.clone());
        let opened = open_connection(path).and_then(|mut conn| {
            let version = schema::migrate(&mut conn).map_err(classify)?;
            Ok((conn, version))
        });
        let (conn, version) = match opened {
            Ok(opened) => opened,
            Err(err) => return Err(attempt.fail(err)),
        };
        tracing::debug!(path = %path.display(), version, "contact directory open");

        Ok(Self {
            conn: Mutex::new(conn),
            inspector,
            reporter,
        })
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| VaultError::Storage("SQLite connection poisoned".to_string()))
    }

    fn funnel<T>(&self, result: Result<T>) -> Result<T> {
        funnel(self.reporter.as_ref(), result)
    }

    /// Save one contact in its own transaction.
    pub fn save(&self, contact: &NewContact) -> Result<()> {
        let result = self.build(contact).and_then(|record| self.write(&record));
        self.funnel(result)
    }

    /// Save several contacts, one transaction each. Returns once every
    /// element has been written; stops at the first failure.
    pub fn save_many(&self, contacts: &[NewContact]) -> Result<()> {
        contacts.iter().try_for_each(|contact| self.save(contact))
    }

    /// Merge a patch into the stored contact and write the result.
    ///
    /// The read and the write are separate transactions, so a concurrent
    /// writer between them is overwritten.
    pub fn update(&self, email: &str, update: &ContactUpdate) -> Result<()> {
        let original = self.get_by_email(&canonical_email(email))?;
        self.save(&update.merge(email, original.as_ref()))
    }

    pub fn update_many(&self, emails: &[String], update: &ContactUpdate) -> Result<()> {
        emails.iter().try_for_each(|email| self.update(email, update))
    }

    /// Look up a contact by longid (16 uppercase hex digits) or by email.
    pub fn get(&self, id: &str) -> Result<Option<Contact>> {
        if is_longid(id) {
            self.get_by_longid(id)
        } else {
            self.get_by_email(&canonical_email(id))
        }
    }

    /// Look up several contacts, preserving input order.
    pub fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Option<Contact>>> {
        ids.iter().map(|id| self.get(id.as_ref())).collect()
    }

    pub fn search(&self, query: &ContactQuery) -> Result<Vec<Contact>> {
        tracing::debug!(?query, "contact search");
        let result = self
            .lock_conn()
            .and_then(|conn| query::search(&conn, query));
        self.funnel(result)
    }

    /// Contacts with an outstanding remote key lookup, in email order.
    pub fn pending_lookups(&self, limit: Option<usize>) -> Result<Vec<Contact>> {
        let result = self
            .lock_conn()
            .and_then(|conn| query::pending(&conn, limit));
        self.funnel(result)
    }

    /// Delete every contact whose key has this longid.
    pub fn remove_by_longid(&self, longid: &str) -> Result<usize> {
        let result = self.lock_conn().and_then(|mut conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM contact_search
                 WHERE email IN (SELECT email FROM contacts WHERE longid = ?1)",
                [longid],
            )?;
            let removed = tx.execute("DELETE FROM contacts WHERE longid = ?1", [longid])?;
            tx.commit()?;
            Ok(removed)
        });
        self.funnel(result.map_err(write_error))
    }

    /// Stored schema version.
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.lock_conn()?;
        schema::current_version(&conn)
    }

    fn build(&self, contact: &NewContact) -> Result<Contact> {
        if contact.email.trim().is_empty() {
            return Err(VaultError::InvalidInput(
                "contact email must not be empty".to_string(),
            ));
        }
        Ok(Contact::build(contact.clone(), self.inspector.as_ref()))
    }

    fn write(&self, contact: &Contact) -> Result<()> {
        let mut conn = self.lock_conn()?;
        write_contact(&mut conn, contact).map_err(write_error)
    }

    fn get_by_email(&self, email: &str) -> Result<Option<Contact>> {
        self.get_where("c.email = ?1", email)
    }

    fn get_by_longid(&self, longid: &str) -> Result<Option<Contact>> {
        self.get_where("c.longid = ?1", longid)
    }

    fn get_where(&self, predicate: &str, value: &str) -> Result<Option<Contact>> {
        let result = self.lock_conn().and_then(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM contacts c WHERE {} ORDER BY c.email LIMIT 1",
                        row::CONTACT_COLUMNS,
                        predicate
                    ),
                    [value],
                    ContactRow::from_row,
                )
                .optional()?;
            row.map(|row| query::hydrate(&conn, row)).transpose()
        });
        self.funnel(result)
    }
}

fn write_contact(conn: &mut Connection, contact: &Contact) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO contacts (email, name, pubkey, has_pgp, client, attested,
                               fingerprint, longid, keywords, pending_lookup, last_use)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(email) DO UPDATE SET
             name = excluded.name,
             pubkey = excluded.pubkey,
             has_pgp = excluded.has_pgp,
             client = excluded.client,
             attested = excluded.attested,
             fingerprint = excluded.fingerprint,
             longid = excluded.longid,
             keywords = excluded.keywords,
             pending_lookup = excluded.pending_lookup,
             last_use = excluded.last_use",
        params![
            contact.email,
            contact.name,
            contact.pubkey,
            contact.has_pgp,
            contact.client,
            contact.attested,
            contact.fingerprint,
            contact.longid,
            contact.keywords,
            contact.pending_lookup,
            contact.last_use,
        ],
    )?;

    tx.execute("DELETE FROM contact_search WHERE email = ?1", [&contact.email])?;
    {
        let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO contact_search (token, email) VALUES (?1, ?2)")?;
        for token in &contact.searchable {
            stmt.execute(params![token, contact.email])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// Busy/locked during the upgrade transaction means another handle holds the store.
fn classify(err: VaultError) -> VaultError {
    match err {
        VaultError::Sqlite { source } => classify_open_error(source),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::testing::MarkerInspector;
    use crate::report::testing::RecordingReporter;

    fn store() -> (tempfile::TempDir, Arc<RecordingReporter>, DirectoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let store = DirectoryStore::open(
            &dir.path().join("vault.db"),
            Arc::new(MarkerInspector),
            reporter.clone(),
        )
        .unwrap();
        (dir, reporter, store)
    }

    #[test]
    fn test_save_replaces_search_tokens() {
        let (_dir, _reporter, store) = store();
        store.save(&NewContact::new("a@x.com").with_name("Ann")).unwrap();
        store.save(&NewContact::new("a@x.com").with_name("Zed")).unwrap();

        let contact = store.get("a@x.com").unwrap().unwrap();
        assert_eq!(contact.name.as_deref(), Some("Zed"));
        assert!(contact.searchable.contains(&"f:zed".to_string()));
        assert!(!contact.searchable.contains(&"f:ann".to_string()));

        let hits = store.search(&ContactQuery::new().substring("ann")).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let (_dir, _reporter, store) = store();
        store.save_many(&[]).unwrap();
        assert!(store.search(&ContactQuery::new()).unwrap().is_empty());
    }

    #[test]
    fn test_empty_email_is_rejected_and_reported() {
        let (_dir, reporter, store) = store();
        let err = store.save(&NewContact::new("  ")).unwrap_err();
        assert!(matches!(err, VaultError::InvalidInput(_)));
        assert_eq!(reporter.count(), 1);
    }

    #[test]
    fn test_email_lookup_is_case_insensitive() {
        let (_dir, _reporter, store) = store();
        store.save(&NewContact::new("Ann@X.com")).unwrap();
        let contact = store.get("ANN@x.COM").unwrap().unwrap();
        assert_eq!(contact.email, "ann@x.com");
    }

    #[test]
    fn test_pending_lookups() {
        let (_dir, _reporter, store) = store();
        store
            .save_many(&[
                NewContact::new("b@x.com").pending_lookup(true),
                NewContact::new("a@x.com").pending_lookup(true),
                NewContact::new("c@x.com")
                    .with_pubkey("KEY:ABCDEF0123456789")
                    .pending_lookup(true),
            ])
            .unwrap();

        let pending = store.pending_lookups(None).unwrap();
        let emails: Vec<&str> = pending.iter().map(|c| c.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
        assert_eq!(store.pending_lookups(Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_schema_version_after_open() {
        let (_dir, _reporter, store) = store();
        assert_eq!(store.schema_version().unwrap(), schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_open_unavailable_is_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let result = DirectoryStore::open(
            &dir.path().join("missing").join("vault.db"),
            Arc::new(MarkerInspector),
            reporter.clone(),
        );
        assert!(matches!(result, Err(VaultError::Unavailable(_))));
        assert_eq!(reporter.count(), 0);
    }
}
