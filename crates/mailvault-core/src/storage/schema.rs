//! Versioned, additive schema for the contact directory.
//!
//! The current version lives in SQLite's `user_version` pragma. Each step only
//! creates what is missing, so replaying a step on a migrated store is a no-op.

use rusqlite::{Connection, TransactionBehavior};

use crate::error::Result;

/// Latest schema version.
pub const SCHEMA_VERSION: u32 = 2;

/// Migration steps in increasing version order.
const MIGRATIONS: &[(u32, &str)] = &[
    (
        1,
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            email TEXT PRIMARY KEY,
            name TEXT,
            pubkey TEXT,
            has_pgp INTEGER NOT NULL DEFAULT 0,
            client TEXT,
            attested INTEGER,
            fingerprint TEXT,
            longid TEXT,
            keywords TEXT,
            pending_lookup INTEGER NOT NULL DEFAULT 0,
            last_use INTEGER
        );

        -- Multi-valued prefix index: one row per (token, contact)
        CREATE TABLE IF NOT EXISTS contact_search (
            token TEXT NOT NULL,
            email TEXT NOT NULL,

            PRIMARY KEY (token, email),
            FOREIGN KEY (email) REFERENCES contacts(email) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS index_has_pgp ON contacts (has_pgp, email);
        CREATE INDEX IF NOT EXISTS index_pending_lookup ON contacts (pending_lookup, email);
        "#,
    ),
    (
        2,
        r#"
        CREATE INDEX IF NOT EXISTS index_longid ON contacts (longid);
        "#,
    ),
];

/// Read the stored schema version.
pub fn current_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

/// Apply every migration step newer than the stored version.
///
/// An up-to-date store is left alone without taking a write lock. Otherwise
/// the whole upgrade runs in one immediate transaction, so a concurrent
/// writer surfaces as `SQLITE_BUSY` before anything changes.
pub fn migrate(conn: &mut Connection) -> Result<u32> {
    let stored = current_version(conn)?;
    if stored >= SCHEMA_VERSION {
        return Ok(stored);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from = current_version(&tx)?;

    for (version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > from) {
        tracing::debug!(version, "applying directory schema step");
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }

    let to = current_version(&tx)?;
    tx.commit()?;
    Ok(to)
}

/// Re-run a single step regardless of the stored version.
#[cfg(test)]
pub(crate) fn replay(conn: &Connection, version: u32) -> Result<()> {
    for (_, sql) in MIGRATIONS.iter().filter(|(v, _)| *v == version) {
        conn.execute_batch(sql)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'index_%' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_fresh_store_reaches_latest_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);

        assert_eq!(migrate(&mut conn).unwrap(), SCHEMA_VERSION);
        assert_eq!(
            index_names(&conn),
            vec!["index_has_pgp", "index_longid", "index_pending_lookup"]
        );
    }

    #[test]
    fn test_upgrade_from_version_one() {
        let mut conn = Connection::open_in_memory().unwrap();
        replay(&conn, 1).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();
        assert!(!index_names(&conn).contains(&"index_longid".to_string()));

        assert_eq!(migrate(&mut conn).unwrap(), 2);
        assert!(index_names(&conn).contains(&"index_longid".to_string()));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        replay(&conn, 1).unwrap();
        replay(&conn, 2).unwrap();
        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_up_to_date_store_skips_write_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");
        let mut conn = Connection::open(&path).unwrap();
        conn.pragma_update(None, "journal_mode", "WAL").unwrap();
        migrate(&mut conn).unwrap();

        let writer = Connection::open(&path).unwrap();
        writer.execute_batch("BEGIN IMMEDIATE;").unwrap();

        let mut reader = Connection::open(&path).unwrap();
        assert_eq!(migrate(&mut reader).unwrap(), SCHEMA_VERSION);
        writer.execute_batch("ROLLBACK;").unwrap();
    }
}
