//! Query engine over the contact directory.
//!
//! All paths read through a cursor and stop as soon as the limit is reached.
//! Within a partition, results come back in email order.

use rusqlite::{Connection, Params};

use super::row::{ContactRow, CONTACT_COLUMNS};
use crate::error::Result;
use crate::normalize::normalize;
use crate::storage::index::index_token;
use crate::storage::types::{Contact, ContactQuery};

/// Execute a contact search.
pub(crate) fn search(conn: &Connection, query: &ContactQuery) -> Result<Vec<Contact>> {
    let limit = query.effective_limit();
    let needle = query
        .substring
        .as_deref()
        .map(normalize)
        .filter(|s| !s.is_empty());

    match (query.has_pgp, needle) {
        (Some(has_pgp), Some(needle)) => by_token(conn, has_pgp, &needle, limit),
        (Some(has_pgp), None) => by_partition(conn, has_pgp, limit),
        (None, Some(needle)) => {
            let mut found = by_token(conn, true, &needle, limit)?;
            let remaining = match limit {
                Some(n) if found.len() >= n => return Ok(found),
                Some(n) => Some(n - found.len()),
                None => None,
            };
            found.extend(by_token(conn, false, &needle, remaining)?);
            Ok(found)
        }
        (None, None) => collect(
            conn,
            &format!("SELECT {} FROM contacts c ORDER BY c.email", CONTACT_COLUMNS),
            [],
            limit,
        ),
    }
}

/// Contacts waiting for a remote key lookup.
pub(crate) fn pending(conn: &Connection, limit: Option<usize>) -> Result<Vec<Contact>> {
    collect(
        conn,
        &format!(
            "SELECT {} FROM contacts c WHERE c.pending_lookup = 1 ORDER BY c.email",
            CONTACT_COLUMNS
        ),
        [],
        limit.filter(|n| *n > 0),
    )
}

/// Exact hit on a tagged prefix token. The index already stores every
/// prefix, so no range scan is needed.
fn by_token(
    conn: &Connection,
    has_pgp: bool,
    needle: &str,
    limit: Option<usize>,
) -> Result<Vec<Contact>> {
    collect(
        conn,
        &format!(
            "SELECT {} FROM contacts c
             JOIN contact_search s ON s.email = c.email
             WHERE s.token = ?1
             ORDER BY c.email",
            CONTACT_COLUMNS
        ),
        [index_token(has_pgp, needle)],
        limit,
    )
}

fn by_partition(conn: &Connection, has_pgp: bool, limit: Option<usize>) -> Result<Vec<Contact>> {
    collect(
        conn,
        &format!(
            "SELECT {} FROM contacts c WHERE c.has_pgp = ?1 ORDER BY c.email",
            CONTACT_COLUMNS
        ),
        [has_pgp],
        limit,
    )
}

/// Walk a cursor until it is exhausted or `limit` rows were read.
pub(crate) fn collect<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    limit: Option<usize>,
) -> Result<Vec<Contact>> {
    let mut found = Vec::new();
    {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        while limit.map_or(true, |n| found.len() < n) {
            match rows.next()? {
                Some(row) => found.push(ContactRow::from_row(row)?),
                None => break,
            }
        }
    }

    found
        .into_iter()
        .map(|row| hydrate(conn, row))
        .collect()
}

/// Attach the stored search tokens and validate the row.
pub(crate) fn hydrate(conn: &Connection, mut row: ContactRow) -> Result<Contact> {
    let mut stmt =
        conn.prepare_cached("SELECT token FROM contact_search WHERE email = ?1 ORDER BY rowid")?;
    row.searchable = stmt
        .query_map([&row.email], |r| r.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Contact::try_from(row)
}
