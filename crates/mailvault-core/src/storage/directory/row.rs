//! Contact row type for directory queries.

use rusqlite::Row;

use crate::error::{Result, VaultError};
use crate::storage::types::Contact;

/// Column list matching [`ContactRow::from_row`], for tables aliased as `c`.
pub(crate) const CONTACT_COLUMNS: &str = "c.email, c.name, c.pubkey, c.has_pgp, c.client, \
     c.attested, c.fingerprint, c.longid, c.keywords, c.pending_lookup, c.last_use";

/// Raw row data from the contacts table, before validation.
#[derive(Debug)]
pub struct ContactRow {
    pub email: String,
    pub name: Option<String>,
    pub pubkey: Option<String>,
    pub has_pgp: i64,
    pub client: Option<String>,
    pub attested: Option<i64>,
    pub fingerprint: Option<String>,
    pub longid: Option<String>,
    pub keywords: Option<String>,
    pub pending_lookup: i64,
    pub last_use: Option<i64>,
    pub searchable: Vec<String>,
}

impl ContactRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ContactRow {
            email: row.get(0)?,
            name: row.get(1)?,
            pubkey: row.get(2)?,
            has_pgp: row.get(3)?,
            client: row.get(4)?,
            attested: row.get(5)?,
            fingerprint: row.get(6)?,
            longid: row.get(7)?,
            keywords: row.get(8)?,
            pending_lookup: row.get(9)?,
            last_use: row.get(10)?,
            searchable: Vec::new(),
        })
    }
}

fn flag(column: &str, value: i64) -> Result<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(VaultError::Storage(format!(
            "Invalid {} flag: {}",
            column, other
        ))),
    }
}

impl TryFrom<ContactRow> for Contact {
    type Error = VaultError;

    fn try_from(row: ContactRow) -> Result<Self> {
        let has_pgp = flag("has_pgp", row.has_pgp)?;
        if has_pgp != row.pubkey.is_some() {
            return Err(VaultError::Storage(format!(
                "Contact {} has inconsistent has_pgp flag",
                row.email
            )));
        }
        let attested = row
            .attested
            .map(|value| flag("attested", value))
            .transpose()?;

        Ok(Contact {
            email: row.email,
            name: row.name,
            pubkey: row.pubkey,
            has_pgp,
            searchable: row.searchable,
            client: row.client,
            attested,
            fingerprint: row.fingerprint,
            longid: row.longid,
            keywords: row.keywords,
            pending_lookup: flag("pending_lookup", row.pending_lookup)?,
            last_use: row.last_use,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(has_pgp: i64, pubkey: Option<&str>) -> ContactRow {
        ContactRow {
            email: "a@x.com".to_string(),
            name: None,
            pubkey: pubkey.map(str::to_string),
            has_pgp,
            client: None,
            attested: None,
            fingerprint: None,
            longid: None,
            keywords: None,
            pending_lookup: 0,
            last_use: None,
            searchable: vec!["f:a".to_string()],
        }
    }

    #[test]
    fn test_valid_row_converts() {
        let contact = Contact::try_from(row(1, Some("KEY"))).unwrap();
        assert!(contact.has_pgp);
        assert_eq!(contact.searchable, vec!["f:a"]);
    }

    #[test]
    fn test_inconsistent_flag_is_rejected() {
        assert!(Contact::try_from(row(1, None)).is_err());
        assert!(Contact::try_from(row(0, Some("KEY"))).is_err());
        assert!(Contact::try_from(row(2, Some("KEY"))).is_err());
    }
}
