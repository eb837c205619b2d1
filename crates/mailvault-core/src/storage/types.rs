//! Core data types for the contact directory.

use serde::{Deserialize, Deserializer, Serialize};

use super::index::search_tokens;
use crate::error::{Result, VaultError};
use crate::keys::KeyInspector;

/// A contact as stored in the directory.
///
/// Everything after `pubkey` except `pending_lookup`, `last_use` and `client`
/// is derived from `pubkey` whenever the record is written; the store never
/// accepts a `Contact` as write input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Lower-cased email address (primary key)
    pub email: String,

    /// Display name, if known
    pub name: Option<String>,

    /// Armored public key, if known
    pub pubkey: Option<String>,

    /// `pubkey.is_some()`
    pub has_pgp: bool,

    /// Prefix tokens for the search index
    pub searchable: Vec<String>,

    /// Client that produced the key (e.g. "pgp")
    pub client: Option<String>,

    /// Whether the key was attested; `None` without a key
    pub attested: Option<bool>,

    pub fingerprint: Option<String>,
    pub longid: Option<String>,
    pub keywords: Option<String>,

    /// A remote key lookup is outstanding; always `false` with a key
    pub pending_lookup: bool,

    /// Last time the contact was used (milliseconds since the epoch)
    pub last_use: Option<i64>,
}

impl Contact {
    /// Construct a record, deriving every key-dependent field from `pubkey`.
    pub fn build(new: NewContact, inspector: &dyn KeyInspector) -> Self {
        let email = canonical_email(&new.email);
        let name = new.name.filter(|n| !n.trim().is_empty());
        let pubkey = new.pubkey.filter(|k| !k.trim().is_empty());
        let has_pgp = pubkey.is_some();

        let longid = pubkey.as_deref().and_then(|k| inspector.longid(k));
        let fingerprint = pubkey.as_deref().and_then(|k| inspector.fingerprint(k));
        let keywords = longid.as_deref().map(|id| inspector.keywords(id));
        let searchable = search_tokens(&email, name.as_deref(), has_pgp);

        Contact {
            email,
            name,
            has_pgp,
            searchable,
            client: if has_pgp { new.client } else { None },
            attested: has_pgp.then_some(new.attested),
            fingerprint,
            longid,
            keywords,
            pending_lookup: !has_pgp && new.pending_lookup,
            last_use: new.last_use,
            pubkey,
        }
    }
}

/// Input for writing a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pubkey: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub attested: bool,
    #[serde(default)]
    pub pending_lookup: bool,
    #[serde(default)]
    pub last_use: Option<i64>,
}

impl NewContact {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_pubkey(mut self, pubkey: impl Into<String>) -> Self {
        self.pubkey = Some(pubkey.into());
        self
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn attested(mut self, attested: bool) -> Self {
        self.attested = attested;
        self
    }

    pub fn pending_lookup(mut self, pending: bool) -> Self {
        self.pending_lookup = pending;
        self
    }

    pub fn last_use(mut self, millis: i64) -> Self {
        self.last_use = Some(millis);
        self
    }
}

/// Field-level patch applied by `update`.
///
/// An outer `None` keeps the stored value; `Some(None)` clears it. Fields
/// derived from the key are not patchable; they are recomputed instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactUpdate {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub client: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attested: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_lookup: Option<bool>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub last_use: Option<Option<i64>>,
}

impl ContactUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }

    pub fn pubkey(mut self, pubkey: Option<String>) -> Self {
        self.pubkey = Some(pubkey);
        self
    }

    pub fn client(mut self, client: Option<String>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn attested(mut self, attested: bool) -> Self {
        self.attested = Some(attested);
        self
    }

    pub fn pending_lookup(mut self, pending: bool) -> Self {
        self.pending_lookup = Some(pending);
        self
    }

    pub fn last_use(mut self, millis: Option<i64>) -> Self {
        self.last_use = Some(millis);
        self
    }

    /// Merge this patch over a stored record into fresh write input.
    ///
    /// Without a stored record the patch is applied over an empty contact.
    pub fn merge(&self, email: &str, original: Option<&Contact>) -> NewContact {
        let base = original
            .map(|c| NewContact {
                email: c.email.clone(),
                name: c.name.clone(),
                pubkey: c.pubkey.clone(),
                client: c.client.clone(),
                attested: c.attested.unwrap_or(false),
                pending_lookup: c.pending_lookup,
                last_use: c.last_use,
            })
            .unwrap_or_else(|| NewContact::new(email));

        NewContact {
            email: base.email,
            name: self.name.clone().unwrap_or(base.name),
            pubkey: self.pubkey.clone().unwrap_or(base.pubkey),
            client: self.client.clone().unwrap_or(base.client),
            attested: self.attested.unwrap_or(base.attested),
            pending_lookup: self.pending_lookup.unwrap_or(base.pending_lookup),
            last_use: self.last_use.unwrap_or(base.last_use),
        }
    }
}

/// Contact search parameters. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substring: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_pgp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ContactQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn substring(mut self, substring: impl Into<String>) -> Self {
        self.substring = Some(substring.into());
        self
    }

    pub fn has_pgp(mut self, has_pgp: bool) -> Self {
        self.has_pgp = Some(has_pgp);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Parse an untyped query, rejecting keys outside the recognized set.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::InvalidQuery` for unknown keys, wrong value types,
    /// or a non-object value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(VaultError::InvalidQuery(
                "query must be an object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| VaultError::InvalidQuery(e.to_string()))
    }

    /// Limit with the zero sentinel mapped to "unlimited".
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|n| *n > 0)
    }
}

/// Lower-case and trim an email for use as the primary key.
pub fn canonical_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Distinguishes an explicit `null` (Some(None)) from a missing field (None).
fn present<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
