//! JSON output formatting.

use mailvault_core::{Contact, KeyInfo};
use serde::Serialize;

/// Convert a contact to JSON for output.
///
/// The armored key is left out; `has_pgp` and the key metadata are enough to
/// identify it.
pub fn contact_json(contact: &Contact) -> serde_json::Value {
    serde_json::json!({
        "email": contact.email,
        "name": contact.name,
        "has_pgp": contact.has_pgp,
        "client": contact.client,
        "attested": contact.attested,
        "fingerprint": contact.fingerprint,
        "longid": contact.longid,
        "keywords": contact.keywords,
        "pending_lookup": contact.pending_lookup,
        "last_use": contact.last_use,
    })
}

/// Convert a key to JSON for output. The private half is never printed.
pub fn key_json(key: &KeyInfo) -> serde_json::Value {
    serde_json::json!({
        "longid": key.longid,
        "fingerprint": key.fingerprint,
        "primary": key.primary,
        "keywords": key.keywords,
        "public": key.public,
    })
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_json_omits_private_half() {
        let key = KeyInfo {
            public: "PUBLIC".to_string(),
            private: "SECRET".to_string(),
            fingerprint: "F".repeat(40),
            longid: "F".repeat(16),
            primary: true,
            keywords: "BA BE".to_string(),
        };
        let value = key_json(&key);
        assert!(value.get("private").is_none());
        assert!(!value.to_string().contains("SECRET"));
        assert_eq!(value["primary"], true);
    }
}
