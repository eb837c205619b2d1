//! Prefix-token construction for the contact search index.
//!
//! A contact is findable by any prefix of its email, its name, or any
//! alphanumeric run inside either. Tokens carry a partition tag so that a
//! single index answers both "has a key" and "no key" lookups.

use std::collections::HashSet;

use crate::normalize::normalize;

const HAS_KEY_TAG: &str = "t:";
const NO_KEY_TAG: &str = "f:";

/// Partition tag for contacts with (`true`) or without a known key.
pub fn partition_tag(has_pgp: bool) -> &'static str {
    if has_pgp {
        HAS_KEY_TAG
    } else {
        NO_KEY_TAG
    }
}

/// Index token for an already-normalized search prefix.
pub fn index_token(has_pgp: bool, normalized: &str) -> String {
    format!("{}{}", partition_tag(has_pgp), normalized)
}

/// Build the deduplicated token list for a contact, in first-seen order.
pub fn search_tokens(email: &str, name: Option<&str>, has_pgp: bool) -> Vec<String> {
    let email = email.to_lowercase();
    let name = name.map(str::to_lowercase).unwrap_or_default();

    let mut parts: Vec<&str> = vec![email.as_str(), name.as_str()];
    parts.extend(email.split(|c: char| !c.is_alphanumeric()));
    parts.extend(name.split(|c: char| !c.is_alphanumeric()));

    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for part in parts.into_iter().filter(|p| !p.is_empty()) {
        let mut prefix = String::with_capacity(part.len());
        for c in part.chars() {
            prefix.push(c);
            let token = index_token(has_pgp, &normalize(&prefix));
            if seen.insert(token.clone()) {
                tokens.push(token);
            }
        }
    }
    tokens
}
