//! Free-text canonicalization shared by the index builder and the query engine.
//!
//! Both sides must go through [`normalize`]; a search only matches when the
//! query text and the indexed text were folded the same way.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strip diacritics (compatibility decomposition, then drop combining marks)
/// and fold to lower case.
///
/// # Examples
///
/// ```
/// use mailvault_core::normalize::normalize;
///
/// assert_eq!(normalize("José Ñúñez"), "jose nunez");
/// ```
pub fn normalize(text: &str) -> String {
    // Lower-casing can reintroduce combining marks (U+0130 folds to "i\u{307}").
    strip_marks(&strip_marks(text).to_lowercase())
}

fn strip_marks(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_diacritics_and_case() {
        assert_eq!(normalize("Ånne-Marie"), "anne-marie");
        assert_eq!(normalize("ÇÉÎÕÜ"), "ceiou");
    }

    #[test]
    fn test_compatibility_forms_fold() {
        // U+FB01 LATIN SMALL LIGATURE FI
        assert_eq!(normalize("\u{FB01}le"), "file");
    }

    #[test]
    fn test_idempotent() {
        for input in ["", "plain", "Zoë@Example.COM", "Ⅻ Straße", "e\u{0301}"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(normalize("a.b-c_d@x.com"), "a.b-c_d@x.com");
    }
}
