//! Word rendering of key identifiers.
//!
//! The longid is read as a bit stream and cut into 11-bit groups, each of
//! which indexes the BIP39 English word list. A 16-hex longid (64 bits) reads
//! as six words; the last group is zero-padded.

use bip39::Language;

const BITS_PER_WORD: u32 = 11;
const WORD_MASK: u32 = (1 << BITS_PER_WORD) - 1;

/// Render a longid as space-separated BIP39 words.
///
/// Hex input is decoded first; anything else is rendered from its raw bytes.
pub fn mnemonic(longid: &str) -> String {
    let bytes = hex::decode(longid).unwrap_or_else(|_| longid.as_bytes().to_vec());
    word_indexes(&bytes)
        .into_iter()
        .map(|index| Language::English.word_list()[index as usize])
        .collect::<Vec<_>>()
        .join(" ")
}

fn word_indexes(bytes: &[u8]) -> Vec<u32> {
    let mut indexes = Vec::with_capacity((bytes.len() * 8).div_ceil(BITS_PER_WORD as usize));
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for byte in bytes {
        acc = (acc << 8) | u32::from(*byte);
        bits += 8;
        while bits >= BITS_PER_WORD {
            bits -= BITS_PER_WORD;
            indexes.push((acc >> bits) & WORD_MASK);
        }
        acc &= (1 << bits) - 1;
    }
    if bits > 0 {
        indexes.push((acc << (BITS_PER_WORD - bits)) & WORD_MASK);
    }
    indexes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longid_renders_six_words() {
        assert_eq!(
            mnemonic("ABCDEF0123456789"),
            "profit hunt scare educate filter setup"
        );
        assert_eq!(
            mnemonic("0123456789ABCDEF"),
            "abuse boss fly battle rubber wasp"
        );
    }

    #[test]
    fn test_case_insensitive_hex() {
        assert_eq!(mnemonic("abcdef0123456789"), mnemonic("ABCDEF0123456789"));
    }

    #[test]
    fn test_non_hex_renders_raw_bytes() {
        assert_eq!(mnemonic("not-hex"), "hover knife area speak fiscal abandon");
    }

    #[test]
    fn test_indexes_cover_every_bit() {
        assert_eq!(word_indexes(&[0xff, 0xff]), vec![0x7ff, 0x7c0]);
        assert!(word_indexes(&[]).is_empty());
    }
}
