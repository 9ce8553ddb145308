//! SHA-256 digest scheme for envelope chaining.
//!
//! Leaf digests are lowercase-hex SHA-256 of a concealed value's bytes.
//! The signing digest of an envelope is SHA-256 over the UTF-8 concatenation
//! of the leaf hex strings that are PRESENT:
//!
//!   digest = SHA256( leaf(subject)? || leaf(message)? )
//!
//! An absent half (empty source string) is skipped entirely — it is never
//! replaced by the hash of an empty string. Existing verifiers depend on
//! this exact byte layout, so the scheme must not change.
//!
//! BLAKE3 is used everywhere else in this workspace; SHA-256 hex chaining is
//! the one interop surface.

use sha2::{Digest as _, Sha256};

use crate::conceal::ConcealedValue;

/// Raw SHA-256 of bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Lowercase-hex SHA-256 of raw bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Leaf digest of a concealed value.
pub fn leaf(value: &ConcealedValue) -> String {
    sha256_hex(value.as_bytes())
}

/// Leaf digest of an optional concealed half; `None` stays `None`.
pub fn leaf_opt(value: Option<&ConcealedValue>) -> Option<String> {
    value.map(leaf)
}

/// Signing digest over a pair of optional leaf digests.
///
/// Degenerate case: both halves absent hashes the empty string, matching
/// the behaviour existing verifiers expect.
pub fn pair_digest(subject_leaf: Option<&str>, message_leaf: Option<&str>) -> [u8; 32] {
    let mut hasher = Sha256::new();
    if let Some(s) = subject_leaf {
        hasher.update(s.as_bytes());
    }
    if let Some(m) = message_leaf {
        hasher.update(m.as_bytes());
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_is_hex_sha256() {
        let v = ConcealedValue::new("concealed-subject");
        assert_eq!(leaf(&v), sha256_hex(b"concealed-subject"));
        assert_eq!(leaf(&v).len(), 64);
    }

    #[test]
    fn pair_digest_concatenates_present_leaves() {
        let s = sha256_hex(b"subject");
        let m = sha256_hex(b"message");
        let expected: [u8; 32] = Sha256::digest(format!("{s}{m}").as_bytes()).into();
        assert_eq!(pair_digest(Some(&s), Some(&m)), expected);
    }

    #[test]
    fn absent_half_is_skipped_not_hashed_empty() {
        let m = sha256_hex(b"message");

        // Digest with only the message half present…
        let single = pair_digest(None, Some(&m));
        // …must equal hashing the message leaf alone…
        let expected: [u8; 32] = Sha256::digest(m.as_bytes()).into();
        assert_eq!(single, expected);

        // …and must differ from folding in the hash of an empty string.
        let empty_leaf = sha256_hex(b"");
        assert_ne!(single, pair_digest(Some(&empty_leaf), Some(&m)));
    }

    #[test]
    fn both_halves_absent_hashes_empty_string() {
        let expected: [u8; 32] = Sha256::digest(b"").into();
        assert_eq!(pair_digest(None, None), expected);
    }
}
