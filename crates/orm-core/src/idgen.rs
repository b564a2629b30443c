//! SHA256 + base36 id generation for host-managed `_id` values.
//!
//! The core ORM never generates ids itself — the document store is the
//! authority (`insert(tableName, row) -> id`). This module is what the
//! in-memory reference host (`orm-storage::memory`) uses to mint those ids.

use sha2::{Digest, Sha256};

/// Base36 alphabet (0-9, a-z).
const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Converts a byte slice to a base36 string of the specified length,
/// zero-padded on the left and truncated to the least-significant digits
/// if the natural encoding is longer.
pub fn encode_base36(data: &[u8], length: usize) -> String {
    let mut num = num_bigint::BigUint::from_bytes_be(data);
    let base = num_bigint::BigUint::from(36u32);
    let zero = num_bigint::BigUint::from(0u32);

    let mut chars: Vec<u8> = Vec::with_capacity(length);
    while num > zero {
        let rem = &num % &base;
        num /= &base;
        let digits = rem.to_u32_digits();
        let idx = if digits.is_empty() { 0 } else { digits[0] as usize };
        chars.push(BASE36_ALPHABET[idx]);
    }
    chars.reverse();

    let mut s = String::from_utf8(chars).expect("base36 chars are valid UTF-8");
    if s.len() < length {
        s = "0".repeat(length - s.len()) + &s;
    }
    if s.len() > length {
        s = s[s.len() - length..].to_owned();
    }
    s
}

/// Mints a document key for `table`, deterministic in `counter` and
/// `nonce` (a caller-supplied tiebreaker, e.g. a retry attempt number) but
/// otherwise opaque. The in-memory host pairs this with the table name to
/// build a branded [`crate::Id`].
pub fn generate_document_key(table: &str, counter: u64, nonce: u32) -> String {
    let content = format!("{table}|{counter}|{nonce}");
    let hash = Sha256::digest(content.as_bytes());
    encode_base36(&hash[..8], 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_base36_basic() {
        assert_eq!(encode_base36(&[], 4), "0000");
    }

    #[test]
    fn encode_base36_length() {
        let data = [0xFF, 0xFF];
        assert_eq!(encode_base36(&data, 4).len(), 4);
    }

    #[test]
    fn encode_base36_truncates() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(encode_base36(&data, 3).len(), 3);
    }

    #[test]
    fn generate_document_key_deterministic() {
        let a = generate_document_key("users", 1, 0);
        let b = generate_document_key("users", 1, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn generate_document_key_varies_by_counter() {
        let a = generate_document_key("users", 1, 0);
        let b = generate_document_key("users", 2, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn generate_document_key_varies_by_table() {
        let a = generate_document_key("users", 1, 0);
        let b = generate_document_key("posts", 1, 0);
        assert_ne!(a, b);
    }
}
