//! Hashing primitives for identifier derivation
//!
//! This module provides:
//! - SHA-224 over a sequence of byte slices
//! - Big-endian CRC-32 checksums (IEEE polynomial)

use sha2::{Digest, Sha224};

/// Domain separator prefixed to every account identifier preimage
pub const ACCOUNT_DOMAIN_SEPARATOR: &[u8] = b"\x0Aaccount-id";

/// Hash the concatenation of `parts` using SHA-224
pub fn sha224(parts: &[&[u8]]) -> [u8; 28] {
    let mut hasher = Sha224::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// CRC-32 of `data`, big-endian
pub fn crc32_be(data: &[u8]) -> [u8; 4] {
    crc32fast::hash(data).to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha224_known_vector() {
        // FIPS 180-2 "abc"
        let digest = sha224(&[b"abc"]);
        assert_eq!(
            hex::encode(digest),
            "23097d223405d8228642a477bda255b32aadbce4bda0b3f7e36c9da7"
        );
    }

    #[test]
    fn test_sha224_concatenates_parts() {
        assert_eq!(sha224(&[b"a", b"bc"]), sha224(&[b"abc"]));
        assert_eq!(sha224(&[b"", b"abc", b""]), sha224(&[b"abc"]));
    }

    #[test]
    fn test_crc32_known_vector() {
        assert_eq!(crc32_be(b"123456789"), 0xCBF4_3926u32.to_be_bytes());
        assert_eq!(crc32_be(b""), [0u8; 4]);
    }

    #[test]
    fn test_domain_separator_layout() {
        assert_eq!(ACCOUNT_DOMAIN_SEPARATOR.len(), 11);
        assert_eq!(ACCOUNT_DOMAIN_SEPARATOR[0], 0x0A);
        assert_eq!(&ACCOUNT_DOMAIN_SEPARATOR[1..], b"account-id");
    }
}
