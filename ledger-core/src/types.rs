//! Core types for the ledger client
//!
//! All types are designed for:
//! - Byte-exact identifiers (principals, subaccounts)
//! - Exact integer arithmetic on e8s (no floating point for money)

use crate::crypto::crc32_be;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Position of a transaction in the ledger log
pub type BlockHeight = u64;

/// Maximum length of a principal's raw bytes
pub const MAX_PRINCIPAL_LEN: usize = 29;

/// Length of a subaccount
pub const SUBACCOUNT_LEN: usize = 32;

/// e8s in one whole token
pub const E8S_PER_TOKEN: u64 = 100_000_000;

/// Standard ledger transfer fee
pub const DEFAULT_TRANSFER_FEE: Tokens = Tokens::from_e8s(10_000);

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Opaque identity of an actor on the network
///
/// Textual form is `base32(crc32_be(bytes) ++ bytes)` in groups of five
/// characters separated by `-`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(Vec<u8>);

impl Principal {
    /// Create from raw bytes (at most 29)
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_PRINCIPAL_LEN {
            return Err(Error::InvalidPrincipal(format!(
                "{} bytes exceeds maximum of {}",
                bytes.len(),
                MAX_PRINCIPAL_LEN
            )));
        }
        Ok(Self(bytes.to_vec()))
    }

    /// The management canister (`aaaaa-aa`), empty byte string
    pub fn management_canister() -> Self {
        Self(Vec::new())
    }

    /// The anonymous principal (`2vxsx-fae`)
    pub fn anonymous() -> Self {
        Self(vec![0x04])
    }

    /// Raw bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Parse the dashed base32 textual form
    pub fn from_text(text: &str) -> Result<Self> {
        let lowered = text.to_ascii_lowercase();
        let compact: String = lowered.chars().filter(|c| *c != '-').collect();

        let decoded = base32_decode(&compact).ok_or_else(|| {
            Error::InvalidPrincipal(format!("'{}' is not valid base32", text))
        })?;
        if decoded.len() < 4 {
            return Err(Error::InvalidPrincipal(format!("'{}' is too short", text)));
        }

        let (checksum, bytes) = decoded.split_at(4);
        let principal = Self::from_slice(bytes)?;
        if crc32_be(bytes) != checksum {
            return Err(Error::InvalidPrincipal(format!(
                "'{}' has a wrong checksum",
                text
            )));
        }
        // Rejects bad grouping and non-zero trailing bits
        if principal.to_text() != lowered {
            return Err(Error::InvalidPrincipal(format!(
                "'{}' is not in canonical form",
                text
            )));
        }

        Ok(principal)
    }

    /// Dashed base32 textual form
    pub fn to_text(&self) -> String {
        let mut payload = Vec::with_capacity(4 + self.0.len());
        payload.extend_from_slice(&crc32_be(&self.0));
        payload.extend_from_slice(&self.0);

        let encoded = base32_encode(&payload);
        let mut text = String::with_capacity(encoded.len() + encoded.len() / 5);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % 5 == 0 {
                text.push('-');
            }
            text.push(c);
        }
        text
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.to_text())
    }
}

impl FromStr for Principal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::from_text(&s)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.to_text()
    }
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8 + 4) / 5);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }

    out
}

fn base32_decode(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for c in text.bytes() {
        let value = BASE32_ALPHABET.iter().position(|&a| a == c)? as u32;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }

    Some(out)
}

/// 32-byte disambiguator letting one principal control many accounts
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubAccount([u8; SUBACCOUNT_LEN]);

impl SubAccount {
    /// Wrap raw bytes
    pub const fn new(bytes: [u8; SUBACCOUNT_LEN]) -> Self {
        Self(bytes)
    }

    /// Embed a principal: `[len, bytes.., 0..]`
    pub fn from_principal(principal: &Principal) -> Self {
        let bytes = principal.as_slice();
        let mut sub = [0u8; SUBACCOUNT_LEN];
        // MAX_PRINCIPAL_LEN + 1 <= SUBACCOUNT_LEN, so this always fits
        sub[0] = bytes.len() as u8;
        sub[1..=bytes.len()].copy_from_slice(bytes);
        Self(sub)
    }

    /// Create from a slice of exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; SUBACCOUNT_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidSubAccount(format!(
                "expected {} bytes, got {}",
                SUBACCOUNT_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Parse 64 hex characters
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::InvalidSubAccount(format!("'{}': {}", hex_str, e)))?;
        Self::from_slice(&bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; SUBACCOUNT_LEN] {
        &self.0
    }

    /// Lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// True for the all-zero default subaccount
    pub fn is_default(&self) -> bool {
        self.0 == [0u8; SUBACCOUNT_LEN]
    }
}

impl fmt::Debug for SubAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubAccount({})", self.to_hex())
    }
}

impl TryFrom<String> for SubAccount {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

impl From<SubAccount> for String {
    fn from(sub: SubAccount) -> Self {
        sub.to_hex()
    }
}

/// Token amount in e8s
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Tokens {
    e8s: u64,
}

impl Tokens {
    /// Zero tokens
    pub const ZERO: Tokens = Tokens { e8s: 0 };

    /// Create from e8s
    pub const fn from_e8s(e8s: u64) -> Self {
        Self { e8s }
    }

    /// Create from whole tokens
    pub fn from_tokens(tokens: u64) -> Result<Self> {
        tokens
            .checked_mul(E8S_PER_TOKEN)
            .map(Self::from_e8s)
            .ok_or_else(|| Error::AmountOverflow(format!("{} tokens", tokens)))
    }

    /// Amount in e8s
    pub const fn get_e8s(&self) -> u64 {
        self.e8s
    }

    /// Checked addition
    pub fn checked_add(self, other: Tokens) -> Option<Tokens> {
        self.e8s.checked_add(other.e8s).map(Self::from_e8s)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Tokens) -> Option<Tokens> {
        self.e8s.checked_sub(other.e8s).map(Self::from_e8s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_principals() {
        assert_eq!(Principal::management_canister().to_text(), "aaaaa-aa");
        assert_eq!(Principal::anonymous().to_text(), "2vxsx-fae");
        assert_eq!(
            Principal::from_slice(&[0, 0, 0, 0, 0, 0, 0, 2, 1, 1])
                .unwrap()
                .to_text(),
            "ryjl3-tyaaa-aaaaa-aaaba-cai"
        );
    }

    #[test]
    fn test_principal_text_roundtrip() {
        let principal: Principal = "ryjl3-tyaaa-aaaaa-aaaba-cai".parse().unwrap();
        assert_eq!(principal.as_slice(), &[0, 0, 0, 0, 0, 0, 0, 2, 1, 1]);
        assert_eq!(principal.to_string(), "ryjl3-tyaaa-aaaaa-aaaba-cai");

        let upper: Principal = "2VXSX-FAE".parse().unwrap();
        assert_eq!(upper, Principal::anonymous());
    }

    #[test]
    fn test_principal_rejects_bad_text() {
        // Wrong checksum
        assert!(Principal::from_text("aaaaa-ab").is_err());
        // Wrong grouping
        assert!(Principal::from_text("aaaa-aaa").is_err());
        // Not base32
        assert!(Principal::from_text("aaaaa-a1").is_err());
        // Too short
        assert!(Principal::from_text("aa").is_err());
    }

    #[test]
    fn test_principal_max_length() {
        assert!(Principal::from_slice(&[7u8; MAX_PRINCIPAL_LEN]).is_ok());
        assert!(Principal::from_slice(&[7u8; MAX_PRINCIPAL_LEN + 1]).is_err());
    }

    #[test]
    fn test_subaccount_from_principal() {
        let principal = Principal::from_slice(&[1, 2, 3]).unwrap();
        let sub = SubAccount::from_principal(&principal);

        let mut expected = [0u8; SUBACCOUNT_LEN];
        expected[..4].copy_from_slice(&[3, 1, 2, 3]);
        assert_eq!(sub.as_bytes(), &expected);
    }

    #[test]
    fn test_subaccount_from_longest_principal() {
        let principal = Principal::from_slice(&[0xff; MAX_PRINCIPAL_LEN]).unwrap();
        let sub = SubAccount::from_principal(&principal);
        assert_eq!(sub.as_bytes()[0], MAX_PRINCIPAL_LEN as u8);
        assert!(sub.as_bytes()[1..=MAX_PRINCIPAL_LEN].iter().all(|b| *b == 0xff));
        assert_eq!(&sub.as_bytes()[MAX_PRINCIPAL_LEN + 1..], &[0, 0]);
    }

    #[test]
    fn test_subaccount_hex() {
        assert!(SubAccount::default().is_default());
        assert_eq!(SubAccount::default().to_hex(), "0".repeat(64));

        let mut bytes = [0u8; SUBACCOUNT_LEN];
        bytes[31] = 1;
        let sub = SubAccount::from_hex(&format!("{}01", "0".repeat(62))).unwrap();
        assert_eq!(sub, SubAccount::new(bytes));
        assert!(SubAccount::from_hex("00").is_err());
        assert!(SubAccount::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_tokens_arithmetic() {
        let one = Tokens::from_tokens(1).unwrap();
        assert_eq!(one.get_e8s(), E8S_PER_TOKEN);
        assert_eq!(
            one.checked_add(DEFAULT_TRANSFER_FEE),
            Some(Tokens::from_e8s(100_010_000))
        );
        assert_eq!(Tokens::ZERO.checked_sub(DEFAULT_TRANSFER_FEE), None);
        assert_eq!(Tokens::from_e8s(u64::MAX).checked_add(Tokens::from_e8s(1)), None);
        assert!(Tokens::from_tokens(u64::MAX).is_err());
    }
}
