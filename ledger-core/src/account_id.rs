//! Canonical account identifiers
//!
//! An account identifier is `crc32_be(hash) ++ hash` where
//! `hash = sha224("\x0Aaccount-id" ++ principal ++ subaccount)`. The wire form
//! is the 64-character lowercase hex encoding of those 32 bytes.
//!
//! A single wrong bit sends funds to an address nobody controls, so the only
//! ways to obtain an [`AccountIdentifier`] are derivation from a principal or
//! parsing with a checksum check.

use crate::crypto::{crc32_be, sha224, ACCOUNT_DOMAIN_SEPARATOR};
use crate::types::{Principal, SubAccount};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of the hash part
pub const HASH_LEN: usize = 28;

/// Length of the checksum part
pub const CHECKSUM_LEN: usize = 4;

/// Length of the binary identifier
pub const ACCOUNT_ID_LEN: usize = CHECKSUM_LEN + HASH_LEN;

/// Length of the hex wire form
pub const ACCOUNT_ID_HEX_LEN: usize = ACCOUNT_ID_LEN * 2;

/// Checksummed ledger account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountIdentifier {
    hash: [u8; HASH_LEN],
}

impl AccountIdentifier {
    /// Derive the identifier of `principal`'s `subaccount` (default subaccount if `None`)
    pub fn new(principal: &Principal, subaccount: Option<&SubAccount>) -> Self {
        let default = SubAccount::default();
        let subaccount = subaccount.unwrap_or(&default);

        let hash = sha224(&[
            ACCOUNT_DOMAIN_SEPARATOR,
            principal.as_slice(),
            subaccount.as_bytes(),
        ]);

        Self { hash }
    }

    /// Parse 32 binary bytes, verifying the checksum
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ACCOUNT_ID_LEN {
            return Err(Error::InvalidLength {
                expected: ACCOUNT_ID_LEN,
                actual: bytes.len(),
            });
        }

        let (checksum, hash) = bytes.split_at(CHECKSUM_LEN);
        let expected = crc32_be(hash);
        if checksum != expected {
            return Err(Error::ChecksumMismatch {
                expected: u32::from_be_bytes(expected),
                found: u32::from_be_bytes([checksum[0], checksum[1], checksum[2], checksum[3]]),
            });
        }

        let mut array = [0u8; HASH_LEN];
        array.copy_from_slice(hash);
        Ok(Self { hash: array })
    }

    /// Parse the 64-character lowercase hex wire form, verifying the checksum
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != ACCOUNT_ID_HEX_LEN {
            return Err(Error::InvalidLength {
                expected: ACCOUNT_ID_HEX_LEN,
                actual: hex_str.len(),
            });
        }
        if let Some((index, c)) = hex_str.char_indices().find(|(_, c)| c.is_ascii_uppercase()) {
            return Err(hex::FromHexError::InvalidHexCharacter { c, index }.into());
        }
        let bytes = hex::decode(hex_str)?;
        Self::from_slice(&bytes)
    }

    /// Check that `hex_str` is a well-formed identifier
    ///
    /// Must pass before the string is used as a transfer destination.
    pub fn validate(hex_str: &str) -> Result<()> {
        Self::from_hex(hex_str).map(|_| ())
    }

    /// Boolean form of [`AccountIdentifier::validate`]
    pub fn is_valid(hex_str: &str) -> bool {
        Self::validate(hex_str).is_ok()
    }

    /// Big-endian CRC-32 of the hash
    pub fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        crc32_be(&self.hash)
    }

    /// SHA-224 hash part
    pub fn hash(&self) -> &[u8; HASH_LEN] {
        &self.hash
    }

    /// Binary form: checksum followed by hash
    pub fn to_bytes(&self) -> [u8; ACCOUNT_ID_LEN] {
        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        bytes[..CHECKSUM_LEN].copy_from_slice(&self.checksum());
        bytes[CHECKSUM_LEN..].copy_from_slice(&self.hash);
        bytes
    }

    /// Lowercase hex wire form (always 64 characters)
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl fmt::Display for AccountIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for AccountIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountIdentifier({})", self.to_hex())
    }
}

impl FromStr for AccountIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for AccountIdentifier {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

impl From<AccountIdentifier> for String {
    fn from(id: AccountIdentifier) -> Self {
        id.to_hex()
    }
}
