//! Error types for ledger primitives

use thiserror::Error;

/// Result type for ledger primitive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger primitive errors
#[derive(Error, Debug)]
pub enum Error {
    /// Identifier has the wrong length
    #[error("Invalid account identifier length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Identifier contains non-hex characters
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Leading checksum does not match the CRC-32 of the hash
    #[error("Checksum mismatch: expected {expected:08x}, found {found:08x}")]
    ChecksumMismatch {
        /// CRC-32 of the hash part
        expected: u32,
        /// Checksum carried by the identifier
        found: u32,
    },

    /// Malformed principal
    #[error("Invalid principal: {0}")]
    InvalidPrincipal(String),

    /// Malformed subaccount
    #[error("Invalid subaccount: {0}")]
    InvalidSubAccount(String),

    /// Balance does not cover amount plus fee
    #[error("Insufficient funds: need {required} e8s, have {available} e8s")]
    InsufficientFunds {
        /// Amount plus fee
        required: u64,
        /// Available balance
        available: u64,
    },

    /// Token arithmetic overflowed
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
