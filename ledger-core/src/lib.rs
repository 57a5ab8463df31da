//! Ledger Client Core
//!
//! Primitives shared by every ledger-facing part of the client.
//!
//! # Contents
//!
//! - **Principals & subaccounts**: byte-exact identities and their text form
//! - **Account identifiers**: SHA-224 + CRC-32 derivation and validation
//! - **Tokens**: integer e8s with checked arithmetic
//! - **Transfers**: requests whose destination is always a validated identifier
//!
//! # Invariants
//!
//! - Every `AccountIdentifier` satisfies `checksum == crc32(hash)`
//! - Derivation is deterministic and bit-exact across implementations
//! - Amounts never pass through floating point

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod account_id;
pub mod config;
pub mod crypto;
pub mod error;
pub mod transfer;
pub mod types;

// Re-exports
pub use account_id::AccountIdentifier;
pub use config::Config;
pub use error::{Error, Result};
pub use transfer::TransferRequest;
pub use types::{BlockHeight, Principal, SubAccount, Tokens, DEFAULT_TRANSFER_FEE};
