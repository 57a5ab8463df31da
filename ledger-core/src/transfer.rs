//! Validated transfer requests
//!
//! Destination strings go through [`AccountIdentifier`] parsing here, so a
//! malformed or checksum-failing address can never reach a ledger transfer.

use crate::account_id::AccountIdentifier;
use crate::types::{SubAccount, Tokens};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Transfer ready for submission to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Destination account
    pub to: AccountIdentifier,

    /// Amount to move
    pub amount: Tokens,

    /// Ledger fee
    pub fee: Tokens,

    /// Source subaccount (default subaccount if `None`)
    pub from_subaccount: Option<SubAccount>,

    /// Caller-chosen memo
    pub memo: u64,
}

impl TransferRequest {
    /// Build a transfer to the hex identifier `to`
    pub fn new(
        to: &str,
        amount: Tokens,
        fee: Tokens,
        from_subaccount: Option<SubAccount>,
    ) -> Result<Self> {
        let to = AccountIdentifier::from_hex(to).map_err(|e| {
            warn!("Rejected transfer destination '{}': {}", to, e);
            e
        })?;

        Ok(Self {
            to,
            amount,
            fee,
            from_subaccount,
            memo: 0,
        })
    }

    /// Set the memo
    pub fn with_memo(mut self, memo: u64) -> Self {
        self.memo = memo;
        self
    }

    /// Amount plus fee
    pub fn total(&self) -> Result<Tokens> {
        self.amount.checked_add(self.fee).ok_or_else(|| {
            Error::AmountOverflow(format!(
                "{} + {} e8s",
                self.amount.get_e8s(),
                self.fee.get_e8s()
            ))
        })
    }

    /// Fail unless `balance` covers amount plus fee
    pub fn ensure_covered_by(&self, balance: Tokens) -> Result<()> {
        let required = self.total()?;
        if required > balance {
            return Err(Error::InsufficientFunds {
                required: required.get_e8s(),
                available: balance.get_e8s(),
            });
        }
        Ok(())
    }
}
