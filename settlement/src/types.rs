//! Settlement status types

use ledger_core::{BlockHeight, Principal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity produced by a completed multi-part ledger operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatedEntity {
    /// New canister
    Canister(Principal),

    /// New neuron
    Neuron(u64),
}

/// Backend status of a multi-part ledger operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    /// Finished successfully
    Complete,

    /// Finished and created an entity
    EntityCreated(CreatedEntity),

    /// Failed; funds returned in the referenced block
    Refunded {
        /// Refund transaction
        block_height: BlockHeight,
        /// Failure description
        message: String,
    },

    /// Failed
    Error(String),

    /// Unknown to the backend
    NotFound,

    /// Waiting to be processed
    Queued,

    /// Backend has not yet synced the block
    PendingSync,

    /// Failed; refund not yet issued
    ErrorWithRefundPending(String),
}

impl SettlementStatus {
    /// True if polling can stop
    pub fn is_terminal(&self) -> bool {
        match self {
            SettlementStatus::Complete
            | SettlementStatus::EntityCreated(_)
            | SettlementStatus::Refunded { .. }
            | SettlementStatus::Error(_)
            | SettlementStatus::NotFound => true,
            SettlementStatus::Queued
            | SettlementStatus::PendingSync
            | SettlementStatus::ErrorWithRefundPending(_) => false,
        }
    }

    /// True for outcomes where the operation took effect
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SettlementStatus::Complete | SettlementStatus::EntityCreated(_)
        )
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementStatus::Complete => write!(f, "complete"),
            SettlementStatus::EntityCreated(CreatedEntity::Canister(id)) => {
                write!(f, "canister {} created", id)
            }
            SettlementStatus::EntityCreated(CreatedEntity::Neuron(id)) => {
                write!(f, "neuron {} created", id)
            }
            SettlementStatus::Refunded {
                block_height,
                message,
            } => write!(f, "refunded in block {}: {}", block_height, message),
            SettlementStatus::Error(message) => write!(f, "error: {}", message),
            SettlementStatus::NotFound => write!(f, "not found"),
            SettlementStatus::Queued => write!(f, "queued"),
            SettlementStatus::PendingSync => write!(f, "pending sync"),
            SettlementStatus::ErrorWithRefundPending(message) => {
                write!(f, "error, refund pending: {}", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        let terminal = [
            SettlementStatus::Complete,
            SettlementStatus::EntityCreated(CreatedEntity::Neuron(7)),
            SettlementStatus::Refunded {
                block_height: 12,
                message: "insufficient cycles".to_string(),
            },
            SettlementStatus::Error("rejected".to_string()),
            SettlementStatus::NotFound,
        ];
        assert!(terminal.iter().all(SettlementStatus::is_terminal));

        let pending = [
            SettlementStatus::Queued,
            SettlementStatus::PendingSync,
            SettlementStatus::ErrorWithRefundPending("retrying".to_string()),
        ];
        assert!(!pending.iter().any(SettlementStatus::is_terminal));
    }

    #[test]
    fn test_success_classification() {
        assert!(SettlementStatus::Complete.is_success());
        assert!(
            SettlementStatus::EntityCreated(CreatedEntity::Canister(Principal::anonymous()))
                .is_success()
        );
        assert!(!SettlementStatus::NotFound.is_success());
        assert!(!SettlementStatus::Error("x".to_string()).is_success());
    }

    #[test]
    fn test_serde_roundtrip_with_principal() {
        let status = SettlementStatus::EntityCreated(CreatedEntity::Canister(
            Principal::from_text("ryjl3-tyaaa-aaaaa-aaaba-cai").unwrap(),
        ));
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(
            json,
            r#"{"EntityCreated":{"Canister":"ryjl3-tyaaa-aaaaa-aaaba-cai"}}"#
        );
        let back: SettlementStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn test_display() {
        let status = SettlementStatus::Refunded {
            block_height: 42,
            message: "canister creation failed".to_string(),
        };
        assert_eq!(
            status.to_string(),
            "refunded in block 42: canister creation failed"
        );
    }
}
