//! Command definitions
//!
//! Commands represent intentions to change a wallet; receipts are what the
//! engine hands back once the change is committed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Amount, Balance};

pub const DEPOSIT_ACCEPTED: &str = "deposit accepted";
pub const TRANSFER_ACCEPTED: &str = "transfer accepted";
pub const TRANSACTION_REVERTED: &str = "transaction reverted";

// =========================================================================
// DepositCommand
// =========================================================================

/// Command to add external funds to an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositCommand {
    pub user_id: String,
    pub amount: Amount,
}

impl DepositCommand {
    pub fn new(user_id: impl Into<String>, amount: Amount) -> Self {
        Self {
            user_id: user_id.into(),
            amount,
        }
    }
}

// =========================================================================
// TransferCommand
// =========================================================================

/// Command to move funds between two accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub sender_id: String,
    pub recipient_id: String,
    pub amount: Amount,
}

impl TransferCommand {
    pub fn new(
        sender_id: impl Into<String>,
        recipient_id: impl Into<String>,
        amount: Amount,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            recipient_id: recipient_id.into(),
            amount,
        }
    }
}

// =========================================================================
// RevertCommand
// =========================================================================

/// Command to undo a deposit or one leg of a transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevertCommand {
    pub requester_id: String,
    /// Id of the ledger entry to revert
    pub transaction_id: Uuid,
}

impl RevertCommand {
    pub fn new(requester_id: impl Into<String>, transaction_id: Uuid) -> Self {
        Self {
            requester_id: requester_id.into(),
            transaction_id,
        }
    }
}

/// Result of a committed wallet operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationReceipt {
    pub message: String,
    /// The requester's balance after the operation
    pub balance: Balance,
}

impl OperationReceipt {
    pub fn new(message: &str, balance: Balance) -> Self {
        Self {
            message: message.to_string(),
            balance,
        }
    }
}

/// Current balance of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceView {
    pub balance: Balance,
}
