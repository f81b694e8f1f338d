//! Ledger Entries
//!
//! Immutable records of a signed amount attributed to one account.
//! Entries are written once and never updated or deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Amount;

/// Kind of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Funds added from outside the ledger
    Deposit,
    /// One leg of a peer-to-peer transfer
    Transfer,
    /// Undoes a prior deposit or transfer
    Reversal,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Deposit => "deposit",
            EntryKind::Transfer => "transfer",
            EntryKind::Reversal => "reversal",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(EntryKind::Deposit),
            "transfer" => Ok(EntryKind::Transfer),
            "reversal" => Ok(EntryKind::Reversal),
            other => Err(format!("unknown entry kind '{}'", other)),
        }
    }
}

/// The other party on a transfer or reversal leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: String,
    pub name: String,
}

impl Counterparty {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A persisted ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub owner_id: String,
    pub kind: EntryKind,
    /// Positive credits the owner, negative debits
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Outgoing transfer leg (the owner was the sender)
    pub fn is_outgoing(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Magnitude of the entry as a positive amount
    pub fn magnitude(&self) -> Option<Amount> {
        Amount::new(self.amount.abs()).ok()
    }
}

/// An entry about to be written; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    pub owner_id: String,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub reference_id: Option<Uuid>,
    pub counterparty: Option<Counterparty>,
}

impl NewLedgerEntry {
    pub fn deposit(owner_id: &str, amount: &Amount) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            kind: EntryKind::Deposit,
            amount: amount.value(),
            reference_id: None,
            counterparty: None,
        }
    }

    pub fn transfer_debit(owner_id: &str, amount: &Amount, recipient: Counterparty) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            kind: EntryKind::Transfer,
            amount: amount.negated(),
            reference_id: None,
            counterparty: Some(recipient),
        }
    }

    pub fn transfer_credit(
        owner_id: &str,
        amount: &Amount,
        debit_id: Uuid,
        sender: Counterparty,
    ) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            kind: EntryKind::Transfer,
            amount: amount.value(),
            reference_id: Some(debit_id),
            counterparty: Some(sender),
        }
    }

    /// Reversal leg with a signed amount; `origin_id` is the entry being undone
    pub fn reversal(
        owner_id: &str,
        amount: Decimal,
        origin_id: Uuid,
        counterparty: Option<Counterparty>,
    ) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            kind: EntryKind::Reversal,
            amount,
            reference_id: Some(origin_id),
            counterparty,
        }
    }

    /// Materialize the entry with a store-assigned id and timestamp
    pub fn into_entry(self, id: Uuid, created_at: DateTime<Utc>) -> LedgerEntry {
        let (counterparty_id, counterparty_name) = match self.counterparty {
            Some(c) => (Some(c.id), Some(c.name)),
            None => (None, None),
        };

        LedgerEntry {
            id,
            owner_id: self.owner_id,
            kind: self.kind,
            amount: self.amount,
            reference_id: self.reference_id,
            counterparty_id,
            counterparty_name,
            created_at,
        }
    }
}
