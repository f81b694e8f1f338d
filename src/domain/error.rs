//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::AmountError;

/// Which side of a ledger operation an account plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Requester,
    Recipient,
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Party::Requester => write!(f, "requester"),
            Party::Recipient => write!(f, "recipient"),
        }
    }
}

/// Business rule violations raised by the wallet engine.
///
/// Every variant is deterministic: re-issuing the identical request against
/// the same ledger state yields the identical error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Sender account not found: {0}")]
    SenderNotFound(String),

    #[error("Recipient account not found: {0}")]
    RecipientNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    #[error("Cannot transfer to yourself")]
    SelfTransferNotAllowed,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    /// The party that has to give the funds back no longer holds them
    #[error("Insufficient {party} balance to revert transaction: required {required}, available {available}")]
    InsufficientBalanceToRevert {
        party: Party,
        required: Decimal,
        available: Decimal,
    },

    #[error("Cannot revert transaction {0} owned by another account")]
    NotOwner(Uuid),

    #[error("Transaction already reverted: {0}")]
    AlreadyReverted(Uuid),

    #[error("Cannot revert a reversal transaction: {0}")]
    CannotRevertReversal(Uuid),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Balance would exceed the allowed maximum")]
    BalanceOverflow,
}

impl DomainError {
    pub fn insufficient_balance(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance { required, available }
    }

    pub fn insufficient_to_revert(party: Party, required: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalanceToRevert {
            party,
            required,
            available,
        }
    }

    /// Check if this is a client error (request can never succeed as issued)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::BalanceOverflow)
    }
}

impl From<AmountError> for DomainError {
    fn from(err: AmountError) -> Self {
        DomainError::InvalidAmount(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_balance_error() {
        let err = DomainError::insufficient_balance(dec!(100), dec!(50));

        assert!(err.is_client_error());
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn test_insufficient_to_revert_names_party() {
        let err = DomainError::insufficient_to_revert(Party::Recipient, dec!(40), dec!(10));
        assert!(err.to_string().contains("recipient"));
    }

    #[test]
    fn test_overflow_is_not_a_client_error() {
        assert!(!DomainError::BalanceOverflow.is_client_error());
        assert!(DomainError::TransactionNotFound(Uuid::nil()).is_client_error());
    }

    #[test]
    fn test_amount_error_conversion() {
        let err: DomainError = AmountError::Overflow.into();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
    }
}
