//! Balance Reconciler
//!
//! Pure balance rules applied by the wallet engine. Nothing here touches the
//! store: every function takes current balances and returns the entries'
//! amounts and the resulting balances, or the business error that forbids
//! the operation.

use crate::domain::{Amount, Balance, DomainError, Party};

/// Why a deposit leg exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositPurpose {
    /// Clears (part of) a negative balance
    Correction,
    /// Ordinary new funds
    Credit,
}

/// One deposit entry to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositLeg {
    pub amount: Amount,
    pub purpose: DepositPurpose,
}

impl DepositLeg {
    fn new(amount: Amount, purpose: DepositPurpose) -> Self {
        Self { amount, purpose }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositOutcome {
    /// Legs in write order; their amounts always sum to the deposit
    pub legs: Vec<DepositLeg>,
    pub new_balance: Balance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub new_sender_balance: Balance,
    pub new_recipient_balance: Balance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositReversalOutcome {
    pub new_balance: Balance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReversalOutcome {
    pub new_sender_balance: Balance,
    pub new_recipient_balance: Balance,
}

fn overflow<E>(_: E) -> DomainError {
    DomainError::BalanceOverflow
}

/// Split a deposit against the current balance.
///
/// A non-negative balance gets a single credit leg. A negative balance first
/// receives a correction leg of at most the deficit; whatever is left over is
/// credited as a second leg.
pub fn apply_deposit(current: &Balance, amount: &Amount) -> Result<DepositOutcome, DomainError> {
    let new_balance = current.credit(amount).map_err(overflow)?;

    let legs = match current.deficit() {
        None => vec![DepositLeg::new(*amount, DepositPurpose::Credit)],
        Some(deficit) => match amount.checked_sub(&deficit) {
            // amount <= deficit: the whole deposit is a correction
            None => vec![DepositLeg::new(*amount, DepositPurpose::Correction)],
            Some(remainder) => vec![
                DepositLeg::new(deficit, DepositPurpose::Correction),
                DepositLeg::new(remainder, DepositPurpose::Credit),
            ],
        },
    };

    Ok(DepositOutcome { legs, new_balance })
}

/// Move `amount` from sender to recipient. The sender must cover it.
pub fn apply_transfer(
    sender: &Balance,
    recipient: &Balance,
    amount: &Amount,
) -> Result<TransferOutcome, DomainError> {
    if !sender.is_sufficient_for(amount) {
        return Err(DomainError::insufficient_balance(
            amount.value(),
            sender.value(),
        ));
    }

    Ok(TransferOutcome {
        new_sender_balance: sender.debit(amount).map_err(overflow)?,
        new_recipient_balance: recipient.credit(amount).map_err(overflow)?,
    })
}

/// Take a deposit back out of the requester's balance.
pub fn apply_deposit_reversal(
    current: &Balance,
    amount: &Amount,
) -> Result<DepositReversalOutcome, DomainError> {
    if !current.is_sufficient_for(amount) {
        return Err(DomainError::insufficient_to_revert(
            Party::Requester,
            amount.value(),
            current.value(),
        ));
    }

    Ok(DepositReversalOutcome {
        new_balance: current.debit(amount).map_err(overflow)?,
    })
}

/// Return a transfer's funds from the recipient to the sender.
///
/// Whichever leg is being reverted, the recipient is the one paying, so the
/// recipient must still hold the full amount.
pub fn apply_transfer_reversal(
    sender: &Balance,
    recipient: &Balance,
    amount: &Amount,
) -> Result<TransferReversalOutcome, DomainError> {
    if !recipient.is_sufficient_for(amount) {
        return Err(DomainError::insufficient_to_revert(
            Party::Recipient,
            amount.value(),
            recipient.value(),
        ));
    }

    Ok(TransferReversalOutcome {
        new_sender_balance: sender.credit(amount).map_err(overflow)?,
        new_recipient_balance: recipient.debit(amount).map_err(overflow)?,
    })
}
