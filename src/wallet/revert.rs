//! Revert
//!
//! Undoes a deposit or a transfer leg. Only the owner of an entry may revert
//! it, reversals themselves are final, and an entry is reverted at most once.
//! For transfers the two legs share a single reversal: once either leg has
//! been reverted, neither can be reverted again.

use crate::domain::{
    Account, Amount, Balance, Counterparty, DomainError, EntryKind, LedgerEntry, NewLedgerEntry,
    OperationContext,
};
use crate::reconcile;
use crate::store::{LedgerStore, LedgerUnit, StoreError};

use super::{
    lock_pair, OperationReceipt, RevertCommand, WalletEngine, WalletError, TRANSACTION_REVERTED,
};

impl<S: LedgerStore> WalletEngine<S> {
    /// Execute the revert command
    pub async fn revert(
        &self,
        command: RevertCommand,
        context: &OperationContext,
    ) -> Result<OperationReceipt, WalletError> {
        let mut unit = self.store.begin().await?;

        let origin = unit
            .find_entry(command.transaction_id)
            .await?
            .ok_or(DomainError::TransactionNotFound(command.transaction_id))?;

        if origin.owner_id != command.requester_id {
            tracing::warn!(
                requester_id = %command.requester_id,
                transaction_id = %origin.id,
                "Revert rejected: requester does not own the entry"
            );
            return Err(DomainError::NotOwner(origin.id).into());
        }

        // Entries are immutable, so the paired leg can be resolved before locking
        let paired = match origin.kind {
            EntryKind::Transfer => paired_leg(&mut unit, &origin).await?,
            EntryKind::Deposit | EntryKind::Reversal => None,
        };

        let (requester, counterparty) = match &paired {
            Some(pair) => lock_pair(&mut unit, &origin.owner_id, &pair.owner_id).await?,
            None => (unit.lock_account(&origin.owner_id).await?, None),
        };
        let requester =
            requester.ok_or_else(|| DomainError::AccountNotFound(origin.owner_id.clone()))?;

        if unit.find_reversal_of(origin.id).await?.is_some() {
            return Err(DomainError::AlreadyReverted(origin.id).into());
        }

        let new_balance = match origin.kind {
            EntryKind::Reversal => {
                return Err(DomainError::CannotRevertReversal(origin.id).into());
            }
            EntryKind::Deposit => revert_deposit(&mut unit, &origin, &requester).await?,
            EntryKind::Transfer => {
                let outgoing = origin.is_outgoing();
                let missing = |id: String| {
                    if outgoing {
                        DomainError::RecipientNotFound(id)
                    } else {
                        DomainError::SenderNotFound(id)
                    }
                };

                let pair = paired.ok_or_else(|| {
                    missing(
                        origin
                            .counterparty_id
                            .clone()
                            .unwrap_or_else(|| origin.id.to_string()),
                    )
                })?;
                if unit.find_reversal_of(pair.id).await?.is_some() {
                    return Err(DomainError::AlreadyReverted(origin.id).into());
                }
                let counterparty = counterparty.ok_or_else(|| missing(pair.owner_id.clone()))?;

                let (sender, recipient) = if outgoing {
                    (&requester, &counterparty)
                } else {
                    (&counterparty, &requester)
                };
                let (new_sender, new_recipient) =
                    revert_transfer(&mut unit, &origin, sender, recipient).await?;

                if outgoing {
                    new_sender
                } else {
                    new_recipient
                }
            }
        };

        unit.commit().await?;

        tracing::info!(
            requester_id = %requester.user_id,
            transaction_id = %origin.id,
            kind = %origin.kind,
            amount = %origin.amount,
            balance = %new_balance,
            correlation_id = ?context.correlation_id,
            request_user_id = ?context.request_user_id,
            client_ip = ?context.client_ip,
            "Reversal committed"
        );

        Ok(OperationReceipt::new(TRANSACTION_REVERTED, new_balance))
    }
}

/// The other leg of a transfer: the credit for a debit, the debit for a credit
async fn paired_leg<U: LedgerUnit>(
    unit: &mut U,
    origin: &LedgerEntry,
) -> Result<Option<LedgerEntry>, StoreError> {
    if origin.is_outgoing() {
        unit.find_transfer_credit(origin.id).await
    } else {
        match origin.reference_id {
            Some(debit_id) => Ok(unit
                .find_entry(debit_id)
                .await?
                .filter(|entry| entry.kind == EntryKind::Transfer)),
            None => Ok(None),
        }
    }
}

fn magnitude(entry: &LedgerEntry) -> Result<Amount, StoreError> {
    entry.magnitude().ok_or_else(|| {
        StoreError::Corrupted(format!(
            "entry {} has invalid amount {}",
            entry.id, entry.amount
        ))
    })
}

async fn revert_deposit<U: LedgerUnit>(
    unit: &mut U,
    origin: &LedgerEntry,
    requester: &Account,
) -> Result<Balance, WalletError> {
    let amount = magnitude(origin)?;
    let outcome = reconcile::apply_deposit_reversal(&requester.balance, &amount)?;

    unit.insert_entry(NewLedgerEntry::reversal(
        &requester.user_id,
        amount.negated(),
        origin.id,
        None,
    ))
    .await?;
    unit.save_balance(&requester.user_id, &outcome.new_balance)
        .await?;

    Ok(outcome.new_balance)
}

/// Write both reversal legs of a transfer and return the new
/// `(sender, recipient)` balances.
async fn revert_transfer<U: LedgerUnit>(
    unit: &mut U,
    origin: &LedgerEntry,
    sender: &Account,
    recipient: &Account,
) -> Result<(Balance, Balance), WalletError> {
    let amount = magnitude(origin)?;
    let outcome =
        reconcile::apply_transfer_reversal(&sender.balance, &recipient.balance, &amount)?;

    unit.insert_entry(NewLedgerEntry::reversal(
        &sender.user_id,
        amount.value(),
        origin.id,
        Some(Counterparty::new(&recipient.user_id, &recipient.name)),
    ))
    .await?;
    unit.insert_entry(NewLedgerEntry::reversal(
        &recipient.user_id,
        amount.negated(),
        origin.id,
        Some(Counterparty::new(&sender.user_id, &sender.name)),
    ))
    .await?;

    unit.save_balance(&sender.user_id, &outcome.new_sender_balance)
        .await?;
    unit.save_balance(&recipient.user_id, &outcome.new_recipient_balance)
        .await?;

    Ok((outcome.new_sender_balance, outcome.new_recipient_balance))
}
