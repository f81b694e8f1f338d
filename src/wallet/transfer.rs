//! Transfer
//!
//! Moves funds between two accounts as a debit/credit pair. The debit is
//! written first because the credit references its id.

use crate::domain::{Counterparty, DomainError, NewLedgerEntry, OperationContext};
use crate::reconcile;
use crate::store::{LedgerStore, LedgerUnit};

use super::{
    lock_pair, OperationReceipt, TransferCommand, WalletEngine, WalletError, TRANSFER_ACCEPTED,
};

impl<S: LedgerStore> WalletEngine<S> {
    /// Execute the transfer command
    pub async fn transfer(
        &self,
        command: TransferCommand,
        context: &OperationContext,
    ) -> Result<OperationReceipt, WalletError> {
        if command.sender_id == command.recipient_id {
            return Err(DomainError::SelfTransferNotAllowed.into());
        }

        let mut unit = self.store.begin().await?;

        let (sender, recipient) =
            lock_pair(&mut unit, &command.sender_id, &command.recipient_id).await?;
        let sender =
            sender.ok_or_else(|| DomainError::SenderNotFound(command.sender_id.clone()))?;
        let recipient = recipient
            .ok_or_else(|| DomainError::RecipientNotFound(command.recipient_id.clone()))?;

        let outcome = reconcile::apply_transfer(&sender.balance, &recipient.balance, &command.amount)
            .map_err(|e| {
                tracing::debug!(
                    sender_id = %sender.user_id,
                    amount = %command.amount,
                    balance = %sender.balance,
                    "Transfer rejected: {}",
                    e
                );
                e
            })?;

        let debit = unit
            .insert_entry(NewLedgerEntry::transfer_debit(
                &sender.user_id,
                &command.amount,
                Counterparty::new(&recipient.user_id, &recipient.name),
            ))
            .await?;

        let credit = unit
            .insert_entry(NewLedgerEntry::transfer_credit(
                &recipient.user_id,
                &command.amount,
                debit.id,
                Counterparty::new(&sender.user_id, &sender.name),
            ))
            .await?;

        unit.save_balance(&sender.user_id, &outcome.new_sender_balance)
            .await?;
        unit.save_balance(&recipient.user_id, &outcome.new_recipient_balance)
            .await?;
        unit.commit().await?;

        tracing::info!(
            sender_id = %sender.user_id,
            recipient_id = %recipient.user_id,
            debit_id = %debit.id,
            credit_id = %credit.id,
            amount = %command.amount,
            correlation_id = ?context.correlation_id,
            request_user_id = ?context.request_user_id,
            client_ip = ?context.client_ip,
            "Transfer committed"
        );

        Ok(OperationReceipt::new(
            TRANSFER_ACCEPTED,
            outcome.new_sender_balance,
        ))
    }
}
