//! Deposit
//!
//! Credits external funds. A deposit into a negative balance is split into
//! a correction leg and a credit leg by the reconciler.

use crate::domain::{DomainError, NewLedgerEntry, OperationContext};
use crate::reconcile::{self, DepositPurpose};
use crate::store::{LedgerStore, LedgerUnit};

use super::{DepositCommand, OperationReceipt, WalletEngine, WalletError, DEPOSIT_ACCEPTED};

impl<S: LedgerStore> WalletEngine<S> {
    /// Execute the deposit command
    pub async fn deposit(
        &self,
        command: DepositCommand,
        context: &OperationContext,
    ) -> Result<OperationReceipt, WalletError> {
        let mut unit = self.store.begin().await?;

        let account = unit
            .lock_account(&command.user_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(command.user_id.clone()))?;

        let outcome = reconcile::apply_deposit(&account.balance, &command.amount)?;

        for leg in &outcome.legs {
            let entry = unit
                .insert_entry(NewLedgerEntry::deposit(&account.user_id, &leg.amount))
                .await?;

            if leg.purpose == DepositPurpose::Correction {
                tracing::debug!(
                    user_id = %account.user_id,
                    entry_id = %entry.id,
                    amount = %leg.amount,
                    "Deposit leg applied to negative balance"
                );
            }
        }

        unit.save_balance(&account.user_id, &outcome.new_balance)
            .await?;
        unit.commit().await?;

        tracing::info!(
            user_id = %account.user_id,
            amount = %command.amount,
            legs = outcome.legs.len(),
            balance = %outcome.new_balance,
            correlation_id = ?context.correlation_id,
            request_user_id = ?context.request_user_id,
            client_ip = ?context.client_ip,
            "Deposit committed"
        );

        Ok(OperationReceipt::new(DEPOSIT_ACCEPTED, outcome.new_balance))
    }
}
