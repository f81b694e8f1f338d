//! Read-only queries
//!
//! Snapshot reads outside any unit; they never lock rows.

use crate::domain::{DomainError, LedgerEntry, Page, PageRequest, Pagination};
use crate::store::LedgerStore;

use super::{BalanceView, WalletEngine, WalletError};

impl<S: LedgerStore> WalletEngine<S> {
    /// Current cached balance of an account
    pub async fn get_balance(&self, user_id: &str) -> Result<BalanceView, WalletError> {
        let account = self
            .store
            .find_account(user_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(user_id.to_string()))?;

        Ok(BalanceView {
            balance: account.balance,
        })
    }

    /// Entries owned by `user_id`, newest first
    pub async fn list_transactions(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<Page<LedgerEntry>, WalletError> {
        let (items, total) = self.store.list_entries(user_id, page).await?;

        tracing::debug!(
            user_id = %user_id,
            page = page.page(),
            returned = items.len(),
            total,
            "Listed transactions"
        );

        Ok(Page {
            items,
            pagination: Pagination::new(&page, total),
        })
    }
}
