//! Wallet Engine
//!
//! Orchestrates deposits, transfers and reversals. Each operation runs in a
//! single store unit: account rows are locked, the reconciler computes the
//! new balances, entries and balances are written, and the unit commits.
//! Any error drops the unit, which rolls everything back.

mod commands;
mod deposit;
mod error;
mod query;
mod revert;
mod transfer;


pub use commands::*;
pub use error::WalletError;

use crate::domain::Account;
use crate::store::{LedgerStore, LedgerUnit, StoreResult};

/// Entry point for all wallet operations
#[derive(Debug, Clone)]
pub struct WalletEngine<S> {
    store: S,
}

impl<S: LedgerStore> WalletEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Lock two account rows in ascending user id order and return them as
/// `(first, second)` in argument order.
///
/// A fixed acquisition order keeps concurrent transfers between the same
/// pair of accounts from deadlocking.
async fn lock_pair<U: LedgerUnit>(
    unit: &mut U,
    first_id: &str,
    second_id: &str,
) -> StoreResult<(Option<Account>, Option<Account>)> {
    if first_id <= second_id {
        let first = unit.lock_account(first_id).await?;
        let second = unit.lock_account(second_id).await?;
        Ok((first, second))
    } else {
        let second = unit.lock_account(second_id).await?;
        let first = unit.lock_account(first_id).await?;
        Ok((first, second))
    }
}
