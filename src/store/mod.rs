//! Ledger Store module
//!
//! Persistence for accounts and ledger entries. The wallet engine only sees
//! the traits below; PostgreSQL backs production and an in-memory store
//! backs tests.
//!
//! Every mutation happens inside a [`LedgerUnit`]: reads, entry inserts and
//! balance writes commit together or not at all.

mod error;
mod memory;
mod postgres;

pub use error::StoreError;
pub use memory::{MemoryLedgerStore, MemoryUnit};
pub use postgres::{PgLedgerStore, PgLedgerUnit};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, Balance, LedgerEntry, NewAccount, NewLedgerEntry, PageRequest};

pub type StoreResult<T> = Result<T, StoreError>;

/// Entry point to the store: snapshot reads and unit creation
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    type Unit: LedgerUnit;

    /// Open an atomic unit of work
    async fn begin(&self) -> StoreResult<Self::Unit>;

    async fn find_account(&self, user_id: &str) -> StoreResult<Option<Account>>;

    /// Entries owned by `owner_id`, newest first, plus the owner's total entry count
    async fn list_entries(
        &self,
        owner_id: &str,
        page: PageRequest,
    ) -> StoreResult<(Vec<LedgerEntry>, u64)>;

    /// Find-or-create an account with a zero balance
    async fn open_account(&self, account: NewAccount) -> StoreResult<Account>;
}

/// One atomic unit of work. Dropping it without `commit` rolls it back.
#[async_trait]
pub trait LedgerUnit: Send {
    /// Read an account and hold its row until the unit ends
    async fn lock_account(&mut self, user_id: &str) -> StoreResult<Option<Account>>;

    async fn find_entry(&mut self, id: Uuid) -> StoreResult<Option<LedgerEntry>>;

    /// The reversal entry referencing `id`, if one was recorded
    async fn find_reversal_of(&mut self, id: Uuid) -> StoreResult<Option<LedgerEntry>>;

    /// The credit leg written for the transfer debit `debit_id`
    async fn find_transfer_credit(&mut self, debit_id: Uuid) -> StoreResult<Option<LedgerEntry>>;

    /// Append an entry; the store assigns its id and timestamp
    async fn insert_entry(&mut self, entry: NewLedgerEntry) -> StoreResult<LedgerEntry>;

    async fn save_balance(&mut self, user_id: &str, balance: &Balance) -> StoreResult<()>;

    async fn commit(self) -> StoreResult<()>;
}
