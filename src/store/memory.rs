//! In-memory Ledger Store
//!
//! All state lives behind one async mutex. A unit holds the lock for its
//! whole lifetime, so units are serialised by construction. Writes are
//! staged on the unit and only applied to the shared state on commit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::{
    Account, Balance, EntryKind, LedgerEntry, NewAccount, NewLedgerEntry, PageRequest,
};

use super::{LedgerStore, LedgerUnit, StoreError, StoreResult};

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    /// Committed entries in insertion order
    entries: Vec<LedgerEntry>,
}

impl MemoryState {
    fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.last().map(|entry| entry.created_at)
    }
}

/// Ledger store kept entirely in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account with an arbitrary starting balance and no entries.
    ///
    /// Models state created outside the ledger (e.g. a charge-back that left
    /// the account negative). Replaces any account with the same id.
    pub async fn insert_account(&self, account: NewAccount, balance: Balance) -> Account {
        let now = Utc::now();
        let account = Account {
            user_id: account.user_id,
            name: account.name,
            email: account.email,
            balance,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.lock().await;
        state
            .accounts
            .insert(account.user_id.clone(), account.clone());
        account
    }

    /// Snapshot of every committed entry owned by `owner_id`, oldest first
    pub async fn entries_of(&self, owner_id: &str) -> Vec<LedgerEntry> {
        let state = self.state.lock().await;
        state
            .entries
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Number of committed entries across all accounts
    pub async fn entry_count(&self) -> usize {
        self.state.lock().await.entries.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> StoreResult<MemoryUnit> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(MemoryUnit {
            guard,
            staged_entries: Vec::new(),
            staged_balances: HashMap::new(),
        })
    }

    async fn find_account(&self, user_id: &str) -> StoreResult<Option<Account>> {
        Ok(self.state.lock().await.accounts.get(user_id).cloned())
    }

    async fn list_entries(
        &self,
        owner_id: &str,
        page: PageRequest,
    ) -> StoreResult<(Vec<LedgerEntry>, u64)> {
        let state = self.state.lock().await;
        let owned: Vec<&LedgerEntry> = state
            .entries
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .collect();

        let total = owned.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items = owned
            .into_iter()
            .rev()
            .skip(offset)
            .take(page.limit() as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn open_account(&self, account: NewAccount) -> StoreResult<Account> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let opened = state
            .accounts
            .entry(account.user_id.clone())
            .or_insert_with(|| Account {
                user_id: account.user_id,
                name: account.name,
                email: account.email,
                balance: Balance::zero(),
                created_at: now,
                updated_at: now,
            });
        Ok(opened.clone())
    }
}

/// Unit of work over the in-memory store
pub struct MemoryUnit {
    guard: OwnedMutexGuard<MemoryState>,
    staged_entries: Vec<LedgerEntry>,
    staged_balances: HashMap<String, Balance>,
}

impl MemoryUnit {
    fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.guard.entries.iter().chain(self.staged_entries.iter())
    }
}

#[async_trait]
impl LedgerUnit for MemoryUnit {
    async fn lock_account(&mut self, user_id: &str) -> StoreResult<Option<Account>> {
        let account = self.guard.accounts.get(user_id).cloned().map(|mut account| {
            if let Some(balance) = self.staged_balances.get(user_id) {
                account.balance = *balance;
            }
            account
        });
        Ok(account)
    }

    async fn find_entry(&mut self, id: Uuid) -> StoreResult<Option<LedgerEntry>> {
        Ok(self.entries().find(|entry| entry.id == id).cloned())
    }

    async fn find_reversal_of(&mut self, id: Uuid) -> StoreResult<Option<LedgerEntry>> {
        Ok(self
            .entries()
            .find(|entry| entry.kind == EntryKind::Reversal && entry.reference_id == Some(id))
            .cloned())
    }

    async fn find_transfer_credit(&mut self, debit_id: Uuid) -> StoreResult<Option<LedgerEntry>> {
        Ok(self
            .entries()
            .find(|entry| {
                entry.kind == EntryKind::Transfer && entry.reference_id == Some(debit_id)
            })
            .cloned())
    }

    async fn insert_entry(&mut self, entry: NewLedgerEntry) -> StoreResult<LedgerEntry> {
        if !self.guard.accounts.contains_key(&entry.owner_id) {
            return Err(StoreError::Corrupted(format!(
                "entry owner {} has no account",
                entry.owner_id
            )));
        }

        if entry.kind == EntryKind::Reversal {
            let duplicate = self.entries().any(|existing| {
                existing.kind == EntryKind::Reversal
                    && existing.reference_id == entry.reference_id
                    && existing.owner_id == entry.owner_id
            });
            if duplicate {
                return Err(StoreError::Conflict(format!(
                    "reversal of {:?} already recorded for {}",
                    entry.reference_id, entry.owner_id
                )));
            }
        }

        // Keep timestamps non-decreasing in insertion order
        let last = self
            .staged_entries
            .last()
            .map(|entry| entry.created_at)
            .or_else(|| self.guard.latest_timestamp());
        let now = Utc::now();
        let created_at = match last {
            Some(last) if last > now => last,
            _ => now,
        };

        let stored = entry.into_entry(Uuid::new_v4(), created_at);
        self.staged_entries.push(stored.clone());
        Ok(stored)
    }

    async fn save_balance(&mut self, user_id: &str, balance: &Balance) -> StoreResult<()> {
        if !self.guard.accounts.contains_key(user_id) {
            return Err(StoreError::Corrupted(format!(
                "balance write for unknown account {}",
                user_id
            )));
        }
        self.staged_balances.insert(user_id.to_string(), *balance);
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        let MemoryUnit {
            mut guard,
            mut staged_entries,
            staged_balances,
        } = self;

        let now = Utc::now();
        for (user_id, balance) in staged_balances {
            if let Some(account) = guard.accounts.get_mut(&user_id) {
                account.balance = balance;
                account.updated_at = now;
            }
        }
        guard.entries.append(&mut staged_entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::domain::Amount;

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_open_account_is_find_or_create() {
        let store = MemoryLedgerStore::new();

        let first = store
            .open_account(NewAccount::new("alice", "Alice", "alice@example.com"))
            .await
            .unwrap();
        assert_eq!(first.balance, Balance::zero());

        let again = store
            .open_account(NewAccount::new("alice", "Someone Else", "other@example.com"))
            .await
            .unwrap();
        assert_eq!(again.name, "Alice");
    }

    #[tokio::test]
    async fn test_uncommitted_unit_rolls_back() {
        let store = MemoryLedgerStore::new();
        store
            .open_account(NewAccount::new("alice", "Alice", "alice@example.com"))
            .await
            .unwrap();

        {
            let mut unit = store.begin().await.unwrap();
            unit.insert_entry(NewLedgerEntry::deposit("alice", &amount(dec!(10))))
                .await
                .unwrap();
            unit.save_balance("alice", &Balance::new(dec!(10)).unwrap())
                .await
                .unwrap();
            // dropped without commit
        }

        assert_eq!(store.entry_count().await, 0);
        let account = store.find_account("alice").await.unwrap().unwrap();
        assert_eq!(account.balance, Balance::zero());
    }

    #[tokio::test]
    async fn test_unit_sees_its_own_writes() {
        let store = MemoryLedgerStore::new();
        store
            .open_account(NewAccount::new("alice", "Alice", "alice@example.com"))
            .await
            .unwrap();

        let mut unit = store.begin().await.unwrap();
        let entry = unit
            .insert_entry(NewLedgerEntry::deposit("alice", &amount(dec!(10))))
            .await
            .unwrap();
        unit.save_balance("alice", &Balance::new(dec!(10)).unwrap())
            .await
            .unwrap();

        assert!(unit.find_entry(entry.id).await.unwrap().is_some());
        let account = unit.lock_account("alice").await.unwrap().unwrap();
        assert_eq!(account.balance.value(), dec!(10));

        unit.commit().await.unwrap();
        assert_eq!(store.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_reversal_is_conflict() {
        let store = MemoryLedgerStore::new();
        store
            .open_account(NewAccount::new("alice", "Alice", "alice@example.com"))
            .await
            .unwrap();

        let origin = Uuid::new_v4();
        let mut unit = store.begin().await.unwrap();
        unit.insert_entry(NewLedgerEntry::reversal("alice", dec!(-5), origin, None))
            .await
            .unwrap();
        let second = unit
            .insert_entry(NewLedgerEntry::reversal("alice", dec!(-5), origin, None))
            .await;

        assert!(matches!(second, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_entries_newest_first() {
        let store = MemoryLedgerStore::new();
        store
            .open_account(NewAccount::new("alice", "Alice", "alice@example.com"))
            .await
            .unwrap();

        let mut unit = store.begin().await.unwrap();
        for value in [dec!(1), dec!(2), dec!(3)] {
            unit.insert_entry(NewLedgerEntry::deposit("alice", &amount(value)))
                .await
                .unwrap();
        }
        unit.commit().await.unwrap();

        let (items, total) = store
            .list_entries("alice", PageRequest::new(Some(1), Some(2)))
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].amount, dec!(3));
        assert_eq!(items[1].amount, dec!(2));

        let (items, _) = store
            .list_entries("alice", PageRequest::new(Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount, dec!(1));
    }
}
