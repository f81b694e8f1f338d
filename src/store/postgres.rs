//! PostgreSQL Ledger Store
//!
//! Units are READ COMMITTED transactions. Account rows are taken with
//! `SELECT ... FOR UPDATE`, so two units touching the same account run one
//! after the other; the engine locks rows in ascending user id order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{
    Account, Balance, EntryKind, LedgerEntry, NewAccount, NewLedgerEntry, PageRequest,
};

use super::{LedgerStore, LedgerUnit, StoreError, StoreResult};

type AccountRow = (String, String, String, Decimal, DateTime<Utc>, DateTime<Utc>);

type EntryRow = (
    Uuid,
    String,
    String,
    Decimal,
    Option<Uuid>,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
);

const ACCOUNT_COLUMNS: &str = "user_id, name, email, balance, created_at, updated_at";

const ENTRY_COLUMNS: &str =
    "id, owner_id, kind, amount, reference_id, counterparty_id, counterparty_name, created_at";

fn account_from_row(row: AccountRow) -> StoreResult<Account> {
    let (user_id, name, email, balance, created_at, updated_at) = row;
    let balance = Balance::new(balance).map_err(|e| {
        StoreError::Corrupted(format!("balance of account {}: {}", user_id, e))
    })?;

    Ok(Account {
        user_id,
        name,
        email,
        balance,
        created_at,
        updated_at,
    })
}

fn entry_from_row(row: EntryRow) -> StoreResult<LedgerEntry> {
    let (id, owner_id, kind, amount, reference_id, counterparty_id, counterparty_name, created_at) =
        row;
    let kind: EntryKind = kind
        .parse()
        .map_err(|e| StoreError::Corrupted(format!("entry {}: {}", id, e)))?;

    Ok(LedgerEntry {
        id,
        owner_id,
        kind,
        amount,
        reference_id,
        counterparty_id,
        counterparty_name,
        created_at,
    })
}

/// Ledger store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Unit = PgLedgerUnit;

    async fn begin(&self) -> StoreResult<PgLedgerUnit> {
        let tx = self.pool.begin().await?;
        Ok(PgLedgerUnit { tx })
    }

    async fn find_account(&self, user_id: &str) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE user_id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    async fn list_entries(
        &self,
        owner_id: &str,
        page: PageRequest,
    ) -> StoreResult<(Vec<LedgerEntry>, u64)> {
        let offset = i64::try_from(page.offset())
            .map_err(|_| StoreError::Corrupted("page offset out of range".to_string()))?;

        // Page and total must come from one snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM ledger_entries
            WHERE owner_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2 OFFSET $3
            "#,
            ENTRY_COLUMNS
        ))
        .bind(owner_id)
        .bind(i64::from(page.limit()))
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM ledger_entries WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        let entries = rows
            .into_iter()
            .map(entry_from_row)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok((entries, total.max(0) as u64))
    }

    async fn open_account(&self, account: NewAccount) -> StoreResult<Account> {
        sqlx::query(
            r#"
            INSERT INTO accounts (user_id, name, email, balance)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(&account.user_id)
        .bind(&account.name)
        .bind(&account.email)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = %account.user_id, "Account opened");

        self.find_account(&account.user_id)
            .await?
            .ok_or_else(|| StoreError::Corrupted(format!("account {} vanished", account.user_id)))
    }
}

/// Unit of work wrapping one database transaction
pub struct PgLedgerUnit {
    tx: Transaction<'static, Postgres>,
}

impl PgLedgerUnit {
    async fn fetch_entry(&mut self, sql: &str, key: Uuid) -> StoreResult<Option<LedgerEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(sql)
            .bind(key)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(entry_from_row).transpose()
    }
}

#[async_trait]
impl LedgerUnit for PgLedgerUnit {
    async fn lock_account(&mut self, user_id: &str) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE user_id = $1 FOR UPDATE",
            ACCOUNT_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(account_from_row).transpose()
    }

    async fn find_entry(&mut self, id: Uuid) -> StoreResult<Option<LedgerEntry>> {
        let sql = format!("SELECT {} FROM ledger_entries WHERE id = $1", ENTRY_COLUMNS);
        self.fetch_entry(&sql, id).await
    }

    async fn find_reversal_of(&mut self, id: Uuid) -> StoreResult<Option<LedgerEntry>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM ledger_entries
            WHERE reference_id = $1 AND kind = 'reversal'
            ORDER BY seq
            LIMIT 1
            "#,
            ENTRY_COLUMNS
        );
        self.fetch_entry(&sql, id).await
    }

    async fn find_transfer_credit(&mut self, debit_id: Uuid) -> StoreResult<Option<LedgerEntry>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM ledger_entries
            WHERE reference_id = $1 AND kind = 'transfer'
            LIMIT 1
            "#,
            ENTRY_COLUMNS
        );
        self.fetch_entry(&sql, debit_id).await
    }

    async fn insert_entry(&mut self, entry: NewLedgerEntry) -> StoreResult<LedgerEntry> {
        let id = Uuid::new_v4();
        let (counterparty_id, counterparty_name) = match &entry.counterparty {
            Some(c) => (Some(c.id.clone()), Some(c.name.clone())),
            None => (None, None),
        };

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO ledger_entries
                (id, owner_id, kind, amount, reference_id, counterparty_id, counterparty_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING created_at
            "#,
        )
        .bind(id)
        .bind(&entry.owner_id)
        .bind(entry.kind.as_str())
        .bind(entry.amount)
        .bind(entry.reference_id)
        .bind(counterparty_id)
        .bind(counterparty_name)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(entry.into_entry(id, created_at))
    }

    async fn save_balance(&mut self, user_id: &str, balance: &Balance) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(balance.value())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(StoreError::Corrupted(format!(
                "balance write for unknown account {}",
                user_id
            )));
        }
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
