//! Common test utilities

#![allow(dead_code)]

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tokio::sync::OnceCell;
use uuid::Uuid;

use wallet_ledger::domain::{Amount, Balance, NewAccount, OperationContext};
use wallet_ledger::store::{LedgerStore, MemoryLedgerStore};

/// In-memory store with one zero-balance account per id
pub async fn memory_store(user_ids: &[&str]) -> MemoryLedgerStore {
    let store = MemoryLedgerStore::new();
    for user_id in user_ids {
        store
            .open_account(profile(user_id))
            .await
            .expect("Failed to open account");
    }
    store
}

/// In-memory store seeded with explicit starting balances (no entries)
pub async fn memory_store_with_balances(accounts: &[(&str, Decimal)]) -> MemoryLedgerStore {
    let store = MemoryLedgerStore::new();
    for (user_id, balance) in accounts {
        store
            .insert_account(profile(user_id), Balance::new(*balance).unwrap())
            .await;
    }
    store
}

pub fn profile(user_id: &str) -> NewAccount {
    NewAccount::new(
        user_id,
        format!("User {}", user_id),
        format!("{}@example.com", user_id),
    )
}

pub fn amount(value: Decimal) -> Amount {
    Amount::new(value).expect("valid amount")
}

pub fn context() -> OperationContext {
    OperationContext::new().with_correlation_id(Uuid::new_v4())
}

/// Unique user id so tests sharing one database never collide
pub fn unique_user(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

static SCHEMA: OnceCell<()> = OnceCell::const_new();

/// Setup test database - connect and apply the schema once per test binary
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    SCHEMA
        .get_or_init(|| async {
            pool.execute(include_str!("../../migrations/0001_create_wallet.sql"))
                .await
                .expect("Failed to apply schema");
        })
        .await;

    pool
}
