//! wallet_ledger Library
//!
//! Double-entry wallet ledger: deposits, transfers and reversals with a
//! cached per-account balance kept equal to the sum of its entries.
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod domain;
pub mod reconcile;
pub mod store;
pub mod wallet;

pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorResponse};
pub use domain::{Amount, AmountError, Balance, DomainError, OperationContext};
pub use wallet::{WalletEngine, WalletError};
