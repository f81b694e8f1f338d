//! Domain module
//!
//! Core ledger types: money, accounts, entries and their errors.

pub mod account;
pub mod amount;
pub mod context;
pub mod entry;
pub mod error;
pub mod page;

pub use account::{Account, NewAccount};
pub use amount::{Amount, AmountError, Balance};
pub use context::OperationContext;
pub use entry::{Counterparty, EntryKind, LedgerEntry, NewLedgerEntry};
pub use error::{DomainError, Party};
pub use page::{Page, PageRequest, Pagination};
