//! Account
//!
//! A wallet owner as seen by the ledger. The balance is a cached aggregate of
//! the owner's ledger entries and is only ever written by the wallet engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Balance;

/// Account state as loaded from the Account Directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Opaque identifier issued by the external identity provider
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub balance: Balance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile used to provision an account on first contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

impl NewAccount {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}
