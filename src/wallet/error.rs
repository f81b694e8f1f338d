//! Wallet Engine Errors

use crate::domain::DomainError;
use crate::store::StoreError;

/// Why a wallet operation did not commit
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Business rule violation; deterministic for the same ledger state
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Storage fault; the unit was rolled back
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WalletError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            WalletError::Domain(e) => Some(e),
            WalletError::Store(_) => None,
        }
    }

    /// Check if re-issuing the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            WalletError::Domain(_) => false,
            WalletError::Store(e) => e.is_retryable(),
        }
    }
}
