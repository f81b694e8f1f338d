//! Error handling module
//!
//! Transport-level error type and HTTP response conversion.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::store::StoreError;
use crate::wallet::WalletError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Invalid user id header: {0}")]
    InvalidUserId(String),

    // Engine errors
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::Wallet(WalletError::Domain(err))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Wallet(WalletError::Store(err))
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn domain_status(err: &DomainError) -> (StatusCode, &'static str) {
    match err {
        // 404 Not Found
        DomainError::AccountNotFound(_) => (StatusCode::NOT_FOUND, "account_not_found"),
        DomainError::SenderNotFound(_) => (StatusCode::NOT_FOUND, "sender_not_found"),
        DomainError::RecipientNotFound(_) => (StatusCode::NOT_FOUND, "recipient_not_found"),
        DomainError::TransactionNotFound(_) => (StatusCode::NOT_FOUND, "transaction_not_found"),

        // 400 Bad Request
        DomainError::SelfTransferNotAllowed => {
            (StatusCode::BAD_REQUEST, "self_transfer_not_allowed")
        }
        DomainError::AlreadyReverted(_) => (StatusCode::BAD_REQUEST, "already_reverted"),
        DomainError::CannotRevertReversal(_) => {
            (StatusCode::BAD_REQUEST, "cannot_revert_reversal")
        }
        DomainError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount"),

        // 403 Forbidden
        DomainError::NotOwner(_) => (StatusCode::FORBIDDEN, "not_owner"),

        // 422 Unprocessable Entity
        DomainError::InsufficientBalance { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_balance")
        }
        DomainError::InsufficientBalanceToRevert { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_balance_to_revert")
        }
        DomainError::BalanceOverflow => (StatusCode::UNPROCESSABLE_ENTITY, "balance_overflow"),
    }
}

impl AppError {
    /// HTTP status and machine-readable code for this error
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::MissingHeader(_) => (StatusCode::UNAUTHORIZED, "missing_header"),
            AppError::InvalidUserId(_) => (StatusCode::BAD_REQUEST, "invalid_user_id"),
            AppError::Wallet(WalletError::Domain(e)) => domain_status(e),
            AppError::Wallet(WalletError::Store(StoreError::Conflict(_))) => {
                (StatusCode::CONFLICT, "concurrent_modification")
            }
            AppError::Wallet(WalletError::Store(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status();

        let details = match &self {
            AppError::InvalidRequest(msg) => Some(msg.clone()),
            AppError::MissingHeader(header) => Some(header.clone()),
            AppError::InvalidUserId(reason) => Some(reason.clone()),
            AppError::Wallet(WalletError::Domain(e)) => {
                if e.is_client_error() {
                    tracing::debug!(error_code, "Request rejected: {}", e);
                } else {
                    tracing::warn!(error_code, "Request failed: {}", e);
                }
                None
            }
            AppError::Wallet(WalletError::Store(e)) => {
                if e.is_conflict() {
                    tracing::warn!("Store conflict: {}", e);
                } else {
                    tracing::error!("Store error: {:?}", e);
                }
                None
            }
        };

        // Storage internals stay out of response bodies
        let error = match &self {
            AppError::Wallet(WalletError::Store(e)) if !e.is_conflict() => {
                "Internal storage error".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::domain::Party;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: AppError = DomainError::TransactionNotFound(Uuid::nil()).into();
        assert_eq!(err.status().0, StatusCode::NOT_FOUND);

        let err: AppError = DomainError::RecipientNotFound("bob".into()).into();
        assert_eq!(err.status(), (StatusCode::NOT_FOUND, "recipient_not_found"));
    }

    #[test]
    fn test_business_rule_statuses() {
        let cases = [
            (DomainError::SelfTransferNotAllowed, StatusCode::BAD_REQUEST),
            (DomainError::AlreadyReverted(Uuid::nil()), StatusCode::BAD_REQUEST),
            (DomainError::CannotRevertReversal(Uuid::nil()), StatusCode::BAD_REQUEST),
            (DomainError::NotOwner(Uuid::nil()), StatusCode::FORBIDDEN),
            (
                DomainError::insufficient_balance(dec!(10), dec!(5)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                DomainError::insufficient_to_revert(Party::Requester, dec!(10), dec!(5)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (domain, expected) in cases {
            let err: AppError = domain.into();
            assert_eq!(err.status().0, expected, "{}", err);
        }
    }

    #[test]
    fn test_store_conflict_maps_to_409() {
        let err: AppError = StoreError::Conflict("row locked".into()).into();
        assert_eq!(err.status(), (StatusCode::CONFLICT, "concurrent_modification"));
    }

    #[test]
    fn test_store_fault_maps_to_500() {
        let err: AppError = StoreError::Corrupted("bad row".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_header_errors() {
        let err = AppError::MissingHeader("X-Request-User-Id".into());
        assert_eq!(err.status(), (StatusCode::UNAUTHORIZED, "missing_header"));

        let err = AppError::InvalidUserId("empty".into());
        assert_eq!(err.status(), (StatusCode::BAD_REQUEST, "invalid_user_id"));
    }
}
