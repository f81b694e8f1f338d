//! API Routes
//!
//! HTTP endpoint definitions for the wallet.

use axum::{
    extract::{Extension, FromRequest, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Amount, DomainError, LedgerEntry, OperationContext, Page, PageRequest};
use crate::error::{AppError, AppResult};
use crate::store::LedgerStore;
use crate::wallet::{
    BalanceView, DepositCommand, OperationReceipt, RevertCommand, TransferCommand, WalletEngine,
};

use super::middleware::RequestUser;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState<S> {
    pub wallet: WalletEngine<S>,
}

impl<S: LedgerStore> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            wallet: WalletEngine::new(store),
        }
    }
}

// =========================================================================
// Request/Response types
// =========================================================================

/// JSON body whose rejections answer with the standard error body
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Amount as sent by clients: a decimal string or a JSON number
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Text(String),
    Number(serde_json::Number),
}

impl AmountField {
    fn parse(&self) -> Result<Amount, AppError> {
        let parsed = match self {
            AmountField::Text(text) => text.parse::<Amount>(),
            AmountField::Number(number) => number.to_string().parse::<Amount>(),
        };
        parsed.map_err(|e| AppError::from(DomainError::from(e)))
    }
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: AmountField,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub to_user_id: String,
    pub amount: AmountField,
}

#[derive(Debug, Deserialize)]
pub struct RevertRequest {
    pub transaction_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the wallet router
pub fn create_router<S>() -> Router<AppState<S>>
where
    S: LedgerStore + Clone,
{
    Router::new()
        .route("/wallet/deposit", post(deposit::<S>))
        .route("/wallet/transfer", post(transfer::<S>))
        .route("/wallet/revert", post(revert::<S>))
        .route("/wallet/balance", get(get_balance::<S>))
        .route("/wallet/transactions", get(list_transactions::<S>))
}

// =========================================================================
// POST /wallet/deposit
// =========================================================================

async fn deposit<S: LedgerStore + Clone>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<RequestUser>,
    Extension(context): Extension<OperationContext>,
    AppJson(request): AppJson<DepositRequest>,
) -> AppResult<Json<OperationReceipt>> {
    let amount = request.amount.parse()?;
    let command = DepositCommand::new(user.user_id, amount);

    let receipt = state.wallet.deposit(command, &context).await?;

    Ok(Json(receipt))
}

// =========================================================================
// POST /wallet/transfer
// =========================================================================

async fn transfer<S: LedgerStore + Clone>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<RequestUser>,
    Extension(context): Extension<OperationContext>,
    AppJson(request): AppJson<TransferRequest>,
) -> AppResult<Json<OperationReceipt>> {
    let recipient = request.to_user_id.trim();
    if recipient.is_empty() {
        return Err(AppError::InvalidRequest(
            "to_user_id must not be empty".to_string(),
        ));
    }

    let amount = request.amount.parse()?;
    let command = TransferCommand::new(user.user_id, recipient, amount);

    let receipt = state.wallet.transfer(command, &context).await?;

    Ok(Json(receipt))
}

// =========================================================================
// POST /wallet/revert
// =========================================================================

async fn revert<S: LedgerStore + Clone>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<RequestUser>,
    Extension(context): Extension<OperationContext>,
    AppJson(request): AppJson<RevertRequest>,
) -> AppResult<Json<OperationReceipt>> {
    let command = RevertCommand::new(user.user_id, request.transaction_id);

    let receipt = state.wallet.revert(command, &context).await?;

    Ok(Json(receipt))
}

// =========================================================================
// GET /wallet/balance
// =========================================================================

async fn get_balance<S: LedgerStore + Clone>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<RequestUser>,
) -> AppResult<Json<BalanceView>> {
    let view = state.wallet.get_balance(&user.user_id).await?;

    Ok(Json(view))
}

// =========================================================================
// GET /wallet/transactions
// =========================================================================

async fn list_transactions<S: LedgerStore + Clone>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<RequestUser>,
    Query(query): Query<TransactionsQuery>,
) -> AppResult<Json<Page<LedgerEntry>>> {
    let page = PageRequest::new(query.page, query.limit);

    let result = state.wallet.list_transactions(&user.user_id, page).await?;

    Ok(Json(result))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
