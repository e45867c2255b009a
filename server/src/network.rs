use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use log::error;
use serde::Deserialize;
use serde_json::json;
use tokio::task::{spawn_blocking, JoinError};

use database_handler::DbPool;
use records::models::{
    Account, AccountChanges, AccountTransaction, NewAccount, NewAccountTransaction,
};

use crate::service::{AccountService, ServiceError, TransactionService};

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub transactions: TransactionService,
}

impl AppState {
    pub fn new(pool: DbPool) -> AppState {
        AppState {
            accounts: AccountService::new(pool.clone()),
            transactions: TransactionService::new(pool),
        }
    }
}

/// Service outcome carried to the HTTP boundary. Storage failures are
/// reported as an opaque 500; the detail stays in the logs.
pub struct ApiError(ServiceError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::DuplicateKey(_) | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            ServiceError::Storage(_) => String::from("internal server error"),
            other => other.to_string(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> ApiError {
        ApiError(err)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> ApiError {
        error!("Worker task failed: {}", err);
        ApiError(ServiceError::Storage(err.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/accounts",
            get(list_accounts).post(create_account),
        )
        .route(
            "/api/v1/accounts/:id",
            get(account_by_id).put(update_account).delete(delete_account),
        )
        .route("/api/v1/accounts/number/:account_no", get(account_by_number))
        .route("/api/v1/accounts/type/:account_type", get(accounts_by_type))
        .route("/api/v1/accounts/currency/:currency", get(accounts_by_currency))
        .route(
            "/api/v1/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/api/v1/transactions/:id",
            get(transaction_by_id)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        .route(
            "/api/v1/transactions/account/:account_no",
            get(transactions_for_account),
        )
        .route(
            "/api/v1/transactions/account/:account_no/range",
            get(transactions_in_range),
        )
        .route(
            "/api/v1/transactions/account/:account_no/credit",
            get(credit_transactions),
        )
        .route(
            "/api/v1/transactions/account/:account_no/debit",
            get(debit_transactions),
        )
        .route(
            "/api/v1/transactions/currency/:currency",
            get(transactions_by_currency),
        )
        .with_state(state)
}

// Diesel is synchronous, so every handler pushes the database work onto the
// blocking thread pool and keeps the request task free.

async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>, ApiError> {
    let service = state.accounts.clone();
    Ok(Json(spawn_blocking(move || service.all()).await??))
}

async fn account_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Account>, ApiError> {
    let service = state.accounts.clone();
    Ok(Json(spawn_blocking(move || service.by_id(id)).await??))
}

async fn account_by_number(
    State(state): State<AppState>,
    Path(account_no): Path<String>,
) -> Result<Json<Account>, ApiError> {
    let service = state.accounts.clone();
    Ok(Json(
        spawn_blocking(move || service.by_number(&account_no)).await??,
    ))
}

async fn accounts_by_type(
    State(state): State<AppState>,
    Path(account_type): Path<String>,
) -> Result<Json<Vec<Account>>, ApiError> {
    let service = state.accounts.clone();
    Ok(Json(
        spawn_blocking(move || service.by_type(&account_type)).await??,
    ))
}

async fn accounts_by_currency(
    State(state): State<AppState>,
    Path(currency): Path<String>,
) -> Result<Json<Vec<Account>>, ApiError> {
    let service = state.accounts.clone();
    Ok(Json(
        spawn_blocking(move || service.by_currency(&currency)).await??,
    ))
}

async fn create_account(
    State(state): State<AppState>,
    Json(details): Json<NewAccount>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let service = state.accounts.clone();
    let account = spawn_blocking(move || service.create(details)).await??;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(changes): Json<AccountChanges>,
) -> Result<Json<Account>, ApiError> {
    let service = state.accounts.clone();
    Ok(Json(
        spawn_blocking(move || service.update(id, changes)).await??,
    ))
}

async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let service = state.accounts.clone();
    spawn_blocking(move || service.delete(id)).await??;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountTransaction>>, ApiError> {
    let service = state.transactions.clone();
    Ok(Json(spawn_blocking(move || service.all()).await??))
}

async fn transaction_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AccountTransaction>, ApiError> {
    let service = state.transactions.clone();
    Ok(Json(spawn_blocking(move || service.by_id(id)).await??))
}

async fn transactions_for_account(
    State(state): State<AppState>,
    Path(account_no): Path<String>,
) -> Result<Json<Vec<AccountTransaction>>, ApiError> {
    let service = state.transactions.clone();
    Ok(Json(
        spawn_blocking(move || service.for_account(&account_no)).await??,
    ))
}

async fn transactions_in_range(
    State(state): State<AppState>,
    Path(account_no): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<AccountTransaction>>, ApiError> {
    let service = state.transactions.clone();
    Ok(Json(
        spawn_blocking(move || service.in_range(&account_no, range.start_date, range.end_date))
            .await??,
    ))
}

async fn credit_transactions(
    State(state): State<AppState>,
    Path(account_no): Path<String>,
) -> Result<Json<Vec<AccountTransaction>>, ApiError> {
    let service = state.transactions.clone();
    Ok(Json(
        spawn_blocking(move || service.credits(&account_no)).await??,
    ))
}

async fn debit_transactions(
    State(state): State<AppState>,
    Path(account_no): Path<String>,
) -> Result<Json<Vec<AccountTransaction>>, ApiError> {
    let service = state.transactions.clone();
    Ok(Json(
        spawn_blocking(move || service.debits(&account_no)).await??,
    ))
}

async fn transactions_by_currency(
    State(state): State<AppState>,
    Path(currency): Path<String>,
) -> Result<Json<Vec<AccountTransaction>>, ApiError> {
    let service = state.transactions.clone();
    Ok(Json(
        spawn_blocking(move || service.by_currency(&currency)).await??,
    ))
}

async fn create_transaction(
    State(state): State<AppState>,
    Json(details): Json<NewAccountTransaction>,
) -> Result<(StatusCode, Json<AccountTransaction>), ApiError> {
    let service = state.transactions.clone();
    let transaction = spawn_blocking(move || service.create(details)).await??;
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(details): Json<NewAccountTransaction>,
) -> Result<Json<AccountTransaction>, ApiError> {
    let service = state.transactions.clone();
    Ok(Json(
        spawn_blocking(move || service.update(id, details)).await??,
    ))
}

async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let service = state.transactions.clone();
    spawn_blocking(move || service.delete(id)).await??;
    Ok(StatusCode::NO_CONTENT)
}
