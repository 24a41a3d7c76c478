//! Account routes: listing, creation, renaming, reconciliation and transfers.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Response,
    routing::{get, put},
};
use envelope_core::ledger::{AccountType, NewAccount};
use envelope_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::WindowQuery;
use crate::AppState;
use crate::error::{ApiError, ApiResult, json_response};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{id}", get(get_account).patch(update_account))
        .route("/accounts/{id}/reconcile", put(reconcile_account))
        .route("/accounts/{id}/transactions", get(list_account_transactions))
        .route("/accounts/{id}/transfer/{to}", put(transfer_money))
}

/// Query flags for listing accounts. Flags count by presence.
#[derive(Debug, Default, Deserialize)]
pub struct ListAccountsQuery {
    /// Include hidden accounts.
    #[serde(rename = "with-hidden")]
    pub with_hidden: Option<String>,
    /// Return accounts with their balances.
    #[serde(rename = "with-balances")]
    pub with_balances: Option<String>,
    /// Restrict to one type. Ignored when unknown or with balances.
    #[serde(rename = "account-type")]
    pub account_type: Option<String>,
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// One of `budget`, `category` or `tracking`.
    #[serde(rename = "type", default)]
    pub account_type: String,
    /// Opening amount booked together with the account.
    #[serde(default)]
    pub starting_balance: Decimal,
}

/// Query parameters for `PATCH /accounts/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAccountQuery {
    /// New name.
    pub name: Option<String>,
    /// `true` hides the account, anything else shows it.
    pub hidden: Option<String>,
}

/// Query parameters for a transfer.
#[derive(Debug, Default, Deserialize)]
pub struct TransferQuery {
    /// Positive decimal amount.
    pub amount: Option<String>,
    /// Category for a transfer between budget and tracking accounts.
    pub category: Option<String>,
    /// Description for both legs.
    #[serde(default)]
    pub description: String,
}

/// GET `/accounts`
async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<Response> {
    let include_hidden = query.with_hidden.is_some();

    if query.with_balances.is_some() {
        let balances = state.ledger.list_account_balances(include_hidden).await?;
        return Ok(json_response(StatusCode::OK, balances));
    }

    let account_type = query
        .account_type
        .as_deref()
        .and_then(|raw| raw.parse::<AccountType>().ok());

    let accounts = match account_type {
        Some(account_type) => {
            state
                .ledger
                .list_accounts_by_type(account_type, include_hidden)
                .await?
        }
        None => state.ledger.list_accounts(include_hidden).await?,
    };

    Ok(json_response(StatusCode::OK, accounts))
}

/// POST `/accounts`
async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let account_type = payload.account_type.parse::<AccountType>()?;

    let account = state
        .ledger
        .open_account(NewAccount {
            name: payload.name,
            account_type,
            starting_balance: payload.starting_balance,
        })
        .await?;

    Ok(json_response(StatusCode::CREATED, account))
}

/// GET `/accounts/{id}`
async fn get_account(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<Response> {
    let Path(id) = path?;
    let account = state.ledger.get_account(id).await?;
    Ok(json_response(StatusCode::OK, account))
}

/// PATCH `/accounts/{id}?name=&hidden=`
async fn update_account(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
    Query(query): Query<UpdateAccountQuery>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;

    if let Some(name) = query.name.as_deref() {
        state.ledger.update_account_name(id, name).await?;
    }
    if let Some(hidden) = query.hidden.as_deref() {
        state.ledger.update_account_hidden(id, hidden == "true").await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// PUT `/accounts/{id}/reconcile`
async fn reconcile_account(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    state.ledger.mark_account_reconciled(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/accounts/{id}/transactions?since=&until=`
async fn list_account_transactions(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Response> {
    let Path(id) = path?;
    let txs = state
        .ledger
        .list_transactions_by_account(id, query.window())
        .await?;
    Ok(json_response(StatusCode::OK, txs))
}

/// PUT `/accounts/{id}/transfer/{to}?amount=&category=&description=`
async fn transfer_money(
    State(state): State<AppState>,
    path: Result<Path<(AccountId, AccountId)>, PathRejection>,
    Query(query): Query<TransferQuery>,
) -> ApiResult<StatusCode> {
    let Path((from, to)) = path?;

    let amount = query
        .amount
        .as_deref()
        .unwrap_or_default()
        .parse::<Decimal>()
        .map_err(|e| ApiError::bad_request(format!("parsing amount: {e}")))?;

    let category = match query.category.as_deref() {
        Some(raw) => raw
            .parse::<AccountId>()
            .map(Some)
            .map_err(|e| ApiError::bad_request(format!("parsing category: {e}")))?,
        None => None,
    }
    .filter(|category| !category.into_inner().is_nil());

    match category {
        Some(category) => {
            state
                .ledger
                .transfer_money_with_category(from, to, amount, &query.description, category)
                .await?
        }
        None => {
            state
                .ledger
                .transfer_money(from, to, amount, &query.description)
                .await?
        }
    };

    Ok(StatusCode::NO_CONTENT)
}
