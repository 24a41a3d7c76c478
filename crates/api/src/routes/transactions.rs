//! Transaction routes.
//!
//! `PATCH /transactions/{id}` accepts `cleared` and `category` query flags
//! followed by an optional JSON Patch body. The patch is applied to the
//! serialized record and the result is written back as a full overwrite.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Response,
    routing::get,
};
use envelope_core::ledger::{TransactionDraft, TransactionUpdate};
use json_patch::Patch;
use envelope_shared::AppError;
use envelope_shared::types::{AccountId, TransactionId};
use serde::Deserialize;
use tracing::debug;

use super::WindowQuery;
use crate::AppState;
use crate::error::{ApiError, ApiResult, json_response};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/transactions/{id}",
            get(get_transaction)
                .put(overwrite_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
}

/// Query flags for `PATCH /transactions/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTransactionQuery {
    /// `true` marks the transaction cleared, anything else uncleared.
    pub cleared: Option<String>,
    /// New category id.
    pub category: Option<String>,
}

/// GET `/transactions?since=&until=`
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Response> {
    let txs = state.ledger.list_transactions(query.window()).await?;
    Ok(json_response(StatusCode::OK, txs))
}

/// POST `/transactions`
async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<TransactionDraft>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(draft) = payload?;
    let tx = state.ledger.create_transaction(draft).await?;
    Ok(json_response(StatusCode::CREATED, tx))
}

/// GET `/transactions/{id}`
async fn get_transaction(
    State(state): State<AppState>,
    path: Result<Path<TransactionId>, PathRejection>,
) -> ApiResult<Response> {
    let Path(id) = path?;
    let tx = state.ledger.get_transaction(id).await?;
    Ok(json_response(StatusCode::OK, tx))
}

/// PUT `/transactions/{id}`
async fn overwrite_transaction(
    State(state): State<AppState>,
    path: Result<Path<TransactionId>, PathRejection>,
    payload: Result<Json<TransactionUpdate>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    let Json(update) = payload?;
    state.ledger.update_transaction(id, update).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH `/transactions/{id}?cleared=&category=`
async fn update_transaction(
    State(state): State<AppState>,
    path: Result<Path<TransactionId>, PathRejection>,
    Query(query): Query<UpdateTransactionQuery>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;

    if let Some(cleared) = query.cleared.as_deref() {
        state
            .ledger
            .update_transaction_cleared(id, cleared == "true")
            .await?;
    }

    if let Some(raw) = query.category.as_deref() {
        let category = raw
            .parse::<AccountId>()
            .map_err(|e| ApiError::bad_request(format!("parsing category id: {e}")))?;
        state
            .ledger
            .update_transaction_category(id, category)
            .await?;
    }

    if body.len() < 2 {
        return Ok(StatusCode::NO_CONTENT);
    }

    let patch: Patch = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("parsing json-patch body: {e}")))?;
    if patch.0.is_empty() {
        return Ok(StatusCode::NO_CONTENT);
    }

    let stored = state.ledger.get_transaction(id).await?;
    let mut doc = serde_json::to_value(&stored)
        .map_err(|e| ApiError(AppError::Internal(e.to_string())))?;
    json_patch::patch(&mut doc, &patch)
        .map_err(|e| ApiError::bad_request(format!("applying patch: {e}")))?;
    let update: TransactionUpdate = serde_json::from_value(doc)
        .map_err(|e| ApiError::bad_request(format!("decoding patched transaction: {e}")))?;

    debug!(transaction_id = %id, operations = patch.0.len(), "Applying transaction patch");
    state.ledger.update_transaction(id, update).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE `/transactions/{id}`
async fn delete_transaction(
    State(state): State<AppState>,
    path: Result<Path<TransactionId>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    state.ledger.delete_transaction(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
