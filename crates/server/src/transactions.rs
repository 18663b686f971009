//! Transactions API endpoints

use api_types::{
    envelope::ApiResponse,
    transaction::{
        Transaction, TransactionCreate, TransactionListResponse, TransactionPatch,
        TransactionQuery,
    },
};
use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::{
    ServerError,
    server::{AuthUser, ServerState},
};

pub async fn list(
    Extension(AuthUser(user)): Extension<AuthUser>,
    State(state): State<ServerState>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<TransactionListResponse>>, ServerError> {
    let Query(query) = query.map_err(|err| ServerError::Generic(err.body_text()))?;
    let res = state.ledger.list(&user, &query).await;
    Ok(Json(ApiResponse::ok(res)))
}

pub async fn create(
    Extension(AuthUser(user)): Extension<AuthUser>,
    State(state): State<ServerState>,
    payload: Result<Json<TransactionCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), ServerError> {
    let Json(payload) = payload.map_err(|err| ServerError::Generic(err.body_text()))?;
    let tx = state.ledger.create(&user, payload).await?;
    tracing::debug!(%user, id = %tx.id, "transaction created");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(tx))))
}

pub async fn update(
    Extension(AuthUser(user)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<TransactionPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<Transaction>>, ServerError> {
    let Json(payload) = payload.map_err(|err| ServerError::Generic(err.body_text()))?;
    let tx = state.ledger.update(&user, &id, payload).await?;
    tracing::debug!(%user, %id, "transaction updated");

    Ok(Json(ApiResponse::ok(tx)))
}

pub async fn delete(
    Extension(AuthUser(user)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.ledger.delete(&user, &id).await?;
    tracing::debug!(%user, %id, "transaction deleted");

    Ok(StatusCode::NO_CONTENT)
}
