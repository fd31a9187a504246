//! Client routes: profiles, referral lookup, cashback corrections, the
//! loyalty ledger and promotions.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use vitrina_core::validation::clamp_limit;
use vitrina_core::{Client, ClientLoyaltyTransaction, ClientPromotion};
use vitrina_db::{CashbackAdjustment, ClientUpdate, NewClient, NewPromotion, ReferralMatch};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionQuery {
    pub client_id: Option<String>,
    pub limit: Option<i64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", post(create_client))
        .route("/clients/{id}", patch(update_client))
        .route("/clients/referral/{code}", get(find_by_referral_code))
        .route("/clients/{id}/cashback-adjustments", post(adjust_cashback))
        .route("/clients/{id}/loyalty-transactions", get(loyalty_transactions))
        .route("/promotions", get(list_promotions).post(create_promotion))
}

async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<NewClient>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let Json(request) = payload?;
    let client = state.clients.create(request).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ClientUpdate>, JsonRejection>,
) -> ApiResult<Json<Client>> {
    let Json(update) = payload?;
    Ok(Json(state.clients.update(&id, update).await?))
}

async fn find_by_referral_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<ReferralMatch>> {
    Ok(Json(state.clients.find_by_referral_code(&code).await?))
}

/// Returns the client with the corrected balance.
async fn adjust_cashback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CashbackAdjustment>, JsonRejection>,
) -> ApiResult<Json<Client>> {
    let Json(request) = payload?;
    Ok(Json(state.clients.adjust_cashback(&id, request).await?))
}

/// Newest entries first.
async fn loyalty_transactions(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    query: Result<Query<LedgerQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ClientLoyaltyTransaction>>> {
    let Query(query) = query?;

    if state.db.clients().get_by_id(&client_id).await?.is_none() {
        return Err(ApiError::not_found("Client", &client_id));
    }

    let rows = state
        .db
        .loyalty_transactions()
        .list_by_client(&client_id, clamp_limit(query.limit))
        .await?;
    Ok(Json(rows))
}

async fn list_promotions(
    State(state): State<AppState>,
    query: Result<Query<PromotionQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ClientPromotion>>> {
    let Query(query) = query?;
    let promotions = state
        .db
        .promotions()
        .list(query.client_id.as_deref(), clamp_limit(query.limit))
        .await?;
    Ok(Json(promotions))
}

async fn create_promotion(
    State(state): State<AppState>,
    payload: Result<Json<NewPromotion>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ClientPromotion>)> {
    let Json(request) = payload?;
    let promotion = state.clients.create_promotion(request).await?;
    Ok((StatusCode::CREATED, Json(promotion)))
}
