//! Inventory movement ledger routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use vitrina_core::InventoryMovement;
use vitrina_db::{ManualMovementRequest, MovementFilter};

use crate::error::ApiResult;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/inventory/movements", get(list_movements).post(record_movement))
}

async fn list_movements(
    State(state): State<AppState>,
    filter: Result<Query<MovementFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<InventoryMovement>>> {
    let Query(filter) = filter?;
    Ok(Json(state.db.movements().list(&filter).await?))
}

async fn record_movement(
    State(state): State<AppState>,
    payload: Result<Json<ManualMovementRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InventoryMovement>)> {
    let Json(request) = payload?;
    let movement = state.inventory.record_movement(request).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}
