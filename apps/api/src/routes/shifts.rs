//! Cash shift routes.
//!
//! `/cash-shifts/current` is a static segment and wins over `/cash-shifts/{id}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use vitrina_core::shift::ShiftReport;
use vitrina_core::CashShift;
use vitrina_db::{CloseShiftRequest, OpenShiftRequest};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftListQuery {
    pub cashier_id: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentShiftQuery {
    pub cashier_id: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cash-shifts", get(list_shifts).post(open_shift))
        .route("/cash-shifts/current", get(current_shift))
        .route("/cash-shifts/{id}", get(get_shift))
        .route("/cash-shifts/{id}/report", get(shift_report))
        .route("/cash-shifts/{id}/close", post(close_shift))
}

async fn open_shift(
    State(state): State<AppState>,
    payload: Result<Json<OpenShiftRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CashShift>)> {
    let Json(request) = payload?;
    let shift = state.shifts.open(request).await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

async fn list_shifts(
    State(state): State<AppState>,
    query: Result<Query<ShiftListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<CashShift>>> {
    let Query(query) = query?;
    let shifts = state.shifts.list(query.cashier_id.as_deref(), query.limit).await?;
    Ok(Json(shifts))
}

/// The cashier's open shift, or `null`.
async fn current_shift(
    State(state): State<AppState>,
    query: Result<Query<CurrentShiftQuery>, QueryRejection>,
) -> ApiResult<Json<Option<CashShift>>> {
    let Query(query) = query?;
    let cashier_id = query
        .cashier_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("cashierId is required"))?;

    Ok(Json(state.shifts.current(cashier_id).await?))
}

async fn get_shift(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<CashShift>> {
    Ok(Json(state.shifts.get(&id).await?))
}

async fn shift_report(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ShiftReport>> {
    Ok(Json(state.shifts.report(&id).await?))
}

async fn close_shift(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CloseShiftRequest>, JsonRejection>,
) -> ApiResult<Json<ShiftReport>> {
    let Json(request) = payload?;
    Ok(Json(state.shifts.close(&id, request).await?))
}
