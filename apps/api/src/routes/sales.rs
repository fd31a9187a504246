//! Sale routes: the transactional create plus read and restricted update.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;
use vitrina_core::Sale;
use vitrina_db::{SaleDetailsUpdate, SaleFilter, SaleRequest};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/{id}", get(get_sale).patch(update_sale))
}

async fn create_sale(
    State(state): State<AppState>,
    payload: Result<Json<SaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let Json(request) = payload?;
    let sale = state.sales.create_sale(request).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

async fn list_sales(
    State(state): State<AppState>,
    filter: Result<Query<SaleFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<Sale>>> {
    let Query(filter) = filter?;
    debug!(?filter, "Listing sales");
    Ok(Json(state.db.sales().list(&filter).await?))
}

async fn get_sale(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Sale>> {
    state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sale", &id))
}

async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SaleDetailsUpdate>, JsonRejection>,
) -> ApiResult<Json<Sale>> {
    let Json(update) = payload?;
    Ok(Json(state.sales.update_sale(&id, update).await?))
}
