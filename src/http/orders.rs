use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::orders::{CreateOrderRequest, Order};
use crate::resilience::BreakerSnapshot;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub dependency: BreakerSnapshot,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        dependency: state.breaker.snapshot(),
    })
}

pub async fn list_orders(State(state): State<AppState>) -> Json<Vec<Order>> {
    Json(state.store.list())
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.store.get(order_id)?))
}

pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let request_id = request_id(&headers);
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(request_id = %request_id, error = %rejection, "Unreadable order body");
        ApiError::from(rejection)
    })?;
    tracing::debug!(
        request_id = %request_id,
        user_id = request.user_id,
        part_id = request.part_id,
        quantity = request.quantity,
        "Creating order"
    );

    match state.workflow.create_order(request).await {
        Ok(order) => Ok((StatusCode::CREATED, Json(order))),
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Order creation failed");
            Err(e.into())
        }
    }
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(order_id)?;
    tracing::info!(order_id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}
