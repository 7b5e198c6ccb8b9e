//! Order API handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::http::response::rejection_response;
use crate::http::server::AppState;
use crate::orders::{Order, OrderId};

/// Body of create and update requests. Missing fields fail validation.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OrderRequest {
    pub item: String,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub id: OrderId,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct DeleteOrderResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub cache: &'static str,
}

pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };

    match state.service.create_order(&request.item, request.quantity).await {
        Ok(id) => (StatusCode::CREATED, Json(CreateOrderResponse { id })).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_order(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.service.get_order(&OrderId::from(id)).await {
        Ok(order) => Json(OrderResponse { order }).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };

    match state
        .service
        .update_order(&OrderId::from(id), &request.item, request.quantity)
        .await
    {
        Ok(order) => Json(OrderResponse { order }).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn delete_order(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.service.delete_order(&OrderId::from(id)).await {
        Ok(success) => Json(DeleteOrderResponse { success }).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn list_orders(State(state): State<AppState>) -> Response {
    match state.service.list_orders().await {
        Ok(orders) => Json(ListOrdersResponse { orders }).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        store: state.service.store_backend(),
        cache: state.service.cache_backend(),
    })
}
