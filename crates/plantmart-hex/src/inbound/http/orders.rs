use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::order_placer::{DraftLine, OrderDraft};
use crate::application::Store;
use crate::errors::AppError;
use crate::inbound::http::auth::UserId;
use crate::inbound::http::server::AppState;
use plantmart_types::domain::order::{Order, TrackingInfo};

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub lines: Vec<OrderLineRequest>,
    pub total_cents: i64,
    /// Parsed by hand so an unrecognized method is a 400 with the
    /// validation code, not a deserialization rejection.
    pub payment_method: String,
    pub shipping_address: String,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub item_id: Uuid,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct TrackingPatchRequest {
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_ref: String,
}

pub async fn create_order<R: Store>(
    State(state): State<Arc<AppState<R>>>,
    UserId(buyer): UserId,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<Order>), AppError> {
    let payment_method = payload
        .payment_method
        .parse()
        .map_err(|e: anyhow::Error| AppError::Validation(e.to_string()))?;
    let draft = OrderDraft {
        lines: payload
            .lines
            .into_iter()
            .map(|l| DraftLine {
                item_id: l.item_id,
                quantity: l.quantity,
                unit_price_cents: l.unit_price_cents,
            })
            .collect(),
        total_cents: payload.total_cents,
        payment_method,
        shipping_address: payload.shipping_address,
    };
    let order = state.placer.place(buyer, draft).await?;
    Ok((axum::http::StatusCode::CREATED, Json(order)))
}

pub async fn get_order<R: Store>(
    State(state): State<Arc<AppState<R>>>,
    UserId(caller): UserId,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let id = parse_order_id(&id)?;
    Ok(Json(state.orders.get_order(caller, id).await?))
}

pub async fn list_orders<R: Store>(
    State(state): State<Arc<AppState<R>>>,
    UserId(buyer): UserId,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.orders.list_orders(buyer).await?))
}

pub async fn update_status<R: Store>(
    State(state): State<Arc<AppState<R>>>,
    UserId(caller): UserId,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let id = parse_order_id(&id)?;
    let status = payload
        .status
        .parse()
        .map_err(|e: anyhow::Error| AppError::Validation(e.to_string()))?;
    let order = state.orders.update_status(caller, id, status).await?;
    Ok(Json(order))
}

pub async fn update_tracking<R: Store>(
    State(state): State<Arc<AppState<R>>>,
    UserId(caller): UserId,
    Path(id): Path<String>,
    Json(payload): Json<TrackingPatchRequest>,
) -> Result<Json<Order>, AppError> {
    let id = parse_order_id(&id)?;
    let patch = TrackingInfo {
        carrier: payload.carrier,
        tracking_number: payload.tracking_number,
        note: payload.note,
    };
    let order = state.orders.update_tracking(caller, id, patch).await?;
    Ok(Json(order))
}

pub async fn confirm_payment<R: Store>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<Json<Order>, AppError> {
    let id = parse_order_id(&id)?;
    let order = state.orders.confirm_payment(id, payload.payment_ref).await?;
    Ok(Json(order))
}

fn parse_order_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::Validation(e.to_string()))
}
