use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::Store;
use crate::errors::AppError;
use crate::inbound::http::auth::UserId;
use crate::inbound::http::server::AppState;
use plantmart_types::domain::cart::Cart;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub item_id: Uuid,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

pub async fn get_cart<R: Store>(
    State(state): State<Arc<AppState<R>>>,
    UserId(owner): UserId,
) -> Result<Json<Cart>, AppError> {
    Ok(Json(state.carts.get_cart(owner).await?))
}

pub async fn add_item<R: Store>(
    State(state): State<Arc<AppState<R>>>,
    UserId(owner): UserId,
    Json(payload): Json<AddItemRequest>,
) -> Result<Json<Cart>, AppError> {
    let cart = state
        .carts
        .add(owner, payload.item_id, payload.quantity)
        .await?;
    Ok(Json(cart))
}

pub async fn update_item<R: Store>(
    State(state): State<Arc<AppState<R>>>,
    UserId(owner): UserId,
    Path(item_id): Path<String>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<Cart>, AppError> {
    let item_id = parse_item_id(&item_id)?;
    let cart = state.carts.update(owner, item_id, payload.quantity).await?;
    Ok(Json(cart))
}

pub async fn remove_item<R: Store>(
    State(state): State<Arc<AppState<R>>>,
    UserId(owner): UserId,
    Path(item_id): Path<String>,
) -> Result<Json<Cart>, AppError> {
    let item_id = parse_item_id(&item_id)?;
    let cart = state.carts.remove(owner, item_id).await?;
    Ok(Json(cart))
}

pub async fn clear_cart<R: Store>(
    State(state): State<Arc<AppState<R>>>,
    UserId(owner): UserId,
) -> Result<Json<Cart>, AppError> {
    Ok(Json(state.carts.clear(owner).await?))
}

fn parse_item_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::Validation(e.to_string()))
}
