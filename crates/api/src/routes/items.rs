//! Catalog item endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{Entity, Item};
use record_store::RecordStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::{AppState, parse_entity_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub initial_quantity: u32,
}

#[derive(Deserialize)]
pub struct RestockRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub available_quantity: u32,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id().to_string(),
            name: item.name().to_string(),
            available_quantity: item.available_quantity(),
        }
    }
}

// -- Handlers --

/// POST /items — add an item to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(axum::http::StatusCode, Json<ItemResponse>), ApiError> {
    let item = state
        .orders
        .reservation()
        .ledger()
        .create_item(req.name, req.initial_quantity)
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json((&item).into())))
}

/// GET /items — list catalog items.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.orders.reservation().ledger().list_items().await?;
    Ok(Json(items.iter().map(Into::into).collect()))
}

/// GET /items/:id — load an item by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item_id = parse_entity_id(&id)?;
    let item = state
        .orders
        .reservation()
        .ledger()
        .get_item(item_id)
        .await?;
    Ok(Json((&item).into()))
}

/// POST /items/:id/restock — add quantity back to an item's stock.
#[tracing::instrument(skip(state, req))]
pub async fn restock<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<RestockRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item_id = parse_entity_id(&id)?;
    let ledger = state.orders.reservation().ledger();

    ledger.increment(item_id, req.quantity).await?;
    let item = ledger.get_item(item_id).await?;
    Ok(Json((&item).into()))
}
