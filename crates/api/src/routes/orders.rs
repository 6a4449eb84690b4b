//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{CustomerId, Entity, Money, Order, OrderLine};
use record_store::RecordStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::{AppState, parse_entity_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Option<String>,
    #[serde(default)]
    pub prepaid: bool,
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub item_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub payment_status: String,
    pub stock_reserved: bool,
    pub total_cents: i64,
    pub lines: Vec<OrderLineResponse>,
    pub assigned_driver: Option<String>,
    pub assigned_vehicle: Option<String>,
    pub assignment: Option<String>,
    pub delivery_assigned_at: Option<String>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub item_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub line_total_cents: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let lines = order
            .lines()
            .iter()
            .map(|line| OrderLineResponse {
                item_id: line.item_id.to_string(),
                name: line.name.clone(),
                unit_price_cents: line.unit_price.cents(),
                quantity: line.quantity,
                line_total_cents: line.line_total().cents(),
            })
            .collect();

        Self {
            id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            status: order.status().to_string(),
            payment_status: order.payment_status().to_string(),
            stock_reserved: order.stock_reserved(),
            total_cents: order.total_amount().cents(),
            lines,
            assigned_driver: order.assigned_driver().map(|id| id.to_string()),
            assigned_vehicle: order.assigned_vehicle().map(|id| id.to_string()),
            assignment: order.assignment().map(|id| id.to_string()),
            delivery_assigned_at: order.delivery_assigned_at().map(|at| at.to_rfc3339()),
        }
    }
}

// -- Handlers --

/// POST /orders — place a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError> {
    let customer_id = if let Some(ref id_str) = req.customer_id {
        let uuid = uuid::Uuid::parse_str(id_str)
            .map_err(|e| ApiError::BadRequest(format!("Invalid customer_id: {e}")))?;
        CustomerId::from_uuid(uuid)
    } else {
        CustomerId::new()
    };

    let mut lines = Vec::with_capacity(req.lines.len());
    for line_req in &req.lines {
        let item_id = parse_entity_id(&line_req.item_id)?;
        lines.push(OrderLine::new(
            item_id,
            line_req.name.as_str(),
            Money::from_cents(line_req.unit_price_cents),
            line_req.quantity,
        ));
    }

    let order = state
        .orders
        .place_order(customer_id, lines, req.prepaid)
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json((&order).into())))
}

/// GET /orders — list orders.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders().await?;
    Ok(Json(orders.iter().map(Into::into).collect()))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_entity_id(&id)?;
    let order = state.orders.get_order(order_id).await?;
    Ok(Json((&order).into()))
}

/// POST /orders/:id/payment — confirm payment for an order.
#[tracing::instrument(skip(state))]
pub async fn confirm_payment<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_entity_id(&id)?;
    let order = state.orders.confirm_payment(order_id).await?;
    Ok(Json((&order).into()))
}

/// DELETE /orders/:id — cancel a pending order.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ApiError> {
    let order_id = parse_entity_id(&id)?;
    state.orders.cancel_order(order_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
