//! Delivery assignment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{AssignmentStatus, DeliveryAssignment, Entity};
use record_store::RecordStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::{AppState, parse_entity_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateAssignmentRequest {
    pub order_id: String,
    pub driver_id: String,
    pub vehicle_id: String,
    #[serde(default)]
    pub allow_unpaid: bool,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    /// One of "Assigned", "InTransit", "Delivered".
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct AssignmentResponse {
    pub id: String,
    pub order_id: String,
    pub driver_id: String,
    pub vehicle_id: String,
    pub status: String,
    pub assigned_at: String,
}

impl From<&DeliveryAssignment> for AssignmentResponse {
    fn from(assignment: &DeliveryAssignment) -> Self {
        Self {
            id: assignment.id().to_string(),
            order_id: assignment.order_id().to_string(),
            driver_id: assignment.driver_id().to_string(),
            vehicle_id: assignment.vehicle_id().to_string(),
            status: assignment.status().to_string(),
            assigned_at: assignment.assigned_at().to_rfc3339(),
        }
    }
}

fn parse_status(status: &str) -> Result<AssignmentStatus, ApiError> {
    match status {
        "Assigned" => Ok(AssignmentStatus::Assigned),
        "InTransit" => Ok(AssignmentStatus::InTransit),
        "Delivered" => Ok(AssignmentStatus::Delivered),
        other => Err(ApiError::BadRequest(format!(
            "Unknown assignment status: {other}"
        ))),
    }
}

// -- Handlers --

/// POST /assignments — bind an order to a driver and vehicle.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<(axum::http::StatusCode, Json<AssignmentResponse>), ApiError> {
    let order_id = parse_entity_id(&req.order_id)?;
    let driver_id = parse_entity_id(&req.driver_id)?;
    let vehicle_id = parse_entity_id(&req.vehicle_id)?;

    let assignment = state
        .assignments
        .create(order_id, driver_id, vehicle_id, req.allow_unpaid)
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json((&assignment).into())))
}

/// GET /assignments — list assignments.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<AssignmentResponse>>, ApiError> {
    let assignments = state.assignments.list().await?;
    Ok(Json(assignments.iter().map(Into::into).collect()))
}

/// GET /assignments/:id — load an assignment by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let assignment_id = parse_entity_id(&id)?;
    let assignment = state.assignments.get(assignment_id).await?;
    Ok(Json((&assignment).into()))
}

/// POST /assignments/:id/status — advance an assignment's status.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let assignment_id = parse_entity_id(&id)?;
    let status = parse_status(&req.status)?;

    let assignment = state
        .assignments
        .update_status(assignment_id, status)
        .await?;

    Ok(Json((&assignment).into()))
}
