//! Driver and vehicle management endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{Driver, Entity, Vehicle};
use record_store::RecordStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::{AppState, parse_entity_id};

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterDriverRequest {
    pub name: String,
    pub phone: String,
}

#[derive(Deserialize)]
pub struct RegisterVehicleRequest {
    pub plate: String,
    pub model: String,
}

#[derive(Deserialize)]
pub struct DriverAvailabilityRequest {
    /// Either "on_leave" or "available".
    pub availability: String,
}

#[derive(Deserialize)]
pub struct VehicleStatusRequest {
    /// Either "under_maintenance" or "available".
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct DriverResponse {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub availability: String,
}

impl From<&Driver> for DriverResponse {
    fn from(driver: &Driver) -> Self {
        Self {
            id: driver.id().to_string(),
            name: driver.name().to_string(),
            phone: driver.phone().to_string(),
            availability: driver.availability().to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct VehicleResponse {
    pub id: String,
    pub plate: String,
    pub model: String,
    pub status: String,
}

impl From<&Vehicle> for VehicleResponse {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id().to_string(),
            plate: vehicle.plate().to_string(),
            model: vehicle.model().to_string(),
            status: vehicle.status().to_string(),
        }
    }
}

// -- Handlers --

/// POST /drivers — register a new driver.
#[tracing::instrument(skip(state, req))]
pub async fn create_driver<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterDriverRequest>,
) -> Result<(axum::http::StatusCode, Json<DriverResponse>), ApiError> {
    let driver = state
        .assignments
        .resources()
        .register_driver(req.name, req.phone)
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json((&driver).into())))
}

/// GET /drivers — list drivers.
#[tracing::instrument(skip(state))]
pub async fn list_drivers<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<DriverResponse>>, ApiError> {
    let drivers = state.assignments.resources().list_drivers().await?;
    Ok(Json(drivers.iter().map(Into::into).collect()))
}

/// GET /drivers/:id — load a driver by ID.
#[tracing::instrument(skip(state))]
pub async fn get_driver<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DriverResponse>, ApiError> {
    let driver_id = parse_entity_id(&id)?;
    let driver = state.assignments.resources().get_driver(driver_id).await?;
    Ok(Json((&driver).into()))
}

/// POST /drivers/:id/availability — put a driver on leave or bring them back.
#[tracing::instrument(skip(state, req))]
pub async fn set_driver_availability<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<DriverAvailabilityRequest>,
) -> Result<Json<DriverResponse>, ApiError> {
    let driver_id = parse_entity_id(&id)?;
    let resources = state.assignments.resources();

    let driver = match req.availability.as_str() {
        "on_leave" => resources.set_driver_on_leave(driver_id).await?,
        "available" => resources.set_driver_available(driver_id).await?,
        other => {
            return Err(ApiError::BadRequest(format!(
                "Unknown driver availability: {other}"
            )));
        }
    };

    Ok(Json((&driver).into()))
}

/// POST /vehicles — register a new vehicle.
#[tracing::instrument(skip(state, req))]
pub async fn create_vehicle<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterVehicleRequest>,
) -> Result<(axum::http::StatusCode, Json<VehicleResponse>), ApiError> {
    let vehicle = state
        .assignments
        .resources()
        .register_vehicle(req.plate, req.model)
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json((&vehicle).into())))
}

/// GET /vehicles — list vehicles.
#[tracing::instrument(skip(state))]
pub async fn list_vehicles<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<VehicleResponse>>, ApiError> {
    let vehicles = state.assignments.resources().list_vehicles().await?;
    Ok(Json(vehicles.iter().map(Into::into).collect()))
}

/// GET /vehicles/:id — load a vehicle by ID.
#[tracing::instrument(skip(state))]
pub async fn get_vehicle<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<VehicleResponse>, ApiError> {
    let vehicle_id = parse_entity_id(&id)?;
    let vehicle = state.assignments.resources().get_vehicle(vehicle_id).await?;
    Ok(Json((&vehicle).into()))
}

/// POST /vehicles/:id/status — send a vehicle to maintenance or back.
#[tracing::instrument(skip(state, req))]
pub async fn set_vehicle_status<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<VehicleStatusRequest>,
) -> Result<Json<VehicleResponse>, ApiError> {
    let vehicle_id = parse_entity_id(&id)?;
    let resources = state.assignments.resources();

    let vehicle = match req.status.as_str() {
        "under_maintenance" => resources.set_vehicle_maintenance(vehicle_id).await?,
        "available" => resources.set_vehicle_available(vehicle_id).await?,
        other => {
            return Err(ApiError::BadRequest(format!(
                "Unknown vehicle status: {other}"
            )));
        }
    };

    Ok(Json((&vehicle).into()))
}
