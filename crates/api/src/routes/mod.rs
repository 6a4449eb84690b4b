//! Route handlers and shared application state.

pub mod assignments;
pub mod fleet;
pub mod health;
pub mod items;
pub mod metrics;
pub mod notifications;
pub mod orders;

use common::EntityId;
use dispatch::{AssignmentCoordinator, OrderService, RecordNotifier};
use record_store::RecordStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: RecordStore> {
    pub orders: OrderService<S, RecordNotifier<S>>,
    pub assignments: AssignmentCoordinator<S, RecordNotifier<S>>,
    pub notifier: RecordNotifier<S>,
}

pub(crate) fn parse_entity_id(id: &str) -> Result<EntityId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(EntityId::from(uuid))
}
