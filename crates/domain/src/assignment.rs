//! Delivery assignment entity.

use chrono::{DateTime, Utc};
use common::EntityId;
use record_store::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Entity;

/// Status of a delivery assignment.
///
/// Transitions are strictly forward, one step at a time:
/// ```text
/// Assigned ──► InTransit ──► Delivered
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AssignmentStatus {
    /// Driver and vehicle bound, delivery not yet started.
    #[default]
    Assigned,

    /// The delivery is underway.
    InTransit,

    /// The delivery is complete (terminal state).
    Delivered,
}

impl AssignmentStatus {
    /// Returns the status that directly follows this one, if any.
    pub fn next(&self) -> Option<AssignmentStatus> {
        match self {
            AssignmentStatus::Assigned => Some(AssignmentStatus::InTransit),
            AssignmentStatus::InTransit => Some(AssignmentStatus::Delivered),
            AssignmentStatus::Delivered => None,
        }
    }

    /// Returns true if this is the terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssignmentStatus::Delivered)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "Assigned",
            AssignmentStatus::InTransit => "InTransit",
            AssignmentStatus::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors produced by assignment status changes.
#[derive(Debug, Error)]
pub enum AssignmentError {
    /// A status change violates the forward-only transition table.
    #[error("Invalid assignment transition: {from} -> {to}")]
    InvalidTransition {
        from: AssignmentStatus,
        to: AssignmentStatus,
    },
}

/// The binding of one order to one driver and one vehicle for delivery.
///
/// The order/driver/vehicle bindings are immutable after creation; only the
/// status advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAssignment {
    id: EntityId,
    order_id: EntityId,
    driver_id: EntityId,
    vehicle_id: EntityId,
    status: AssignmentStatus,
    assigned_at: DateTime<Utc>,
    #[serde(skip)]
    version: Version,
}

impl Entity for DeliveryAssignment {
    fn kind() -> &'static str {
        "DeliveryAssignment"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl DeliveryAssignment {
    /// Creates a new assignment at the Assigned status.
    pub fn new(order_id: EntityId, driver_id: EntityId, vehicle_id: EntityId) -> Self {
        Self {
            id: EntityId::new(),
            order_id,
            driver_id,
            vehicle_id,
            status: AssignmentStatus::Assigned,
            assigned_at: Utc::now(),
            version: Version::initial(),
        }
    }

    /// Returns the bound order.
    pub fn order_id(&self) -> EntityId {
        self.order_id
    }

    /// Returns the bound driver.
    pub fn driver_id(&self) -> EntityId {
        self.driver_id
    }

    /// Returns the bound vehicle.
    pub fn vehicle_id(&self) -> EntityId {
        self.vehicle_id
    }

    /// Returns the current status.
    pub fn status(&self) -> AssignmentStatus {
        self.status
    }

    /// Returns when the assignment was created.
    pub fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    /// Returns true while the delivery has not completed.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Advances the status one step forward.
    ///
    /// Backward and skipped transitions are rejected, as is re-applying the
    /// current status.
    pub fn advance_to(&mut self, target: AssignmentStatus) -> Result<(), AssignmentError> {
        if self.status.next() != Some(target) {
            return Err(AssignmentError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    /// Restores a previous status after a linked update failed.
    ///
    /// Compensation hook for the coordinator's cascade; not part of the
    /// forward-only operator surface.
    pub fn roll_back_to(&mut self, status: AssignmentStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment() -> DeliveryAssignment {
        DeliveryAssignment::new(EntityId::new(), EntityId::new(), EntityId::new())
    }

    #[test]
    fn new_assignment_starts_assigned() {
        let a = assignment();
        assert_eq!(a.status(), AssignmentStatus::Assigned);
        assert!(a.is_active());
    }

    #[test]
    fn advances_one_step_at_a_time() {
        let mut a = assignment();

        a.advance_to(AssignmentStatus::InTransit).unwrap();
        assert_eq!(a.status(), AssignmentStatus::InTransit);

        a.advance_to(AssignmentStatus::Delivered).unwrap();
        assert_eq!(a.status(), AssignmentStatus::Delivered);
        assert!(!a.is_active());
    }

    #[test]
    fn skipped_transition_rejected() {
        let mut a = assignment();
        let result = a.advance_to(AssignmentStatus::Delivered);

        assert!(matches!(
            result,
            Err(AssignmentError::InvalidTransition {
                from: AssignmentStatus::Assigned,
                to: AssignmentStatus::Delivered,
            })
        ));
        assert_eq!(a.status(), AssignmentStatus::Assigned);
    }

    #[test]
    fn backward_transition_rejected() {
        let mut a = assignment();
        a.advance_to(AssignmentStatus::InTransit).unwrap();

        let result = a.advance_to(AssignmentStatus::Assigned);
        assert!(matches!(result, Err(AssignmentError::InvalidTransition { .. })));
    }

    #[test]
    fn same_status_rejected() {
        let mut a = assignment();
        let result = a.advance_to(AssignmentStatus::Assigned);
        assert!(matches!(result, Err(AssignmentError::InvalidTransition { .. })));
    }

    #[test]
    fn delivered_is_terminal() {
        let mut a = assignment();
        a.advance_to(AssignmentStatus::InTransit).unwrap();
        a.advance_to(AssignmentStatus::Delivered).unwrap();

        let result = a.advance_to(AssignmentStatus::InTransit);
        assert!(matches!(result, Err(AssignmentError::InvalidTransition { .. })));
    }

    #[test]
    fn serialization_roundtrip() {
        let a = assignment();
        let json = serde_json::to_string(&a).unwrap();
        let restored: DeliveryAssignment = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id(), a.id());
        assert_eq!(restored.order_id(), a.order_id());
        assert_eq!(restored.status(), AssignmentStatus::Assigned);
    }
}
