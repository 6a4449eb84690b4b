//! Vehicle entity with its usage state.

use common::EntityId;
use record_store::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Entity;

/// Usage state of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VehicleStatus {
    /// Free to take a delivery assignment.
    #[default]
    Available,

    /// Bound to an active delivery assignment.
    InUse,

    /// Out of service for maintenance.
    UnderMaintenance,
}

impl VehicleStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "Available",
            VehicleStatus::InUse => "InUse",
            VehicleStatus::UnderMaintenance => "UnderMaintenance",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors produced by vehicle status changes.
#[derive(Debug, Error)]
pub enum VehicleError {
    /// The vehicle cannot be claimed for an assignment.
    #[error("Vehicle {id} is {status}")]
    NotAvailable { id: EntityId, status: VehicleStatus },

    /// The vehicle is bound to an active assignment.
    #[error("Vehicle {id} is in use on an active delivery")]
    InService { id: EntityId },
}

/// A delivery vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    id: EntityId,
    plate: String,
    model: String,
    status: VehicleStatus,
    #[serde(skip)]
    version: Version,
}

impl Entity for Vehicle {
    fn kind() -> &'static str {
        "Vehicle"
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

impl Vehicle {
    /// Registers a new vehicle, available by default.
    pub fn new(plate: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            plate: plate.into(),
            model: model.into(),
            status: VehicleStatus::Available,
            version: Version::initial(),
        }
    }

    /// Returns the license plate.
    pub fn plate(&self) -> &str {
        &self.plate
    }

    /// Returns the vehicle model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the current status.
    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    /// Returns true if the vehicle can be claimed for a new assignment.
    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    /// Claims the vehicle for a delivery assignment.
    pub fn claim(&mut self) -> Result<(), VehicleError> {
        if !self.is_available() {
            return Err(VehicleError::NotAvailable {
                id: self.id,
                status: self.status,
            });
        }
        self.status = VehicleStatus::InUse;
        Ok(())
    }

    /// Releases the vehicle back into rotation. No precondition.
    pub fn release(&mut self) {
        self.status = VehicleStatus::Available;
    }

    /// Takes the vehicle out of service for maintenance.
    ///
    /// Rejected while the vehicle is bound to an active assignment.
    pub fn begin_maintenance(&mut self) -> Result<(), VehicleError> {
        if self.status == VehicleStatus::InUse {
            return Err(VehicleError::InService { id: self.id });
        }
        self.status = VehicleStatus::UnderMaintenance;
        Ok(())
    }

    /// Returns the vehicle to service after maintenance.
    pub fn end_maintenance(&mut self) -> Result<(), VehicleError> {
        if self.status == VehicleStatus::InUse {
            return Err(VehicleError::InService { id: self.id });
        }
        self.status = VehicleStatus::Available;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_vehicle_is_available() {
        let vehicle = Vehicle::new("KBX-412", "Box truck");
        assert!(vehicle.is_available());
    }

    #[test]
    fn claim_marks_in_use() {
        let mut vehicle = Vehicle::new("KBX-412", "Box truck");
        vehicle.claim().unwrap();
        assert_eq!(vehicle.status(), VehicleStatus::InUse);
    }

    #[test]
    fn claim_twice_fails() {
        let mut vehicle = Vehicle::new("KBX-412", "Box truck");
        vehicle.claim().unwrap();

        let result = vehicle.claim();
        assert!(matches!(
            result,
            Err(VehicleError::NotAvailable {
                status: VehicleStatus::InUse,
                ..
            })
        ));
    }

    #[test]
    fn release_returns_vehicle_to_rotation() {
        let mut vehicle = Vehicle::new("KBX-412", "Box truck");
        vehicle.claim().unwrap();
        vehicle.release();
        assert!(vehicle.is_available());
    }

    #[test]
    fn maintenance_blocks_claim() {
        let mut vehicle = Vehicle::new("KBX-412", "Box truck");
        vehicle.begin_maintenance().unwrap();

        let result = vehicle.claim();
        assert!(matches!(
            result,
            Err(VehicleError::NotAvailable {
                status: VehicleStatus::UnderMaintenance,
                ..
            })
        ));

        vehicle.end_maintenance().unwrap();
        vehicle.claim().unwrap();
    }

    #[test]
    fn maintenance_rejected_while_in_use() {
        let mut vehicle = Vehicle::new("KBX-412", "Box truck");
        vehicle.claim().unwrap();

        let result = vehicle.begin_maintenance();
        assert!(matches!(result, Err(VehicleError::InService { .. })));
    }
}
