//! Driver entity with its availability state.

use common::EntityId;
use record_store::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Entity;

/// Availability of a driver.
///
/// Exactly one of Available/Assigned holds at any time except manual leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DriverAvailability {
    /// Free to take a delivery assignment.
    #[default]
    Available,

    /// Bound to an active delivery assignment.
    Assigned,

    /// Manually taken out of rotation.
    OnLeave,
}

impl DriverAvailability {
    /// Returns the availability name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverAvailability::Available => "Available",
            DriverAvailability::Assigned => "Assigned",
            DriverAvailability::OnLeave => "OnLeave",
        }
    }
}

impl std::fmt::Display for DriverAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors produced by driver availability changes.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver cannot be claimed for an assignment.
    #[error("Driver {id} is {availability}")]
    NotAvailable {
        id: EntityId,
        availability: DriverAvailability,
    },

    /// The driver is bound to an active assignment.
    #[error("Driver {id} is assigned to an active delivery")]
    OnAssignment { id: EntityId },
}

/// A delivery driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    id: EntityId,
    name: String,
    phone: String,
    availability: DriverAvailability,
    #[serde(skip)]
    version: Version,
}

impl Entity for Driver {
    fn kind() -> &'static str {
        "Driver"
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

impl Driver {
    /// Registers a new driver, available by default.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            phone: phone.into(),
            availability: DriverAvailability::Available,
            version: Version::initial(),
        }
    }

    /// Returns the driver name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the driver phone number.
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Returns the current availability.
    pub fn availability(&self) -> DriverAvailability {
        self.availability
    }

    /// Returns true if the driver can be claimed for a new assignment.
    pub fn is_available(&self) -> bool {
        self.availability == DriverAvailability::Available
    }

    /// Claims the driver for a delivery assignment.
    pub fn assign(&mut self) -> Result<(), DriverError> {
        if !self.is_available() {
            return Err(DriverError::NotAvailable {
                id: self.id,
                availability: self.availability,
            });
        }
        self.availability = DriverAvailability::Assigned;
        Ok(())
    }

    /// Releases the driver back into rotation. No precondition.
    pub fn release(&mut self) {
        self.availability = DriverAvailability::Available;
    }

    /// Takes the driver out of rotation for leave.
    ///
    /// Rejected while the driver is bound to an active assignment.
    pub fn begin_leave(&mut self) -> Result<(), DriverError> {
        if self.availability == DriverAvailability::Assigned {
            return Err(DriverError::OnAssignment { id: self.id });
        }
        self.availability = DriverAvailability::OnLeave;
        Ok(())
    }

    /// Brings the driver back from leave.
    pub fn end_leave(&mut self) -> Result<(), DriverError> {
        if self.availability == DriverAvailability::Assigned {
            return Err(DriverError::OnAssignment { id: self.id });
        }
        self.availability = DriverAvailability::Available;
        Ok(())
    }
}
