//! Driver and vehicle availability tracking.

use common::EntityId;
use domain::{Driver, Repository, Vehicle};
use record_store::RecordStore;

use crate::error::{DispatchError, Result};

/// Single source of truth for whether a driver/vehicle may be bound to a
/// new assignment.
///
/// `reserve` claims both resources or neither: the driver is claimed first
/// and released again if the vehicle claim fails. Each claim runs its
/// availability check inside the conditional-update loop, so a resource is
/// never double-booked.
pub struct ResourceTracker<S: RecordStore> {
    drivers: Repository<S, Driver>,
    vehicles: Repository<S, Vehicle>,
}

impl<S: RecordStore + Clone> Clone for ResourceTracker<S> {
    fn clone(&self) -> Self {
        Self {
            drivers: self.drivers.clone(),
            vehicles: self.vehicles.clone(),
        }
    }
}

impl<S: RecordStore + Clone> ResourceTracker<S> {
    /// Creates a new tracker over the given store.
    pub fn new(store: S) -> Self {
        Self {
            drivers: Repository::new(store.clone()),
            vehicles: Repository::new(store),
        }
    }

    /// Registers a new driver, available by default.
    #[tracing::instrument(skip(self, name, phone))]
    pub async fn register_driver(
        &self,
        name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Result<Driver> {
        let mut driver = Driver::new(name, phone);
        self.drivers.insert(&mut driver).await?;
        Ok(driver)
    }

    /// Registers a new vehicle, available by default.
    #[tracing::instrument(skip(self, plate, model))]
    pub async fn register_vehicle(
        &self,
        plate: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Vehicle> {
        let mut vehicle = Vehicle::new(plate, model);
        self.vehicles.insert(&mut vehicle).await?;
        Ok(vehicle)
    }

    /// Loads a driver by id.
    pub async fn get_driver(&self, driver_id: EntityId) -> Result<Driver> {
        self.drivers.load(driver_id).await.map_err(Into::into)
    }

    /// Loads a vehicle by id.
    pub async fn get_vehicle(&self, vehicle_id: EntityId) -> Result<Vehicle> {
        self.vehicles.load(vehicle_id).await.map_err(Into::into)
    }

    /// Lists all drivers.
    pub async fn list_drivers(&self) -> Result<Vec<Driver>> {
        self.drivers.list().await.map_err(Into::into)
    }

    /// Lists all vehicles.
    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        self.vehicles.list().await.map_err(Into::into)
    }

    /// Claims the driver and the vehicle for one assignment, or neither.
    ///
    /// Fails with an error naming the busy resource. The caller gets the
    /// requested pair or nothing; there is no fallback to whichever
    /// resource happens to be free.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(&self, driver_id: EntityId, vehicle_id: EntityId) -> Result<()> {
        self.drivers
            .try_update(driver_id, |driver| {
                driver.assign().map_err(DispatchError::from)
            })
            .await?;

        let vehicle_claim = self
            .vehicles
            .try_update(vehicle_id, |vehicle| {
                vehicle.claim().map_err(DispatchError::from)
            })
            .await;

        if let Err(e) = vehicle_claim {
            // Undo the driver claim so a busy vehicle leaves no trace
            self.release_driver(driver_id).await;
            return Err(e);
        }

        metrics::counter!("resources_reserved_total").increment(1);
        Ok(())
    }

    /// Returns both resources to rotation.
    ///
    /// Called when an assignment reaches Delivered; unconditional.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, driver_id: EntityId, vehicle_id: EntityId) -> Result<()> {
        self.drivers
            .try_update(driver_id, |driver| -> Result<()> {
                driver.release();
                Ok(())
            })
            .await?;

        self.vehicles
            .try_update(vehicle_id, |vehicle| -> Result<()> {
                vehicle.release();
                Ok(())
            })
            .await?;

        metrics::counter!("resources_released_total").increment(1);
        Ok(())
    }

    /// Takes a driver out of rotation for leave. Rejected while assigned.
    pub async fn set_driver_on_leave(&self, driver_id: EntityId) -> Result<Driver> {
        self.drivers
            .try_update(driver_id, |driver| {
                driver.begin_leave().map_err(DispatchError::from)
            })
            .await
    }

    /// Brings a driver back from leave.
    pub async fn set_driver_available(&self, driver_id: EntityId) -> Result<Driver> {
        self.drivers
            .try_update(driver_id, |driver| {
                driver.end_leave().map_err(DispatchError::from)
            })
            .await
    }

    /// Takes a vehicle out of service for maintenance. Rejected while in use.
    pub async fn set_vehicle_maintenance(&self, vehicle_id: EntityId) -> Result<Vehicle> {
        self.vehicles
            .try_update(vehicle_id, |vehicle| {
                vehicle.begin_maintenance().map_err(DispatchError::from)
            })
            .await
    }

    /// Returns a vehicle to service after maintenance.
    pub async fn set_vehicle_available(&self, vehicle_id: EntityId) -> Result<Vehicle> {
        self.vehicles
            .try_update(vehicle_id, |vehicle| {
                vehicle.end_maintenance().map_err(DispatchError::from)
            })
            .await
    }

    async fn release_driver(&self, driver_id: EntityId) {
        let released = self
            .drivers
            .try_update(driver_id, |driver| -> Result<()> {
                driver.release();
                Ok(())
            })
            .await;

        if let Err(e) = released {
            tracing::error!(%driver_id, error = %e, "failed to undo driver claim");
        }
    }
}
