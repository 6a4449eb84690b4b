//! Delivery assignment creation and the status cascade.

use common::EntityId;
use domain::{
    AssignmentStatus, Audience, DeliveryAssignment, Entity, Notification, NotificationKind, Order,
    Repository,
};
use record_store::RecordStore;

use crate::availability::ResourceTracker;
use crate::error::{DispatchError, Result};
use crate::notify::Notifier;

/// Creates delivery assignments and cascades their status changes onto the
/// bound order and resources.
///
/// Both operations run as compensating sequences: every write that fails
/// undoes the writes before it, so the assignment, the order, and the
/// driver/vehicle pair move together or not at all.
pub struct AssignmentCoordinator<S: RecordStore, N: Notifier> {
    assignments: Repository<S, DeliveryAssignment>,
    orders: Repository<S, Order>,
    resources: ResourceTracker<S>,
    notifier: N,
}

impl<S: RecordStore + Clone, N: Notifier> AssignmentCoordinator<S, N> {
    /// Creates a new assignment coordinator over the given store and
    /// notifier.
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            assignments: Repository::new(store.clone()),
            orders: Repository::new(store.clone()),
            resources: ResourceTracker::new(store),
            notifier,
        }
    }

    /// Returns the resource availability tracker.
    pub fn resources(&self) -> &ResourceTracker<S> {
        &self.resources
    }

    /// Binds an order to a driver and a vehicle for delivery.
    ///
    /// The order must be Paid, unless `allow_unpaid` lets an operator
    /// assign a Pending order. The requested driver and vehicle are claimed
    /// as a pair; a claim failure names the busy resource and leaves
    /// neither claimed. If binding the order fails after the claim, the
    /// claim is rolled back before the error surfaces.
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        order_id: EntityId,
        driver_id: EntityId,
        vehicle_id: EntityId,
        allow_unpaid: bool,
    ) -> Result<DeliveryAssignment> {
        let order = self.orders.load(order_id).await?;

        // Friendly rejection when the order is already bound; the status
        // guard inside the order update below closes the race.
        if let Some(existing_id) = order.assignment()
            && let Some(existing) = self.assignments.find(existing_id).await?
            && existing.is_active()
        {
            return Err(DispatchError::ActiveAssignmentExists { order_id });
        }

        self.resources.reserve(driver_id, vehicle_id).await?;

        match self.bind(order_id, driver_id, vehicle_id, allow_unpaid).await {
            Ok((assignment, order)) => {
                metrics::counter!("assignments_created_total").increment(1);
                tracing::info!(
                    assignment_id = %assignment.id(),
                    %order_id,
                    %driver_id,
                    %vehicle_id,
                    "delivery assigned"
                );

                self.notifier
                    .emit_best_effort(Notification::new(
                        NotificationKind::DeliveryAssigned,
                        Audience::Customer,
                        order_id,
                        order.customer_id(),
                        format!("A driver has been assigned to order {order_id}"),
                    ))
                    .await;

                Ok(assignment)
            }
            Err(e) => {
                // Orphaned busy resources are worse than a failed request
                if let Err(release_err) = self.resources.release(driver_id, vehicle_id).await {
                    tracing::error!(
                        %driver_id,
                        %vehicle_id,
                        error = %release_err,
                        "failed to undo resource claim after binding failure"
                    );
                }
                Err(e)
            }
        }
    }

    /// Creates the assignment record and binds the order to it.
    ///
    /// The assignment record is written first; if the order update then
    /// fails (payment gate, concurrent assignment), the record is deleted
    /// again so nothing points at it.
    async fn bind(
        &self,
        order_id: EntityId,
        driver_id: EntityId,
        vehicle_id: EntityId,
        allow_unpaid: bool,
    ) -> Result<(DeliveryAssignment, Order)> {
        let mut assignment = DeliveryAssignment::new(order_id, driver_id, vehicle_id);
        let assignment_id = assignment.id();
        let assigned_at = assignment.assigned_at();

        self.assignments.insert(&mut assignment).await?;

        let bound = self
            .orders
            .try_update(order_id, |order| {
                order
                    .begin_assignment(assignment_id, driver_id, vehicle_id, allow_unpaid, assigned_at)
                    .map_err(DispatchError::from)
            })
            .await;

        match bound {
            Ok(order) => Ok((assignment, order)),
            Err(e) => {
                let removed = self
                    .assignments
                    .delete_if(assignment_id, |_| -> Result<()> { Ok(()) })
                    .await;
                if let Err(delete_err) = removed {
                    tracing::error!(
                        %assignment_id,
                        error = %delete_err,
                        "failed to remove unbound assignment record"
                    );
                }
                Err(e)
            }
        }
    }

    /// Advances an assignment's status and cascades the change.
    ///
    /// Transitions are forward-only, one step at a time. The cascade to the
    /// bound order and, on Delivered, the resource release apply together
    /// with the assignment change or not at all: a failed order update
    /// rolls the assignment back before the error surfaces.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        assignment_id: EntityId,
        new_status: AssignmentStatus,
    ) -> Result<DeliveryAssignment> {
        let assignment = self.assignments.load(assignment_id).await?;
        let previous = assignment.status();

        // Check the transition and the bound order before writing anything
        if previous.next() != Some(new_status) {
            return Err(domain::AssignmentError::InvalidTransition {
                from: previous,
                to: new_status,
            }
            .into());
        }
        let order_id = assignment.order_id();
        self.orders.load(order_id).await?;

        let updated = self
            .assignments
            .try_update(assignment_id, |a| {
                a.advance_to(new_status).map_err(DispatchError::from)
            })
            .await?;

        let cascaded = self
            .orders
            .try_update(order_id, |order| {
                match new_status {
                    AssignmentStatus::InTransit => order.mark_in_transit(),
                    AssignmentStatus::Delivered => order.mark_delivered(),
                    // next() never yields Assigned
                    AssignmentStatus::Assigned => unreachable!("no transition into Assigned"),
                }
                .map_err(DispatchError::from)
            })
            .await;

        let order = match cascaded {
            Ok(order) => order,
            Err(e) => {
                let rolled_back = self
                    .assignments
                    .try_update(assignment_id, |a| -> Result<()> {
                        a.roll_back_to(previous);
                        Ok(())
                    })
                    .await;
                if let Err(rollback_err) = rolled_back {
                    tracing::error!(
                        %assignment_id,
                        error = %rollback_err,
                        "failed to roll back assignment status after order cascade failure"
                    );
                }
                return Err(e);
            }
        };

        if new_status == AssignmentStatus::Delivered {
            self.resources
                .release(updated.driver_id(), updated.vehicle_id())
                .await?;
        }

        metrics::counter!("assignment_status_updates_total").increment(1);
        tracing::info!(%assignment_id, status = %new_status, "assignment status updated");

        self.notifier
            .emit_best_effort(Notification::new(
                NotificationKind::for_assignment_status(new_status),
                Audience::Customer,
                order_id,
                order.customer_id(),
                format!("Order {order_id} is now {new_status}"),
            ))
            .await;

        Ok(updated)
    }

    /// Loads an assignment by id.
    pub async fn get(&self, assignment_id: EntityId) -> Result<DeliveryAssignment> {
        self.assignments.load(assignment_id).await.map_err(Into::into)
    }

    /// Lists all assignments.
    pub async fn list(&self) -> Result<Vec<DeliveryAssignment>> {
        self.assignments.list().await.map_err(Into::into)
    }
}
