//! Order entity implementation.

use chrono::{DateTime, Utc};
use common::EntityId;
use record_store::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Entity;

use super::{CustomerId, Money, OrderLine, OrderStatus, PaymentStatus};

/// Errors produced by order commands.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A status change violates the forward-only transition table.
    #[error("Invalid order transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Payment was already confirmed for this order.
    #[error("Order payment is already confirmed")]
    AlreadyPaid,

    /// The order is unpaid and the unpaid override was not given.
    #[error("Order is not paid; assignment requires payment or the unpaid override")]
    PaymentRequired,

    /// The order has progressed past the point where it can be cancelled.
    #[error("Order cannot be cancelled in {status} status")]
    NotCancellable { status: OrderStatus },

    /// An order needs at least one line.
    #[error("Order has no lines")]
    EmptyOrder,

    /// A line quantity must be greater than zero.
    #[error("Invalid quantity for item {item_id}: must be greater than zero")]
    InvalidQuantity { item_id: EntityId },

    /// A line unit price must not be negative.
    #[error("Invalid unit price for item {item_id}: {cents} cents")]
    InvalidPrice { item_id: EntityId, cents: i64 },
}

/// An order placed by a customer.
///
/// The order owns its status/payment-status fields; every change goes
/// through a command method that enforces the transition table. The
/// Paid → Assigned → InTransit → Delivered legs are driven by the
/// assignment coordinator only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: EntityId,
    customer_id: CustomerId,
    lines: Vec<OrderLine>,
    total_amount: Money,
    status: OrderStatus,
    payment_status: PaymentStatus,
    stock_reserved: bool,
    assigned_driver: Option<EntityId>,
    assigned_vehicle: Option<EntityId>,
    assignment: Option<EntityId>,
    delivery_assigned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    #[serde(skip)]
    version: Version,
}

impl Entity for Order {
    fn kind() -> &'static str {
        "Order"
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

// Query methods
impl Order {
    /// Returns the customer who placed the order.
    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Returns the order lines.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the payment status.
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Returns true if stock was reserved for this order.
    pub fn stock_reserved(&self) -> bool {
        self.stock_reserved
    }

    /// Returns the total amount.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns the driver bound to this order's delivery, if any.
    pub fn assigned_driver(&self) -> Option<EntityId> {
        self.assigned_driver
    }

    /// Returns the vehicle bound to this order's delivery, if any.
    pub fn assigned_vehicle(&self) -> Option<EntityId> {
        self.assigned_vehicle
    }

    /// Returns the delivery assignment bound to this order, if any.
    pub fn assignment(&self) -> Option<EntityId> {
        self.assignment
    }

    /// Returns when the delivery was assigned, if it was.
    pub fn delivery_assigned_at(&self) -> Option<DateTime<Utc>> {
        self.delivery_assigned_at
    }

    /// Returns when the order was placed.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// Command methods
impl Order {
    /// Creates a new order for a customer.
    ///
    /// A prepaid order starts directly at Paid/paid; otherwise the order
    /// starts at Pending/unpaid. Stock reservation is recorded separately
    /// by the reservation coordinator's outcome.
    pub fn new(
        customer_id: CustomerId,
        lines: Vec<OrderLine>,
        prepaid: bool,
    ) -> Result<Self, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        for line in &lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    item_id: line.item_id,
                });
            }
            if line.unit_price.is_negative() {
                return Err(OrderError::InvalidPrice {
                    item_id: line.item_id,
                    cents: line.unit_price.cents(),
                });
            }
        }

        let total_amount = lines
            .iter()
            .fold(Money::zero(), |acc, line| acc + line.line_total());

        let (status, payment_status) = if prepaid {
            (OrderStatus::Paid, PaymentStatus::Paid)
        } else {
            (OrderStatus::Pending, PaymentStatus::Unpaid)
        };

        Ok(Self {
            id: EntityId::new(),
            customer_id,
            lines,
            total_amount,
            status,
            payment_status,
            stock_reserved: false,
            assigned_driver: None,
            assigned_vehicle: None,
            assignment: None,
            delivery_assigned_at: None,
            created_at: Utc::now(),
            version: Version::initial(),
        })
    }

    /// Records that stock was reserved for every line of this order.
    pub fn mark_stock_reserved(&mut self) {
        self.stock_reserved = true;
    }

    /// Confirms payment: Pending → Paid only.
    pub fn confirm_payment(&mut self) -> Result<(), OrderError> {
        if self.payment_status == PaymentStatus::Paid {
            return Err(OrderError::AlreadyPaid);
        }
        if !self.status.can_confirm_payment() {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Paid,
            });
        }

        self.status = OrderStatus::Paid;
        self.payment_status = PaymentStatus::Paid;
        Ok(())
    }

    /// Binds the order to a delivery assignment: Paid → Assigned.
    ///
    /// With `allow_unpaid` set an operator may assign an order that is
    /// still Pending; without it an unpaid order is rejected.
    pub fn begin_assignment(
        &mut self,
        assignment_id: EntityId,
        driver_id: EntityId,
        vehicle_id: EntityId,
        allow_unpaid: bool,
        at: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Paid => {}
            OrderStatus::Pending if allow_unpaid => {}
            OrderStatus::Pending => return Err(OrderError::PaymentRequired),
            from => {
                return Err(OrderError::InvalidTransition {
                    from,
                    to: OrderStatus::Assigned,
                });
            }
        }

        self.status = OrderStatus::Assigned;
        self.assignment = Some(assignment_id);
        self.assigned_driver = Some(driver_id);
        self.assigned_vehicle = Some(vehicle_id);
        self.delivery_assigned_at = Some(at);
        Ok(())
    }

    /// Marks the delivery as underway: Assigned → InTransit.
    pub fn mark_in_transit(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Assigned {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: OrderStatus::InTransit,
            });
        }
        self.status = OrderStatus::InTransit;
        Ok(())
    }

    /// Marks the delivery as completed: InTransit → Delivered.
    pub fn mark_delivered(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::InTransit {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Delivered,
            });
        }
        self.status = OrderStatus::Delivered;
        Ok(())
    }

    /// Checks that the order may still be cancelled.
    pub fn ensure_cancellable(&self) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::NotCancellable {
                status: self.status,
            });
        }
        Ok(())
    }
}
