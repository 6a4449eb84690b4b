//! Notification entity.

use chrono::{DateTime, Utc};
use common::EntityId;
use record_store::Version;
use serde::{Deserialize, Serialize};

use crate::assignment::AssignmentStatus;
use crate::entity::Entity;
use crate::order::CustomerId;

/// The event kind a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderPlaced,
    PaymentConfirmed,
    OrderCancelled,
    DeliveryAssigned,
    DeliveryInTransit,
    DeliveryCompleted,
}

impl NotificationKind {
    /// Returns the kind a delivery status change announces.
    pub fn for_assignment_status(status: AssignmentStatus) -> Self {
        match status {
            AssignmentStatus::Assigned => NotificationKind::DeliveryAssigned,
            AssignmentStatus::InTransit => NotificationKind::DeliveryInTransit,
            AssignmentStatus::Delivered => NotificationKind::DeliveryCompleted,
        }
    }

    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::OrderPlaced => "order_placed",
            NotificationKind::PaymentConfirmed => "payment_confirmed",
            NotificationKind::OrderCancelled => "order_cancelled",
            NotificationKind::DeliveryAssigned => "delivery_assigned",
            NotificationKind::DeliveryInTransit => "delivery_in_transit",
            NotificationKind::DeliveryCompleted => "delivery_completed",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Admin,
    Customer,
}

impl Audience {
    /// Returns the audience name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Admin => "admin",
            Audience::Customer => "customer",
        }
    }
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An announcement of a state transition, written to the store for a
/// downstream messaging channel to deliver.
///
/// Write-once except for the read flag; the core logic never reads
/// notifications back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    id: EntityId,
    kind: NotificationKind,
    audience: Audience,
    order_id: EntityId,
    customer_id: CustomerId,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
    #[serde(skip)]
    version: Version,
}

impl Entity for Notification {
    fn kind() -> &'static str {
        "Notification"
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

impl Notification {
    /// Creates a new unread notification.
    pub fn new(
        kind: NotificationKind,
        audience: Audience,
        order_id: EntityId,
        customer_id: CustomerId,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            audience,
            order_id,
            customer_id,
            message: message.into(),
            is_read: false,
            created_at: Utc::now(),
            version: Version::initial(),
        }
    }

    /// Returns the event kind.
    pub fn notification_kind(&self) -> NotificationKind {
        self.kind
    }

    /// Returns the audience.
    pub fn audience(&self) -> Audience {
        self.audience
    }

    /// Returns the order this notification refers to.
    pub fn order_id(&self) -> EntityId {
        self.order_id
    }

    /// Returns the customer this notification refers to.
    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Returns the message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the notification has been read.
    pub fn is_read(&self) -> bool {
        self.is_read
    }

    /// Returns when the notification was emitted.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Flags the notification as read.
    pub fn mark_read(&mut self) {
        self.is_read = true;
    }
}
