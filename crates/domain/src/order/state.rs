//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions are strictly forward:
/// ```text
/// Pending ──► Paid ──► Assigned ──► InTransit ──► Delivered
///    │
///    └──► (cancelled: the order record is deleted)
/// ```
/// The Paid → Assigned → InTransit → Delivered legs are only ever driven by
/// the assignment coordinator, never by a direct client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, awaiting payment confirmation.
    #[default]
    Pending,

    /// Payment confirmed, ready for delivery assignment.
    Paid,

    /// Bound to a delivery assignment.
    Assigned,

    /// The delivery is underway.
    InTransit,

    /// Delivered (terminal state; the order is never mutated again).
    Delivered,
}

impl OrderStatus {
    /// Returns true if payment can be confirmed in this status.
    pub fn can_confirm_payment(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if a delivery assignment can be created in this status
    /// without the unpaid override.
    pub fn can_assign(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if the order can be cancelled (deleted) in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is the terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }

    /// Returns the status that directly follows this one, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Paid),
            OrderStatus::Paid => Some(OrderStatus::Assigned),
            OrderStatus::Assigned => Some(OrderStatus::InTransit),
            OrderStatus::InTransit => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Assigned => "Assigned",
            OrderStatus::InTransit => "InTransit",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state of an order, tracked separately from the delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// No payment received.
    #[default]
    Unpaid,

    /// Payment confirmed by the gateway.
    Paid,

    /// A payment was reported but awaits manual verification.
    PendingVerification,
}

impl PaymentStatus {
    /// Returns the payment status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::PendingVerification => "pending_verification",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_only_pending_can_confirm_payment() {
        assert!(OrderStatus::Pending.can_confirm_payment());
        assert!(!OrderStatus::Paid.can_confirm_payment());
        assert!(!OrderStatus::Assigned.can_confirm_payment());
        assert!(!OrderStatus::InTransit.can_confirm_payment());
        assert!(!OrderStatus::Delivered.can_confirm_payment());
    }

    #[test]
    fn test_only_paid_can_assign() {
        assert!(!OrderStatus::Pending.can_assign());
        assert!(OrderStatus::Paid.can_assign());
        assert!(!OrderStatus::Assigned.can_assign());
        assert!(!OrderStatus::InTransit.can_assign());
        assert!(!OrderStatus::Delivered.can_assign());
    }

    #[test]
    fn test_only_pending_can_cancel() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(!OrderStatus::Paid.can_cancel());
        assert!(!OrderStatus::Assigned.can_cancel());
        assert!(!OrderStatus::InTransit.can_cancel());
        assert!(!OrderStatus::Delivered.can_cancel());
    }

    #[test]
    fn test_next_walks_the_lifecycle_in_order() {
        assert_eq!(OrderStatus::Pending.next(), Some(OrderStatus::Paid));
        assert_eq!(OrderStatus::Paid.next(), Some(OrderStatus::Assigned));
        assert_eq!(OrderStatus::Assigned.next(), Some(OrderStatus::InTransit));
        assert_eq!(OrderStatus::InTransit.next(), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::Delivered.next(), None);
    }

    #[test]
    fn test_terminal_status() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::InTransit.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderStatus::Pending.to_string(), "Pending");
        assert_eq!(OrderStatus::InTransit.to_string(), "InTransit");
        assert_eq!(PaymentStatus::Unpaid.to_string(), "unpaid");
        assert_eq!(
            PaymentStatus::PendingVerification.to_string(),
            "pending_verification"
        );
    }

    #[test]
    fn test_serialization() {
        let status = OrderStatus::Assigned;
        let json = serde_json::to_string(&status).unwrap();
        let deserialized: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
    }
}
