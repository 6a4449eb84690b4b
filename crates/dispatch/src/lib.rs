//! Coordinators for the order / inventory / delivery workflow.
//!
//! This crate wires the domain entities together into the operations the
//! back office exposes:
//! 1. Reserve stock for an order, all lines or none
//! 2. Advance an order through its payment and delivery lifecycle
//! 3. Couple driver/vehicle availability to delivery assignments
//! 4. Cascade assignment status changes onto the bound order
//!
//! Multi-entity operations run as compensating sequences: each step that
//! fails undoes the steps before it, so a failed operation leaves no
//! partial state behind. Notifications are emitted after the fact and
//! never affect the outcome of the operation that triggered them.

pub mod assignment;
pub mod availability;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod orders;
pub mod reservation;

pub use assignment::AssignmentCoordinator;
pub use availability::ResourceTracker;
pub use error::DispatchError;
pub use ledger::StockLedger;
pub use notify::{Notifier, NotifyError, RecordNotifier};
pub use orders::OrderService;
pub use reservation::ReservationCoordinator;
