//! Order placement, payment confirmation, and cancellation.

use common::EntityId;
use domain::{
    Audience, CustomerId, Entity, Notification, NotificationKind, Order, OrderLine, Repository,
};
use record_store::RecordStore;

use crate::error::{DispatchError, Result};
use crate::notify::Notifier;
use crate::reservation::ReservationCoordinator;

/// Front door for the order lifecycle operations a client may invoke
/// directly: place, confirm payment, cancel.
///
/// The assignment-driven legs of the lifecycle (Assigned, InTransit,
/// Delivered) are owned by the assignment coordinator and are not reachable
/// from here.
pub struct OrderService<S: RecordStore, N: Notifier> {
    orders: Repository<S, Order>,
    reservation: ReservationCoordinator<S>,
    notifier: N,
}

impl<S: RecordStore + Clone, N: Notifier> OrderService<S, N> {
    /// Creates a new order service over the given store and notifier.
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            orders: Repository::new(store.clone()),
            reservation: ReservationCoordinator::new(store),
            notifier,
        }
    }

    /// Returns the reservation coordinator.
    pub fn reservation(&self) -> &ReservationCoordinator<S> {
        &self.reservation
    }

    /// Places an order: reserves stock for every line, then creates the
    /// order record.
    ///
    /// A prepaid order starts directly at Paid; otherwise it starts at
    /// Pending awaiting payment confirmation. If the order record cannot be
    /// created after the reservation succeeded, the reservation is rolled
    /// back before the error surfaces.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        lines: Vec<OrderLine>,
        prepaid: bool,
    ) -> Result<Order> {
        let mut order = Order::new(customer_id, lines, prepaid)?;

        self.reservation.reserve(order.lines()).await?;
        order.mark_stock_reserved();

        if let Err(e) = self.orders.insert(&mut order).await {
            self.reservation.release(order.lines()).await;
            return Err(e.into());
        }

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id(), total = %order.total_amount(), "order placed");

        self.notifier
            .emit_best_effort(Notification::new(
                NotificationKind::OrderPlaced,
                Audience::Admin,
                order.id(),
                customer_id,
                format!("Order {} placed for {}", order.id(), order.total_amount()),
            ))
            .await;

        Ok(order)
    }

    /// Confirms payment for an order: Pending → Paid.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_payment(&self, order_id: EntityId) -> Result<Order> {
        let order = self
            .orders
            .try_update(order_id, |order| {
                order.confirm_payment().map_err(DispatchError::from)
            })
            .await?;

        metrics::counter!("payments_confirmed_total").increment(1);

        self.notifier
            .emit_best_effort(Notification::new(
                NotificationKind::PaymentConfirmed,
                Audience::Admin,
                order.id(),
                order.customer_id(),
                format!("Payment confirmed for order {}", order.id()),
            ))
            .await;

        Ok(order)
    }

    /// Cancels an order, permitted only while it is still Pending.
    ///
    /// The record is deleted under the same conditional check that verifies
    /// the status, so a concurrent payment confirmation can never lose a
    /// paid order; the reserved stock is returned afterwards.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: EntityId) -> Result<()> {
        let order = self
            .orders
            .delete_if(order_id, |order| {
                order.ensure_cancellable().map_err(DispatchError::from)
            })
            .await?;

        if order.stock_reserved() {
            self.reservation.release(order.lines()).await;
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, "order cancelled");

        self.notifier
            .emit_best_effort(Notification::new(
                NotificationKind::OrderCancelled,
                Audience::Admin,
                order_id,
                order.customer_id(),
                format!("Order {order_id} cancelled"),
            ))
            .await;

        Ok(())
    }

    /// Loads an order by id.
    pub async fn get_order(&self, order_id: EntityId) -> Result<Order> {
        self.orders.load(order_id).await.map_err(Into::into)
    }

    /// Lists all orders.
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        self.orders.list().await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Entity, Money, OrderError, OrderStatus, PaymentStatus};
    use record_store::InMemoryRecordStore;

    use crate::notify::RecordNotifier;

    type TestService = OrderService<InMemoryRecordStore, RecordNotifier<InMemoryRecordStore>>;

    async fn setup() -> (TestService, RecordNotifier<InMemoryRecordStore>, EntityId) {
        let store = InMemoryRecordStore::new();
        let notifier = RecordNotifier::new(store.clone());
        let service = OrderService::new(store, notifier.clone());
        let item = service
            .reservation()
            .ledger()
            .create_item("Widget", 10)
            .await
            .unwrap();
        (service, notifier, item.id())
    }

    fn lines(item_id: EntityId, quantity: u32) -> Vec<OrderLine> {
        vec![OrderLine::new(
            item_id,
            "Widget",
            Money::from_cents(1000),
            quantity,
        )]
    }

    #[tokio::test]
    async fn place_order_reserves_stock() {
        let (service, _, item_id) = setup().await;

        let order = service
            .place_order(CustomerId::new(), lines(item_id, 4), false)
            .await
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(order.stock_reserved());

        let item = service.reservation().ledger().get_item(item_id).await.unwrap();
        assert_eq!(item.available_quantity(), 6);
    }

    #[tokio::test]
    async fn place_prepaid_order_starts_paid() {
        let (service, _, item_id) = setup().await;

        let order = service
            .place_order(CustomerId::new(), lines(item_id, 1), true)
            .await
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Paid);
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert!(order.stock_reserved());
    }

    #[tokio::test]
    async fn place_order_with_insufficient_stock_fails() {
        let (service, _, item_id) = setup().await;

        let result = service
            .place_order(CustomerId::new(), lines(item_id, 11), false)
            .await;

        assert!(matches!(
            result,
            Err(DispatchError::InsufficientStock { .. })
        ));

        // Stock untouched, no order record created
        let item = service.reservation().ledger().get_item(item_id).await.unwrap();
        assert_eq!(item.available_quantity(), 10);
        assert!(service.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn confirm_payment_moves_order_to_paid() {
        let (service, _, item_id) = setup().await;
        let order = service
            .place_order(CustomerId::new(), lines(item_id, 1), false)
            .await
            .unwrap();

        let updated = service.confirm_payment(order.id()).await.unwrap();
        assert_eq!(updated.status(), OrderStatus::Paid);
        assert_eq!(updated.payment_status(), PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn confirm_payment_twice_rejected() {
        let (service, _, item_id) = setup().await;
        let order = service
            .place_order(CustomerId::new(), lines(item_id, 1), false)
            .await
            .unwrap();

        service.confirm_payment(order.id()).await.unwrap();
        let result = service.confirm_payment(order.id()).await;

        assert!(matches!(
            result,
            Err(DispatchError::Order(OrderError::AlreadyPaid))
        ));
    }

    #[tokio::test]
    async fn cancel_pending_order_restocks_and_deletes() {
        let (service, _, item_id) = setup().await;
        let order = service
            .place_order(CustomerId::new(), lines(item_id, 4), false)
            .await
            .unwrap();

        service.cancel_order(order.id()).await.unwrap();

        let item = service.reservation().ledger().get_item(item_id).await.unwrap();
        assert_eq!(item.available_quantity(), 10);

        let result = service.get_order(order.id()).await;
        assert!(matches!(result, Err(DispatchError::NotFound { .. })));
    }

    #[tokio::test]
    async fn cancel_paid_order_rejected() {
        let (service, _, item_id) = setup().await;
        let order = service
            .place_order(CustomerId::new(), lines(item_id, 2), false)
            .await
            .unwrap();
        service.confirm_payment(order.id()).await.unwrap();

        let result = service.cancel_order(order.id()).await;
        assert!(matches!(
            result,
            Err(DispatchError::Order(OrderError::NotCancellable { .. }))
        ));

        // Order still there, stock still held
        assert!(service.get_order(order.id()).await.is_ok());
        let item = service.reservation().ledger().get_item(item_id).await.unwrap();
        assert_eq!(item.available_quantity(), 8);
    }

    #[tokio::test]
    async fn notifications_emitted_on_lifecycle_events() {
        let (service, notifier, item_id) = setup().await;
        let order = service
            .place_order(CustomerId::new(), lines(item_id, 1), false)
            .await
            .unwrap();
        service.confirm_payment(order.id()).await.unwrap();

        let admin = notifier.list_for_audience(Audience::Admin).await.unwrap();
        assert_eq!(admin.len(), 2);
        assert_eq!(
            admin[0].notification_kind(),
            NotificationKind::OrderPlaced
        );
        assert_eq!(
            admin[1].notification_kind(),
            NotificationKind::PaymentConfirmed
        );
    }

    #[tokio::test]
    async fn notifier_outage_does_not_fail_order_placement() {
        let (service, notifier, item_id) = setup().await;
        notifier.set_fail_on_emit(true);

        let order = service
            .place_order(CustomerId::new(), lines(item_id, 2), false)
            .await
            .unwrap();

        // The order committed even though no notification landed
        assert!(service.get_order(order.id()).await.is_ok());
        assert_eq!(notifier.count().await.unwrap(), 0);
    }
}
