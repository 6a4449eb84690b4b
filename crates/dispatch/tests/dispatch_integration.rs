//! End-to-end tests for the reservation / order / assignment workflow.

use common::EntityId;
use dispatch::{
    AssignmentCoordinator, DispatchError, OrderService, RecordNotifier, ReservationCoordinator,
};
use domain::{
    AssignmentStatus, Audience, CustomerId, Entity, Money, NotificationKind, OrderLine,
    OrderStatus,
};
use futures_util::future::join_all;
use record_store::InMemoryRecordStore;

struct World {
    store: InMemoryRecordStore,
    notifier: RecordNotifier<InMemoryRecordStore>,
    orders: OrderService<InMemoryRecordStore, RecordNotifier<InMemoryRecordStore>>,
    assignments: AssignmentCoordinator<InMemoryRecordStore, RecordNotifier<InMemoryRecordStore>>,
}

fn world() -> World {
    let store = InMemoryRecordStore::new();
    let notifier = RecordNotifier::new(store.clone());
    World {
        orders: OrderService::new(store.clone(), notifier.clone()),
        assignments: AssignmentCoordinator::new(store.clone(), notifier.clone()),
        notifier,
        store,
    }
}

fn line(item_id: EntityId, quantity: u32) -> OrderLine {
    OrderLine::new(item_id, "Widget", Money::from_cents(1000), quantity)
}

/// N concurrent single-unit reservations against a stock of K: exactly K
/// may succeed.
#[tokio::test(flavor = "multi_thread")]
async fn no_overselling_under_concurrency() {
    let w = world();
    let item = w
        .orders
        .reservation()
        .ledger()
        .create_item("Widget", 8)
        .await
        .unwrap();
    let item_id = item.id();

    let attempts: Vec<_> = (0..32)
        .map(|_| {
            let store = w.store.clone();
            let notifier = w.notifier.clone();
            tokio::spawn(async move {
                let orders = OrderService::new(store, notifier);
                orders
                    .place_order(CustomerId::new(), vec![line(item_id, 1)], false)
                    .await
            })
        })
        .collect();

    let results = join_all(attempts).await;
    let successes = results
        .into_iter()
        .filter(|r| r.as_ref().unwrap().is_ok())
        .count();

    assert_eq!(successes, 8);

    let remaining = w
        .orders
        .reservation()
        .ledger()
        .get_item(item_id)
        .await
        .unwrap();
    assert_eq!(remaining.available_quantity(), 0);
    assert_eq!(w.orders.list_orders().await.unwrap().len(), 8);
}

/// An order of [A:2, B:3] against stock [A:5, B:0] must fail and leave A
/// at 5, not 3.
#[tokio::test]
async fn all_or_nothing_reservation() {
    let w = world();
    let ledger = w.orders.reservation().ledger();
    let a = ledger.create_item("A", 5).await.unwrap();
    let b = ledger.create_item("B", 0).await.unwrap();

    let result = w
        .orders
        .place_order(
            CustomerId::new(),
            vec![line(a.id(), 2), line(b.id(), 3)],
            false,
        )
        .await;

    assert!(matches!(
        result,
        Err(DispatchError::InsufficientStock { item_id, .. }) if item_id == b.id()
    ));

    assert_eq!(ledger.get_item(a.id()).await.unwrap().available_quantity(), 5);
    assert_eq!(ledger.get_item(b.id()).await.unwrap().available_quantity(), 0);
    assert!(w.orders.list_orders().await.unwrap().is_empty());
}

/// Pending → Paid → Assigned → InTransit → Delivered all succeed in order;
/// skipped legs are rejected.
#[tokio::test]
async fn forward_only_order_transitions() {
    let w = world();
    let item = w
        .orders
        .reservation()
        .ledger()
        .create_item("Widget", 10)
        .await
        .unwrap();
    let order = w
        .orders
        .place_order(CustomerId::new(), vec![line(item.id(), 1)], false)
        .await
        .unwrap();

    let driver = w
        .assignments
        .resources()
        .register_driver("Amina", "555-0101")
        .await
        .unwrap();
    let vehicle = w
        .assignments
        .resources()
        .register_vehicle("KBX-412", "Box truck")
        .await
        .unwrap();

    // Pending → Assigned directly is rejected (payment gate)
    let premature = w
        .assignments
        .create(order.id(), driver.id(), vehicle.id(), false)
        .await;
    assert!(premature.is_err());

    // The legal walk
    w.orders.confirm_payment(order.id()).await.unwrap();
    let assignment = w
        .assignments
        .create(order.id(), driver.id(), vehicle.id(), false)
        .await
        .unwrap();
    w.assignments
        .update_status(assignment.id(), AssignmentStatus::InTransit)
        .await
        .unwrap();
    w.assignments
        .update_status(assignment.id(), AssignmentStatus::Delivered)
        .await
        .unwrap();

    let delivered = w.orders.get_order(order.id()).await.unwrap();
    assert_eq!(delivered.status(), OrderStatus::Delivered);

    // Delivered is terminal: no further status change anywhere
    let result = w
        .assignments
        .update_status(assignment.id(), AssignmentStatus::InTransit)
        .await;
    assert!(matches!(result, Err(DispatchError::Assignment(_))));

    let result = w.orders.confirm_payment(order.id()).await;
    assert!(result.is_err());
}

/// After reserve(driver1, vehicle1), reserve(driver1, vehicle2) fails
/// naming the driver; after delivery it succeeds.
#[tokio::test]
async fn resource_exclusivity() {
    let w = world();
    let resources = w.assignments.resources();
    let driver1 = resources.register_driver("Amina", "555-0101").await.unwrap();
    let vehicle1 = resources.register_vehicle("KBX-412", "Truck").await.unwrap();
    let vehicle2 = resources.register_vehicle("KBX-413", "Van").await.unwrap();

    let item = w
        .orders
        .reservation()
        .ledger()
        .create_item("Widget", 10)
        .await
        .unwrap();
    let order = w
        .orders
        .place_order(CustomerId::new(), vec![line(item.id(), 1)], true)
        .await
        .unwrap();

    let assignment = w
        .assignments
        .create(order.id(), driver1.id(), vehicle1.id(), false)
        .await
        .unwrap();

    // The driver is exclusively bound
    let result = resources.reserve(driver1.id(), vehicle2.id()).await;
    assert!(matches!(result, Err(DispatchError::DriverUnavailable(_))));

    // Delivery releases the binding
    w.assignments
        .update_status(assignment.id(), AssignmentStatus::InTransit)
        .await
        .unwrap();
    w.assignments
        .update_status(assignment.id(), AssignmentStatus::Delivered)
        .await
        .unwrap();

    resources.reserve(driver1.id(), vehicle2.id()).await.unwrap();
}

/// Creating an order for 4 units (10 → 6) and cancelling it while Pending
/// restores the stock to 10 and deletes the order.
#[tokio::test]
async fn cancellation_restocking() {
    let w = world();
    let ledger = w.orders.reservation().ledger();
    let item = ledger.create_item("Widget", 10).await.unwrap();

    let order = w
        .orders
        .place_order(CustomerId::new(), vec![line(item.id(), 4)], false)
        .await
        .unwrap();
    assert_eq!(
        ledger.get_item(item.id()).await.unwrap().available_quantity(),
        6
    );

    w.orders.cancel_order(order.id()).await.unwrap();

    assert_eq!(
        ledger.get_item(item.id()).await.unwrap().available_quantity(),
        10
    );
    assert!(matches!(
        w.orders.get_order(order.id()).await,
        Err(DispatchError::NotFound { .. })
    ));
}

/// An unreachable notification channel must not prevent the assignment
/// update or the order cascade from committing.
#[tokio::test]
async fn notification_isolation() {
    let w = world();
    let item = w
        .orders
        .reservation()
        .ledger()
        .create_item("Widget", 10)
        .await
        .unwrap();
    let order = w
        .orders
        .place_order(CustomerId::new(), vec![line(item.id(), 1)], true)
        .await
        .unwrap();
    let driver = w
        .assignments
        .resources()
        .register_driver("Amina", "555-0101")
        .await
        .unwrap();
    let vehicle = w
        .assignments
        .resources()
        .register_vehicle("KBX-412", "Truck")
        .await
        .unwrap();

    w.notifier.set_fail_on_emit(true);

    let assignment = w
        .assignments
        .create(order.id(), driver.id(), vehicle.id(), false)
        .await
        .unwrap();
    w.assignments
        .update_status(assignment.id(), AssignmentStatus::InTransit)
        .await
        .unwrap();

    let loaded = w.orders.get_order(order.id()).await.unwrap();
    assert_eq!(loaded.status(), OrderStatus::InTransit);

    // Once the channel recovers, later transitions notify again
    w.notifier.set_fail_on_emit(false);
    w.assignments
        .update_status(assignment.id(), AssignmentStatus::Delivered)
        .await
        .unwrap();

    let customer = w
        .notifier
        .list_for_audience(Audience::Customer)
        .await
        .unwrap();
    assert_eq!(customer.len(), 1);
    assert_eq!(
        customer[0].notification_kind(),
        NotificationKind::DeliveryCompleted
    );
}

/// Concurrent multi-line orders over a shared item pool never reserve more
/// than the pool holds, and every failed order compensates fully.
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_multi_line_orders_balance_the_ledger() {
    let w = world();
    let ledger = w.orders.reservation().ledger();
    let a = ledger.create_item("A", 6).await.unwrap();
    let b = ledger.create_item("B", 4).await.unwrap();
    let (a_id, b_id) = (a.id(), b.id());

    let attempts: Vec<_> = (0..10)
        .map(|_| {
            let store = w.store.clone();
            let notifier = w.notifier.clone();
            tokio::spawn(async move {
                let orders = OrderService::new(store, notifier);
                orders
                    .place_order(
                        CustomerId::new(),
                        vec![line(a_id, 1), line(b_id, 1)],
                        false,
                    )
                    .await
            })
        })
        .collect();

    let results = join_all(attempts).await;
    let successes = results
        .into_iter()
        .filter(|r| r.as_ref().unwrap().is_ok())
        .count();

    // B is the bottleneck: exactly 4 orders can be served
    assert_eq!(successes, 4);

    // Whatever failed must have returned its A units
    let a_left = ledger.get_item(a_id).await.unwrap().available_quantity();
    let b_left = ledger.get_item(b_id).await.unwrap().available_quantity();
    assert_eq!(a_left, 2);
    assert_eq!(b_left, 0);
}

/// Concurrent assignment creations for one order grant exactly one
/// assignment; the losers leave their resources free.
#[tokio::test(flavor = "multi_thread")]
async fn one_active_assignment_per_order() {
    let w = world();
    let item = w
        .orders
        .reservation()
        .ledger()
        .create_item("Widget", 10)
        .await
        .unwrap();
    let order = w
        .orders
        .place_order(CustomerId::new(), vec![line(item.id(), 1)], true)
        .await
        .unwrap();
    let order_id = order.id();

    let mut pairs = Vec::new();
    for n in 0..5 {
        let driver = w
            .assignments
            .resources()
            .register_driver(format!("Driver {n}"), format!("555-01{n:02}"))
            .await
            .unwrap();
        let vehicle = w
            .assignments
            .resources()
            .register_vehicle(format!("KBX-{n:03}"), "Van")
            .await
            .unwrap();
        pairs.push((driver.id(), vehicle.id()));
    }

    let attempts: Vec<_> = pairs
        .iter()
        .map(|&(driver_id, vehicle_id)| {
            let store = w.store.clone();
            let notifier = w.notifier.clone();
            tokio::spawn(async move {
                let coordinator = AssignmentCoordinator::new(store, notifier);
                coordinator.create(order_id, driver_id, vehicle_id, false).await
            })
        })
        .collect();

    let results = join_all(attempts).await;
    let successes = results
        .into_iter()
        .filter(|r| r.as_ref().unwrap().is_ok())
        .count();
    assert_eq!(successes, 1);

    // Exactly one pair is claimed; the rest went back to Available
    let mut claimed = 0;
    for (driver_id, vehicle_id) in pairs {
        let driver = w.assignments.resources().get_driver(driver_id).await.unwrap();
        let vehicle = w
            .assignments
            .resources()
            .get_vehicle(vehicle_id)
            .await
            .unwrap();
        assert_eq!(driver.is_available(), vehicle.is_available());
        if !driver.is_available() {
            claimed += 1;
        }
    }
    assert_eq!(claimed, 1);

    assert_eq!(w.assignments.list().await.unwrap().len(), 1);
}

/// A direct reservation release after a standalone reserve leaves the
/// ledger balanced.
#[tokio::test]
async fn standalone_reservation_roundtrip() {
    let store = InMemoryRecordStore::new();
    let coordinator = ReservationCoordinator::new(store);
    let item = coordinator.ledger().create_item("Widget", 10).await.unwrap();
    let lines = vec![line(item.id(), 7)];

    coordinator.reserve(&lines).await.unwrap();
    assert_eq!(
        coordinator
            .ledger()
            .get_item(item.id())
            .await
            .unwrap()
            .available_quantity(),
        3
    );

    coordinator.release(&lines).await;
    assert_eq!(
        coordinator
            .ledger()
            .get_item(item.id())
            .await
            .unwrap()
            .available_quantity(),
        10
    );
}
