//! HTTP API server with observability for the dispatch system.
//!
//! Provides REST endpoints for catalog, fleet, order, and delivery
//! assignment management, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use dispatch::{AssignmentCoordinator, OrderService, RecordNotifier};
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::RecordStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RecordStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/items", post(routes::items::create::<S>))
        .route("/items", get(routes::items::list::<S>))
        .route("/items/{id}", get(routes::items::get::<S>))
        .route("/items/{id}/restock", post(routes::items::restock::<S>))
        .route("/drivers", post(routes::fleet::create_driver::<S>))
        .route("/drivers", get(routes::fleet::list_drivers::<S>))
        .route("/drivers/{id}", get(routes::fleet::get_driver::<S>))
        .route(
            "/drivers/{id}/availability",
            post(routes::fleet::set_driver_availability::<S>),
        )
        .route("/vehicles", post(routes::fleet::create_vehicle::<S>))
        .route("/vehicles", get(routes::fleet::list_vehicles::<S>))
        .route("/vehicles/{id}", get(routes::fleet::get_vehicle::<S>))
        .route(
            "/vehicles/{id}/status",
            post(routes::fleet::set_vehicle_status::<S>),
        )
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}", delete(routes::orders::cancel::<S>))
        .route(
            "/orders/{id}/payment",
            post(routes::orders::confirm_payment::<S>),
        )
        .route("/assignments", post(routes::assignments::create::<S>))
        .route("/assignments", get(routes::assignments::list::<S>))
        .route("/assignments/{id}", get(routes::assignments::get::<S>))
        .route(
            "/assignments/{id}/status",
            post(routes::assignments::update_status::<S>),
        )
        .route("/notifications", get(routes::notifications::list::<S>))
        .route(
            "/notifications/{id}/read",
            post(routes::notifications::mark_read::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over the given record store.
pub fn create_default_state<S: RecordStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    let notifier = RecordNotifier::new(store.clone());

    Arc::new(AppState {
        orders: OrderService::new(store.clone(), notifier.clone()),
        assignments: AssignmentCoordinator::new(store, notifier.clone()),
        notifier,
    })
}
