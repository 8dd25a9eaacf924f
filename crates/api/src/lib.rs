//! HTTP API server for the order service.
//!
//! Exposes order creation, lookup, status and payment updates, cancellation
//! and farmer statistics as JSON endpoints, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use domain::TransitionPolicy;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{
    CartStore, InMemoryCartStore, InMemoryOrderStore, InMemoryProductCatalog, OrderStore,
    ProductCatalog,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use workflow::OrderService;

use routes::orders::{self, AppState};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<O, P, C>(state: Arc<AppState<O, P, C>>, metrics_handle: PrometheusHandle) -> Router
where
    O: OrderStore + Clone + 'static,
    P: ProductCatalog + Clone + 'static,
    C: CartStore + 'static,
{
    let system = Router::new()
        .route("/health", get(routes::system::health))
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    let order_routes = Router::new()
        .route("/create", post(orders::create::<O, P, C>))
        .route("/{id}", get(orders::get::<O, P, C>))
        .route("/{id}/status", patch(orders::update_status::<O, P, C>))
        .route("/{id}/payment", patch(orders::update_payment::<O, P, C>))
        .route("/{id}/cancel", post(orders::cancel::<O, P, C>))
        .route("/customer/{customer_id}", get(orders::list_by_customer::<O, P, C>))
        .route("/farmer/{farmer_id}", get(orders::list_by_farmer::<O, P, C>))
        .route("/farmer/{farmer_id}/stats", get(orders::farmer_stats::<O, P, C>))
        .with_state(state);

    Router::new()
        .nest("/api/orders", order_routes)
        .merge(system)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// In-memory stores behind the service, for local runs and tests.
pub type InMemoryState = AppState<InMemoryOrderStore, InMemoryProductCatalog, InMemoryCartStore>;

/// Creates application state over fresh in-memory stores.
///
/// The catalog handle is returned so callers can stock products.
pub fn create_default_state(policy: TransitionPolicy) -> (Arc<InMemoryState>, InMemoryProductCatalog) {
    let catalog = InMemoryProductCatalog::new();
    let service = OrderService::new(
        InMemoryOrderStore::new(),
        catalog.clone(),
        InMemoryCartStore::new(),
    )
    .with_policy(policy);

    (Arc::new(AppState::new(service)), catalog)
}
