//! HTTP API server with observability for the place rating ledger.
//!
//! Exposes every ledger operation as a REST endpoint, one request per
//! operation, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use ledger::{LedgerConfig, RatingLedger};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use world_state::StateStore;

use routes::ratings::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: StateStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/ledger/init", post(routes::ratings::initialize::<S>))
        .route("/ledger/empty", get(routes::ratings::empty::<S>))
        .route(
            "/ratings",
            post(routes::ratings::create::<S>).get(routes::ratings::list::<S>),
        )
        .route(
            "/ratings/{id}",
            get(routes::ratings::get::<S>)
                .put(routes::ratings::update::<S>)
                .delete(routes::ratings::delete::<S>),
        )
        .route("/ratings/{id}/exists", get(routes::ratings::exists::<S>))
        .route("/places/{place}", get(routes::ratings::place_summary::<S>))
        .route(
            "/places/{place}/ratings",
            get(routes::ratings::place_ratings::<S>),
        )
        .route(
            "/places/{place}/average",
            get(routes::ratings::place_average::<S>),
        )
        .route("/report", get(routes::ratings::report::<S>))
        .route("/report/json", get(routes::ratings::report_json::<S>))
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

/// Creates the application state with a ledger over `store`.
pub fn create_state<S: StateStore + 'static>(store: S, config: LedgerConfig) -> Arc<AppState<S>> {
    Arc::new(AppState {
        ledger: RatingLedger::with_config(store, config),
    })
}
