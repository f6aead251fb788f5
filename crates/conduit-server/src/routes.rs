use std::sync::Arc;

use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::require_organization;
use crate::state::AppState;

/// Build the HTTP router.
///
/// Everything under `/api` except the executor health check requires the
/// organization header.
pub fn create_router(state: Arc<AppState>) -> Router {
    let tenant = Router::new()
        .route("/api/execute/{instance_id}", post(handlers::execute::execute))
        .route("/api/metrics/summary", get(handlers::metrics::summary))
        .route("/api/metrics/usage", get(handlers::metrics::usage))
        .route("/api/metrics/activity", get(handlers::metrics::activity))
        .route("/api/metrics/errors", get(handlers::metrics::errors))
        .route("/api/metrics/performance", get(handlers::metrics::performance))
        .route_layer(from_fn(require_organization));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/execute/health", get(handlers::execute::health))
        .merge(tenant)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
