use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::health;
use super::middleware::{idempotency_middleware, metrics_middleware, rate_limit_middleware};
use super::registry;
use super::state::AppState;

/// Create the full router with application state
///
/// Registry routes sit behind the rate limiter and then the idempotency guard. Health
/// probes bypass both.
pub fn create_router_with_state(state: AppState, request_timeout: Duration) -> Router {
    let registry_routes = registry::create_registry_router()
        .layer(middleware::from_fn_with_state(
            state.idempotency_service.clone(),
            idempotency_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .merge(registry_routes)
        // Add state and middleware
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
