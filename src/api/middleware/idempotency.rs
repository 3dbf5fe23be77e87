//! Idempotency middleware for mutating requests
//!
//! Requests carrying an `Idempotency-Key` header reserve the key before the handler runs.
//! A successful response completes the reservation; any other status releases it so the
//! client may retry.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::api::types::{ApiError, Json, MessageResponse};
use crate::domain::{IdempotencyKey, Reservation};
use crate::infrastructure::observability::record_idempotent_replay;
use crate::infrastructure::services::IdempotencyService;

pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

/// Body returned for a key that already completed
pub const ALREADY_PROCESSED_MESSAGE: &str = "Request already processed";

pub async fn idempotency_middleware(
    State(service): State<Arc<IdempotencyService>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_mutating(request.method()) {
        return next.run(request).await;
    }

    let key = match idempotency_key(request.headers()) {
        Ok(Some(key)) => key,
        Ok(None) => return next.run(request).await,
        Err(e) => return e.into_response(),
    };

    match service.reserve(&key).await {
        Ok(Reservation::Reserved) => {}
        Ok(Reservation::AlreadyCompleted) => {
            debug!(key = %key.as_str(), "Replaying completed request");
            record_idempotent_replay("completed");
            return (
                StatusCode::OK,
                Json(MessageResponse::new(ALREADY_PROCESSED_MESSAGE)),
            )
                .into_response();
        }
        Ok(Reservation::InFlight) => {
            record_idempotent_replay("in_flight");
            return ApiError::conflict(format!(
                "A request with idempotency key '{}' is still being processed",
                key.as_str()
            ))
            .into_response();
        }
        Err(e) => return ApiError::from(e).into_response(),
    }

    let response = next.run(request).await;

    let settled = if response.status().is_success() {
        service.complete(&key).await
    } else {
        service.release(&key).await
    };

    if let Err(e) = settled {
        warn!(key = %key.as_str(), error = %e, "Failed to settle idempotency key");
    }

    response
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn idempotency_key(headers: &HeaderMap) -> Result<Option<IdempotencyKey>, ApiError> {
    let Some(value) = headers.get(IDEMPOTENCY_HEADER) else {
        return Ok(None);
    };

    let key = value
        .to_str()
        .map_err(|_| ApiError::bad_request("Invalid Idempotency-Key header encoding"))?
        .trim();

    if key.is_empty() {
        return Err(ApiError::bad_request("Idempotency-Key header must not be empty"));
    }

    Ok(Some(IdempotencyKey::new(key)))
}
