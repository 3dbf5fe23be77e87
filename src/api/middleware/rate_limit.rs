//! Admission control middleware backed by the process-wide token bucket

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::types::{Json, MessageResponse};
use crate::infrastructure::observability::record_rate_limited;
use crate::infrastructure::rate_limit::TokenBucket;

/// Body returned when the bucket is empty
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded, try again later!";

/// Header carrying the whole tokens left after an admitted request
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Rejects requests with `429` once the bucket is empty
///
/// Rejected requests never reach the wrapped handler.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<TokenBucket>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let decision = limiter.check();

    if !decision.allowed {
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(|path| path.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());

        warn!(method = %request.method(), route = %route, "Rate limit exceeded");
        record_rate_limited(&route);

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MessageResponse::new(RATE_LIMIT_MESSAGE)),
        )
            .into_response();

        if let Some(seconds) = decision.retry_after_secs() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }

        return response;
    }

    let mut response = next.run(request).await;
    response.headers_mut().insert(
        RATE_LIMIT_REMAINING_HEADER,
        HeaderValue::from(decision.remaining),
    );
    response
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    use super::*;
    use crate::infrastructure::rate_limit::RateLimitConfig;

    fn app(limiter: Arc<TokenBucket>, calls: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/guarded",
                get(move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        "ok"
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
    }

    fn get_request() -> Request<Body> {
        Request::builder().uri("/guarded").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_allowed_request_reports_remaining() {
        let limiter = Arc::new(TokenBucket::new(RateLimitConfig::new(0.001, 3)));
        let calls = Arc::new(AtomicUsize::new(0));

        let response = app(limiter, calls.clone()).oneshot(get_request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[RATE_LIMIT_REMAINING_HEADER], "2");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_request_never_reaches_handler() {
        let limiter = Arc::new(TokenBucket::new(RateLimitConfig::new(0.001, 1)));
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app(limiter, calls.clone());

        let first = app.clone().oneshot(get_request()).await.unwrap();
        let second = app.oneshot(get_request()).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let body = axum::body::to_bytes(second.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], RATE_LIMIT_MESSAGE);
    }
}
