use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use storefront_api::rate_limiter::{
    rate_limit_middleware, RateLimitBackend, RateLimitConfig, RateLimiter,
};
use tower::ServiceExt;

fn limited_router(max_requests: u32) -> Router {
    let limiter = Arc::new(RateLimiter::new(
        RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
            enable_headers: true,
        },
        RateLimitBackend::InMemory,
    ));

    Router::new()
        .route("/ping", get(|| async { "pong" }))
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ))
}

async fn ping(router: &Router, ip: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().uri("/ping");
    if let Some(ip) = ip {
        builder = builder.header("x-forwarded-for", ip);
    }
    router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn n_plus_first_request_is_denied_with_retry_after() {
    let router = limited_router(3);

    for _ in 0..3 {
        let response = ping(&router, Some("203.0.113.9")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let denied = ping(&router, Some("203.0.113.9")).await;
    assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = denied
        .headers()
        .get("Retry-After")
        .expect("Retry-After header on 429")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0);
}

#[tokio::test]
async fn a_different_client_in_the_same_window_is_allowed() {
    let router = limited_router(1);

    assert_eq!(ping(&router, Some("198.51.100.1")).await.status(), StatusCode::OK);
    assert_eq!(
        ping(&router, Some("198.51.100.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    // Other client, same instant
    assert_eq!(ping(&router, Some("198.51.100.2")).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn clients_without_headers_share_the_sentinel_key() {
    let router = limited_router(2);

    assert_eq!(ping(&router, None).await.status(), StatusCode::OK);
    assert_eq!(ping(&router, None).await.status(), StatusCode::OK);
    assert_eq!(
        ping(&router, None).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn allowed_responses_carry_rate_limit_headers() {
    let router = limited_router(5);

    let response = ping(&router, Some("192.0.2.4")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-RateLimit-Limit").unwrap(),
        &"5".parse::<axum::http::HeaderValue>().unwrap()
    );
    assert_eq!(
        response.headers().get("X-RateLimit-Remaining").unwrap(),
        &"4".parse::<axum::http::HeaderValue>().unwrap()
    );
}
