/*!
 * # Rate Limiting Module
 *
 * Fixed-window request limiting keyed by client address. Each request
 * increments a per-key counter for the current window; once the count
 * exceeds the configured maximum the request is rejected with 429 and a
 * `Retry-After` hint. Window-boundary bursts are accepted; this is a
 * fixed window, not a sliding one.
 *
 * Redis backs the counters so the limit holds across instances. When
 * Redis is unreachable the limiter falls back to an in-process map, and
 * a limiter error never rejects a request (fail open).
 */
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{Response, StatusCode},
    middleware::Next,
};
use dashmap::DashMap;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::warn;

/// Numeric strings contain only ASCII digits, which are always valid
/// header values.
fn num_to_header_value<T: ToString>(n: T) -> http::HeaderValue {
    http::HeaderValue::from_str(&n.to_string())
        .unwrap_or_else(|_| http::HeaderValue::from_static("0"))
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
struct WindowEntry {
    count: u32,
    window_start: Instant,
}

impl WindowEntry {
    fn new() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }

    fn tick(&mut self, window: Duration) -> u32 {
        let now = Instant::now();
        if now.duration_since(self.window_start) >= window {
            self.count = 1;
            self.window_start = now;
        } else {
            self.count += 1;
        }
        self.count
    }

    fn time_until_reset(&self, window: Duration) -> Duration {
        let elapsed = self.window_start.elapsed();
        if elapsed >= window {
            Duration::from_secs(0)
        } else {
            window - elapsed
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    pub enable_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            enable_headers: true,
        }
    }
}

#[derive(Clone)]
pub enum RateLimitBackend {
    InMemory,
    Redis {
        client: Arc<redis::Client>,
        namespace: String,
    },
}

impl Default for RateLimitBackend {
    fn default() -> Self {
        Self::InMemory
    }
}

#[derive(Clone)]
enum RateLimitStore {
    InMemory {
        entries: Arc<DashMap<String, WindowEntry>>,
    },
    Redis {
        client: Arc<redis::Client>,
        namespace: String,
        fallback: Arc<DashMap<String, WindowEntry>>,
    },
}

#[derive(Clone)]
pub struct RateLimiter {
    store: RateLimitStore,
    config: RateLimitConfig,
}

#[derive(Debug)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub retry_after: Duration,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, backend: RateLimitBackend) -> Self {
        let store = match backend {
            RateLimitBackend::InMemory => RateLimitStore::InMemory {
                entries: Arc::new(DashMap::new()),
            },
            RateLimitBackend::Redis { client, namespace } => RateLimitStore::Redis {
                client,
                namespace,
                fallback: Arc::new(DashMap::new()),
            },
        };

        Self { store, config }
    }

    pub fn in_memory(config: RateLimitConfig) -> Self {
        Self::new(config, RateLimitBackend::InMemory)
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Counts this request against `key` and reports whether it is allowed.
    pub async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        match &self.store {
            RateLimitStore::InMemory { entries } => {
                Ok(Self::check_in_memory(entries, key, &self.config))
            }
            RateLimitStore::Redis {
                client,
                namespace,
                fallback,
            } => match client.get_async_connection().await {
                Ok(mut conn) => {
                    match Self::check_with_redis(&mut conn, namespace, key, &self.config).await {
                        Ok(result) => Ok(result),
                        Err(err) => {
                            warn!("Redis rate limit error: {}", err);
                            Ok(Self::check_in_memory(fallback, key, &self.config))
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        "Failed to connect to Redis for rate limiting, using fallback: {}",
                        err
                    );
                    Ok(Self::check_in_memory(fallback, key, &self.config))
                }
            },
        }
    }

    fn check_in_memory(
        entries: &DashMap<String, WindowEntry>,
        key: &str,
        config: &RateLimitConfig,
    ) -> RateLimitResult {
        let mut entry = entries
            .entry(key.to_string())
            .or_insert_with(WindowEntry::new);

        let count = entry.tick(config.window);
        let retry_after = entry.time_until_reset(config.window);
        let allowed = count <= config.max_requests;

        RateLimitResult {
            allowed,
            limit: config.max_requests,
            remaining: config.max_requests.saturating_sub(count),
            retry_after,
        }
    }

    async fn check_with_redis<C>(
        conn: &mut C,
        namespace: &str,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, redis::RedisError>
    where
        C: redis::aio::ConnectionLike + Send,
    {
        let redis_key = format!("{}:{}", namespace, key);
        let limit = config.max_requests as i64;
        let window_secs = config.window.as_secs().max(1);

        let count: i64 = conn.incr(&redis_key, 1).await?;
        if count == 1 {
            let _: Result<(), _> = conn.expire(&redis_key, window_secs as usize).await;
        } else {
            // Repair a key that lost its expiry (e.g. after a partial failure)
            let ttl: i64 = conn.ttl(&redis_key).await.unwrap_or(-1);
            if ttl < 0 {
                let _: Result<(), _> = conn.expire(&redis_key, window_secs as usize).await;
            }
        }

        let ttl_secs = match conn.ttl::<_, i64>(&redis_key).await {
            Ok(ttl) if ttl > 0 => ttl as u64,
            _ => window_secs,
        };
        let allowed = count <= limit;
        let remaining = if allowed {
            config.max_requests.saturating_sub(count.max(0) as u32)
        } else {
            0
        };

        Ok(RateLimitResult {
            allowed,
            limit: config.max_requests,
            remaining,
            retry_after: Duration::from_secs(ttl_secs),
        })
    }

    /// Clears the counter for a key (used by tests and admin tooling).
    pub async fn reset(&self, key: &str) {
        match &self.store {
            RateLimitStore::InMemory { entries } => {
                entries.remove(key);
            }
            RateLimitStore::Redis {
                client,
                namespace,
                fallback,
            } => {
                let redis_key = format!("{}:{}", namespace, key);
                if let Ok(mut conn) = client.get_async_connection().await {
                    let _: Result<(), _> = conn.del(&redis_key).await;
                }
                fallback.remove(key);
            }
        }
    }
}

/// Derives the limiter key for a request: first `x-forwarded-for` entry,
/// then `x-real-ip`, then a sentinel.
pub fn extract_client_key(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                let trimmed = ip.trim();
                if !trimmed.is_empty() {
                    return format!("ip:{}", trimmed);
                }
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return format!("ip:{}", ip_str);
        }
    }

    "ip:unknown".to_string()
}

/// Axum middleware enforcing the per-client limit. Limiter failures let
/// the request through.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response<axum::body::Body> {
    let key = extract_client_key(&request);
    let enable_headers = limiter.config().enable_headers;

    match limiter.check(&key).await {
        Ok(result) => {
            if !result.allowed {
                warn!("Rate limit exceeded for key: {}", key);

                let mut response =
                    Response::new(axum::body::Body::from("Rate limit exceeded"));
                *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;

                let headers = response.headers_mut();
                headers.insert(
                    "Retry-After",
                    num_to_header_value(result.retry_after.as_secs().max(1)),
                );
                if enable_headers {
                    headers.insert("X-RateLimit-Limit", num_to_header_value(result.limit));
                    headers.insert("X-RateLimit-Remaining", num_to_header_value(0));
                }

                return response;
            }

            let mut response = next.run(request).await;

            if enable_headers {
                let headers = response.headers_mut();
                headers.insert("X-RateLimit-Limit", num_to_header_value(result.limit));
                headers.insert(
                    "X-RateLimit-Remaining",
                    num_to_header_value(result.remaining),
                );
            }

            response
        }
        Err(e) => {
            warn!("Rate limiter error, failing open: {}", e);
            next.run(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_limiter(max: u32) -> RateLimiter {
        RateLimiter::in_memory(RateLimitConfig {
            max_requests: max,
            window: Duration::from_secs(60),
            enable_headers: true,
        })
    }

    #[tokio::test]
    async fn allows_up_to_limit_then_denies() {
        let limiter = small_limiter(3);

        for _ in 0..3 {
            let result = limiter.check("ip:1.2.3.4").await.unwrap();
            assert!(result.allowed);
        }

        let denied = limiter.check("ip:1.2.3.4").await.unwrap();
        assert!(!denied.allowed);
        assert!(denied.retry_after > Duration::from_secs(0));
    }

    #[tokio::test]
    async fn different_keys_are_independent() {
        let limiter = small_limiter(1);

        assert!(limiter.check("ip:1.1.1.1").await.unwrap().allowed);
        assert!(!limiter.check("ip:1.1.1.1").await.unwrap().allowed);
        // A different client in the same window is unaffected
        assert!(limiter.check("ip:2.2.2.2").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn window_expiry_resets_the_counter() {
        let limiter = RateLimiter::in_memory(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_millis(30),
            enable_headers: true,
        });

        assert!(limiter.check("ip:9.9.9.9").await.unwrap().allowed);
        assert!(!limiter.check("ip:9.9.9.9").await.unwrap().allowed);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(limiter.check("ip:9.9.9.9").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn reset_clears_the_key() {
        let limiter = small_limiter(1);
        assert!(limiter.check("ip:5.5.5.5").await.unwrap().allowed);
        assert!(!limiter.check("ip:5.5.5.5").await.unwrap().allowed);
        limiter.reset("ip:5.5.5.5").await;
        assert!(limiter.check("ip:5.5.5.5").await.unwrap().allowed);
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_client_key(&request), "ip:203.0.113.7");
    }

    #[test]
    fn client_key_falls_back_to_real_ip_then_sentinel() {
        let request = Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_client_key(&request), "ip:198.51.100.2");

        let bare = Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(extract_client_key(&bare), "ip:unknown");
    }
}
