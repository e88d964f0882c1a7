//! Rate limiting middleware.
//!
//! Two layers share one bucket table. `client_rate_limit_middleware` sits
//! in front of authentication and charges every request that fails to
//! authenticate to the client IP; once that bucket is empty the IP is
//! turned away before credentials are even looked at. `rate_limit_middleware`
//! sits behind authentication and limits per tenant. Admin callers (bypass
//! secret, disabled auth) share one bucket.
//!
//! Each quota refills `limit` requests per `rate_limit_window`. Buckets idle
//! long enough to be full again are dropped from the table.

use crate::auth::AuthContext;
use crate::config::ApiConfig;
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{
    clock::{Clock, DefaultClock},
    NotUntil, Quota, RateLimiter,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

type DirectRateLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, DefaultClock>;

const ADMIN_BUCKET: &str = "admin";

/// Key for rate limiting - either IP address or tenant ID.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum RateLimitKey {
    /// Unauthenticated request - keyed by IP address
    Ip(IpAddr),
    /// Authenticated request - keyed by tenant ID
    Tenant(String),
}

struct Bucket {
    limiter: DirectRateLimiter,
    /// Milliseconds since `RateLimitState::started`.
    last_seen_ms: AtomicU64,
    /// Zero when the key is not blocked.
    blocked_until_ms: AtomicU64,
}

impl Bucket {
    fn blocked_for(&self, now_ms: u64) -> Option<u64> {
        let until = self.blocked_until_ms.load(Ordering::Relaxed);
        (until > now_ms).then(|| (until - now_ms).div_ceil(1000).max(1))
    }
}

/// State for rate limiting middleware.
#[derive(Clone)]
pub struct RateLimitState {
    config: Arc<ApiConfig>,
    buckets: Arc<DashMap<RateLimitKey, Arc<Bucket>>>,
    started: Instant,
    next_eviction_ms: Arc<AtomicU64>,
}

impl RateLimitState {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config: Arc::new(config),
            buckets: Arc::new(DashMap::new()),
            started: Instant::now(),
            next_eviction_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    fn limit_for(&self, key: &RateLimitKey) -> u32 {
        match key {
            RateLimitKey::Ip(_) => self.config.rate_limit_unauthenticated,
            RateLimitKey::Tenant(_) => self.config.rate_limit_authenticated,
        }
    }

    /// `limit` requests per `rate_limit_window`, with `rate_limit_burst`
    /// available at once.
    pub fn quota(&self, limit: u32) -> Quota {
        let limit = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.config.rate_limit_burst).unwrap_or(NonZeroU32::MIN);
        Quota::with_period(self.config.rate_limit_window / limit.get())
            .unwrap_or_else(|| Quota::per_minute(limit))
            .allow_burst(burst)
    }

    /// How long a bucket must sit unused before it is indistinguishable
    /// from a fresh one.
    fn idle_ttl(&self) -> Duration {
        let slowest = self
            .config
            .rate_limit_unauthenticated
            .min(self.config.rate_limit_authenticated);
        let quota = self.quota(slowest);
        (quota.replenish_interval() * quota.burst_size().get()).max(self.config.rate_limit_window)
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn bucket(&self, key: &RateLimitKey) -> Arc<Bucket> {
        self.maybe_evict();
        let now = self.now_ms();
        let bucket = self
            .buckets
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(Bucket {
                    limiter: RateLimiter::direct(self.quota(self.limit_for(key))),
                    last_seen_ms: AtomicU64::new(now),
                    blocked_until_ms: AtomicU64::new(0),
                })
            })
            .clone();
        bucket.last_seen_ms.store(now, Ordering::Relaxed);
        bucket
    }

    /// Run `evict_idle` at most once per idle period.
    fn maybe_evict(&self) {
        let now = self.now_ms();
        let due = self.next_eviction_ms.load(Ordering::Relaxed);
        if now < due {
            return;
        }
        let next = now.saturating_add(duration_ms(self.idle_ttl()));
        if self
            .next_eviction_ms
            .compare_exchange(due, next, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            self.evict_idle();
        }
    }

    /// Drop buckets that have been idle for a full refill period.
    pub fn evict_idle(&self) {
        let now = self.now_ms();
        let ttl = duration_ms(self.idle_ttl());
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| {
            now.saturating_sub(bucket.last_seen_ms.load(Ordering::Relaxed)) < ttl
                || bucket.blocked_for(now).is_some()
        });
        let evicted = before.saturating_sub(self.buckets.len());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.buckets.len(), "Evicted idle rate limit buckets");
        }
    }

    /// Number of keys currently holding a bucket.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    /// Client address. Forwarding headers are only honoured when the
    /// server is configured to sit behind a trusted proxy.
    fn client_ip(&self, request: &Request) -> IpAddr {
        if self.config.trust_proxy {
            if let Some(ip) = forwarded_ip(request) {
                return ip;
            }
        }
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }

    fn rate_limit_key(&self, request: &Request) -> RateLimitKey {
        match request.extensions().get::<AuthContext>() {
            Some(auth) => RateLimitKey::Tenant(
                auth.tenant_id
                    .clone()
                    .unwrap_or_else(|| ADMIN_BUCKET.to_string()),
            ),
            None => RateLimitKey::Ip(self.client_ip(request)),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn retry_after(not_until: &NotUntil<<DefaultClock as Clock>::Instant>) -> Duration {
    not_until.wait_time_from(DefaultClock::default().now())
}

/// Rejection carrying the wait before the next allowed request.
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut response = ApiError::too_many_requests(Some(self.retry_after)).into_response();
        response.headers_mut().insert(
            HeaderName::from_static("retry-after"),
            HeaderValue::from_str(&self.retry_after.to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("60")),
        );
        response
    }
}

/// First address in `X-Forwarded-For`, else `X-Real-IP`.
fn forwarded_ip(request: &Request) -> Option<IpAddr> {
    let header = |name: &str| request.headers().get(name).and_then(|h| h.to_str().ok());

    header("x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| header("x-real-ip").and_then(|value| value.trim().parse().ok()))
}

/// Per-IP limit on requests that fail authentication. Runs outside the
/// auth layer.
pub async fn client_rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    if !state.config.rate_limit_enabled {
        return Ok(next.run(request).await);
    }

    let key = RateLimitKey::Ip(state.client_ip(&request));
    let bucket = state.bucket(&key);
    if let Some(retry_after) = bucket.blocked_for(state.now_ms()) {
        tracing::warn!(key = ?key, retry_after, "Rate limit exceeded");
        return Err(RateLimitError { retry_after });
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::UNAUTHORIZED {
        return Ok(response);
    }

    match bucket.limiter.check() {
        Ok(_) => Ok(response),
        Err(not_until) => {
            let wait = retry_after(&not_until);
            bucket
                .blocked_until_ms
                .store(state.now_ms().saturating_add(duration_ms(wait).max(1)), Ordering::Relaxed);
            let retry_after = wait.as_secs().max(1);
            tracing::warn!(key = ?key, retry_after, "Rate limit exceeded");
            Err(RateLimitError { retry_after })
        }
    }
}

/// Enforce the configured quota. Rejected requests get 429 with a
/// `Retry-After` header; allowed ones get `X-RateLimit-Limit`.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    if !state.config.rate_limit_enabled {
        return Ok(next.run(request).await);
    }

    let key = state.rate_limit_key(&request);
    let bucket = state.bucket(&key);

    match bucket.limiter.check() {
        Ok(_) => {
            let mut response = next.run(request).await;
            response.headers_mut().insert(
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from_str(&state.limit_for(&key).to_string())
                    .unwrap_or_else(|_| HeaderValue::from_static("100")),
            );
            Ok(response)
        }
        Err(not_until) => {
            let retry_after = retry_after(&not_until).as_secs().max(1);
            tracing::warn!(key = ?key, retry_after, "Rate limit exceeded");
            Err(RateLimitError { retry_after })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn limited_app(config: ApiConfig) -> Router {
        Router::new()
            .route("/limited", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                RateLimitState::new(config),
                rate_limit_middleware,
            ))
    }

    fn proxied_config() -> ApiConfig {
        ApiConfig {
            trust_proxy: true,
            ..ApiConfig::default()
        }
    }

    fn request_from(ip: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri("/limited")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .expect("request should build")
    }

    fn connected_request(peer: &str, forwarded: &str) -> axum::http::Request<Body> {
        let mut request = request_from(forwarded);
        let addr: SocketAddr = peer.parse().expect("valid socket addr");
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[tokio::test]
    async fn test_burst_exhaustion_returns_429() {
        let config = ApiConfig {
            rate_limit_unauthenticated: 1,
            rate_limit_burst: 2,
            ..proxied_config()
        };
        let app = limited_app(config);

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(request_from("10.0.0.1"))
                .await
                .expect("request should complete");
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().contains_key("x-ratelimit-limit"));
        }

        let response = app
            .clone()
            .oneshot(request_from("10.0.0.1"))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));

        // Other clients keep their own bucket.
        let response = app
            .oneshot(request_from("10.0.0.2"))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_disabled_limiter_lets_everything_through() {
        let config = ApiConfig {
            rate_limit_enabled: false,
            rate_limit_unauthenticated: 1,
            rate_limit_burst: 1,
            ..ApiConfig::default()
        };
        let app = limited_app(config);
        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(request_from("10.0.0.1"))
                .await
                .expect("request should complete");
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn test_forwarded_for_takes_first_address() {
        let state = RateLimitState::new(proxied_config());
        let request = connected_request("192.0.2.1:4000", "203.0.113.7, 10.0.0.1");
        assert_eq!(
            state.client_ip(&request),
            "203.0.113.7".parse::<IpAddr>().expect("valid ip")
        );
    }

    #[test]
    fn test_forwarding_headers_ignored_without_trusted_proxy() {
        let state = RateLimitState::new(ApiConfig::default());
        let request = connected_request("192.0.2.1:4000", "203.0.113.7");
        assert_eq!(
            state.client_ip(&request),
            "192.0.2.1".parse::<IpAddr>().expect("valid ip")
        );
    }

    #[tokio::test]
    async fn test_spoofed_forwarded_for_shares_peer_bucket() {
        let config = ApiConfig {
            rate_limit_unauthenticated: 1,
            rate_limit_burst: 1,
            ..ApiConfig::default()
        };
        let app = limited_app(config);

        let response = app
            .clone()
            .oneshot(connected_request("192.0.2.1:4000", "10.0.0.1"))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(connected_request("192.0.2.1:4001", "10.0.0.2"))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_quota_spreads_limit_over_window() {
        let state = RateLimitState::new(ApiConfig {
            rate_limit_window: Duration::from_secs(10),
            rate_limit_burst: 3,
            ..ApiConfig::default()
        });
        let quota = state.quota(5);
        assert_eq!(quota.replenish_interval(), Duration::from_secs(2));
        assert_eq!(quota.burst_size().get(), 3);

        let per_minute = RateLimitState::new(ApiConfig::default()).quota(120);
        assert_eq!(per_minute.replenish_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_window_falls_back_to_per_minute() {
        let state = RateLimitState::new(ApiConfig {
            rate_limit_window: Duration::ZERO,
            ..ApiConfig::default()
        });
        assert_eq!(state.quota(60).replenish_interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_idle_buckets_are_evicted() {
        let state = RateLimitState::new(ApiConfig {
            rate_limit_window: Duration::from_millis(40),
            rate_limit_unauthenticated: 1,
            rate_limit_authenticated: 1,
            rate_limit_burst: 1,
            ..ApiConfig::default()
        });
        for i in 0..10u8 {
            state.bucket(&RateLimitKey::Ip(IpAddr::V4(Ipv4Addr::new(10, 0, 0, i))));
        }
        assert_eq!(state.tracked_keys(), 10);

        tokio::time::sleep(Duration::from_millis(80)).await;
        state.bucket(&RateLimitKey::Tenant("acme".to_string()));
        state.evict_idle();
        assert_eq!(state.tracked_keys(), 1);
    }
}
