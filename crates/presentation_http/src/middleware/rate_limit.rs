//! Rate limiting middleware
//!
//! Token bucket per client IP, applied only to the sign-in endpoints.

use std::{
    collections::HashMap,
    future::Future,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request},
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tower::{Layer, Service};
use tracing::warn;

use crate::error::ApiError;

/// Path prefix of every rate limited route
pub const AUTH_PATH_PREFIX: &str = "/v1/auth/";

/// Rate limiter configuration
#[derive(Clone, Debug)]
pub struct RateLimiterConfig {
    /// Maximum requests per minute and client; 0 disables limiting
    pub requests_per_minute: u32,
    /// Only paths starting with one of these are limited
    pub path_prefixes: Vec<String>,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 30,
            path_prefixes: vec![AUTH_PATH_PREFIX.to_string()],
        }
    }
}

impl RateLimiterConfig {
    pub const fn enabled(&self) -> bool {
        self.requests_per_minute > 0
    }
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(max_tokens: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_update: Instant::now(),
        }
    }

    fn try_consume(&mut self, tokens_per_second: f64, max_tokens: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = elapsed
            .mul_add(tokens_per_second, self.tokens)
            .min(max_tokens);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Buckets shared between the layer and the cleanup task
#[derive(Debug)]
pub struct RateLimiterState {
    buckets: RwLock<HashMap<IpAddr, TokenBucket>>,
    tokens_per_second: f64,
    max_tokens: f64,
}

impl RateLimiterState {
    #[must_use]
    pub fn new(requests_per_minute: u32) -> Self {
        let max_tokens = f64::from(requests_per_minute);
        Self {
            buckets: RwLock::new(HashMap::new()),
            tokens_per_second: max_tokens / 60.0,
            max_tokens,
        }
    }

    /// Take one token for `ip`; false when the bucket is empty
    #[allow(clippy::significant_drop_tightening)]
    pub async fn check(&self, ip: IpAddr) -> bool {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(self.max_tokens));
        bucket.try_consume(self.tokens_per_second, self.max_tokens)
    }

    /// Drop buckets untouched for longer than `older_than`
    pub async fn cleanup(&self, older_than: Duration) -> usize {
        let mut buckets = self.buckets.write().await;
        let cutoff = Instant::now()
            .checked_sub(older_than)
            .unwrap_or_else(Instant::now);

        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.last_update > cutoff);
        before - buckets.len()
    }

    pub async fn tracked_clients(&self) -> usize {
        self.buckets.read().await.len()
    }
}

/// Layer that applies rate limiting
#[derive(Clone, Debug)]
pub struct RateLimiterLayer {
    state: Arc<RateLimiterState>,
    enabled: bool,
    path_prefixes: Arc<[String]>,
}

impl RateLimiterLayer {
    #[must_use]
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self::with_state(
            config,
            Arc::new(RateLimiterState::new(config.requests_per_minute)),
        )
    }

    /// Build the layer on existing buckets
    #[must_use]
    pub fn with_state(config: &RateLimiterConfig, state: Arc<RateLimiterState>) -> Self {
        Self {
            state,
            enabled: config.enabled(),
            path_prefixes: config.path_prefixes.clone().into(),
        }
    }

    #[must_use]
    pub fn state(&self) -> Arc<RateLimiterState> {
        Arc::clone(&self.state)
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimiter {
            inner,
            state: Arc::clone(&self.state),
            enabled: self.enabled,
            path_prefixes: Arc::clone(&self.path_prefixes),
        }
    }
}

/// Middleware service for rate limiting
#[derive(Clone, Debug)]
pub struct RateLimiter<S> {
    inner: S,
    state: Arc<RateLimiterState>,
    enabled: bool,
    path_prefixes: Arc<[String]>,
}

impl<S> Service<Request> for RateLimiter<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let limited = self.enabled
            && self
                .path_prefixes
                .iter()
                .any(|p| req.uri().path().starts_with(p.as_str()));
        let state = Arc::clone(&self.state);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !limited {
                return inner.call(req).await;
            }

            let client_ip = extract_client_ip(&req);
            if state.check(client_ip).await {
                inner.call(req).await
            } else {
                warn!(client = %client_ip, path = %req.uri().path(), "Sign-in rate limit hit");
                Ok(ApiError::RateLimited.into_response())
            }
        })
    }
}

/// Peer address first, then the first `X-Forwarded-For` hop, then localhost
fn extract_client_ip(req: &Request) -> IpAddr {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip();
    }

    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|forwarded| forwarded.split(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::StatusCode,
        routing::{get, post},
    };
    use tower::ServiceExt;

    use super::*;

    async fn ok() -> &'static str {
        "ok"
    }

    fn router(rpm: u32) -> Router {
        let config = RateLimiterConfig {
            requests_per_minute: rpm,
            ..RateLimiterConfig::default()
        };
        Router::new()
            .route("/v1/auth/login", post(ok))
            .route("/v1/scenarios", get(ok))
            .layer(RateLimiterLayer::new(&config))
    }

    fn login(ip: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/auth/login")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn login_is_limited_after_burst() {
        let app = router(2);

        for _ in 0..2 {
            let response = app.clone().oneshot(login("10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.clone().oneshot(login("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn clients_have_separate_buckets() {
        let app = router(1);

        assert_eq!(
            app.clone().oneshot(login("10.0.0.1")).await.unwrap().status(),
            StatusCode::OK
        );
        assert_eq!(
            app.clone().oneshot(login("10.0.0.2")).await.unwrap().status(),
            StatusCode::OK
        );
        assert_eq!(
            app.clone().oneshot(login("10.0.0.1")).await.unwrap().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn other_paths_are_not_limited() {
        let app = router(1);
        for _ in 0..5 {
            let request = Request::builder()
                .uri("/v1/scenarios")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn zero_rpm_disables_limiting() {
        let app = router(0);
        for _ in 0..5 {
            let response = app.clone().oneshot(login("10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn connect_info_wins_over_forwarded_header() {
        let mut req = login("10.0.0.9");
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 4], 5000))));
        assert_eq!(
            extract_client_ip(&req),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 4))
        );
    }

    #[test]
    fn falls_back_to_localhost() {
        let req = Request::builder()
            .uri("/v1/auth/login")
            .header("x-forwarded-for", "not-an-ip")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_client_ip(&req), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn cleanup_removes_stale_buckets() {
        let state = RateLimiterState::new(10);
        state.check(IpAddr::V4(Ipv4Addr::LOCALHOST)).await;
        assert_eq!(state.tracked_clients().await, 1);

        assert_eq!(state.cleanup(Duration::from_secs(3600)).await, 0);
        assert_eq!(state.cleanup(Duration::ZERO).await, 1);
        assert_eq!(state.tracked_clients().await, 0);
    }
}
