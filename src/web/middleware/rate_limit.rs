//! Login rate limiting.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

use crate::web::error::ApiError;

/// Per-IP rate limiter for the login endpoint.
pub struct LoginRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl LoginRateLimiter {
    /// Allow `requests_per_minute` login attempts per client IP.
    pub fn new(requests_per_minute: u32) -> Self {
        let quota =
            Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Check if a request from `ip` is allowed.
    pub fn check(&self, ip: &str) -> bool {
        self.limiter.check_key(&ip.to_string()).is_ok()
    }

    /// Forget clients whose quota has fully replenished.
    pub fn cleanup(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup();
            }
        });
    }
}

/// Extract client IP from request.
fn client_ip(req: &Request<Body>) -> String {
    // Take the first IP of a proxy chain.
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    if let Some(real_ip) = req
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
    {
        return real_ip.to_string();
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Rate limiting middleware for the login endpoint.
pub async fn login_rate_limit(
    State(limiter): State<Arc<LoginRateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);

    if !limiter.check(&ip) {
        tracing::warn!(ip = %ip, "Login rate limit exceeded");
        return ApiError::too_many_requests("Too many login attempts. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
