//! Fixed-window request limiting per client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::error::AppError;
use crate::{metrics, AppState};

/// Header set by the fronting proxy with the real client address
pub const CLIENT_IP_HEADER: &str = "x-real-ip";

#[derive(Debug)]
struct WindowEntry {
    requests: u32,
    window_start: Instant,
}

/// Counts requests per client key within a fixed window.
#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            entries: DashMap::new(),
            window,
            max_requests,
        }
    }

    /// Count one request for `key`; false if the window is exhausted.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry {
                requests: 0,
                window_start: now,
            });

        if now.duration_since(entry.window_start) >= self.window {
            entry.requests = 0;
            entry.window_start = now;
        }

        if entry.requests >= self.max_requests {
            return false;
        }
        entry.requests += 1;
        true
    }

    /// Drop windows that have already expired
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| now.duration_since(entry.window_start) < self.window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }
}

/// Rate limiter middleware
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let client_ip = request
        .headers()
        .get(CLIENT_IP_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown");

    if !state.rate_limiter.check(client_ip) {
        tracing::warn!(client_ip, "request rate limit exceeded");
        ::metrics::counter!(metrics::HTTP_RATE_LIMITED).increment(1);
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}
