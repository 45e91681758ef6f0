//! Request admission and access logging.
//!
//! Nothing in this module records a query string. The restore form can be
//! submitted with the email in the URL, and identities stay out of the logs.

use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Instant};
use tracing::{error, info, info_span, warn, Span};

/// One limiter shared by every client.
pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const DEFAULT_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(60) {
    Some(n) => n,
    None => unreachable!(),
};

/// Admission control for the whole service.
#[derive(Clone)]
pub struct RateLimitState {
    limiter: Arc<GlobalLimiter>,
}

impl RateLimitState {
    /// Admit `requests_per_minute` requests; zero means the default of 60.
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(DEFAULT_PER_MINUTE);

        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        }
    }

    /// A limit high enough that tests never hit it.
    pub fn permissive() -> Self {
        Self::new(10_000)
    }

    /// Take one request slot. False once the quota is spent.
    pub fn admit(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

/// Turn away requests over the global limit with 429.
pub async fn rate_limit_middleware(
    State(limits): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !limits.admit() {
        warn!(path = %request.uri().path(), "Global rate limit exceeded");
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

/// Span for `TraceLayer`; the default one would carry the full URI.
pub fn request_span(request: &Request) -> Span {
    info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// One access log line per request, levelled by status class.
pub async fn access_log_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed = started.elapsed();

    match status {
        100..=399 => info!(%method, %path, status, ?elapsed, "Request served"),
        400..=499 => warn!(%method, %path, status, ?elapsed, "Request rejected"),
        _ => error!(%method, %path, status, ?elapsed, "Request failed"),
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_is_enforced() {
        let limits = RateLimitState::new(1);

        assert!(limits.admit());
        assert!(!limits.admit());
    }

    #[test]
    fn test_zero_quota_uses_default() {
        let limits = RateLimitState::new(0);

        assert!((0..60).all(|_| limits.admit()));
        assert!(!limits.admit());
    }

    #[test]
    fn test_clones_share_one_quota() {
        let limits = RateLimitState::new(1);
        let other = limits.clone();

        assert!(limits.admit());
        assert!(!other.admit());
    }
}
