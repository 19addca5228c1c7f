use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue, RETRY_AFTER};
use actix_web::http::StatusCode;
use actix_web::{Error, HttpResponse};
use dashmap::DashMap;
use futures::future::{ok, Ready};
use futures::Future;
use log::debug;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

use super::request_id::{RequestId, REQUEST_ID_HEADER};
use crate::response::ErrorResponse;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_duration: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: usize, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_duration: Duration::from_secs(window_seconds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { limit: usize, remaining: usize },
    Limited { limit: usize, retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: usize,
}

/// Fixed-window request counter keyed by client address.
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_seconds: u64) -> Self {
        Self {
            windows: DashMap::new(),
            config: RateLimitConfig::new(max_requests, window_seconds),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let window = self.config.window_duration;
        let limit = self.config.max_requests;

        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window { started: now, count: 0 });

        if now.duration_since(entry.started) >= window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count < limit {
            entry.count += 1;
            RateLimitDecision::Allowed {
                limit,
                remaining: limit - entry.count,
            }
        } else {
            RateLimitDecision::Limited {
                limit,
                retry_after: window.saturating_sub(now.duration_since(entry.started)),
            }
        }
    }

    /// Drops windows that have fully elapsed.
    pub fn purge_expired(&self, now: Instant) {
        let window = self.config.window_duration;
        self.windows.retain(|_, w| now.duration_since(w.started) < window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Start a background task to clean up expired entries periodically
    pub fn start_cleanup_task(self: &Arc<Self>) {
        let limiter = Arc::clone(self);

        actix_web::rt::spawn(async move {
            let mut interval = interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                limiter.purge_expired(Instant::now());
                debug!("Rate limiter cleanup completed, {} active keys", limiter.tracked_clients());
            }
        });
    }
}

fn client_key(req: &ServiceRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

// Rate limiting middleware
pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    rate_limiter: Arc<RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let rate_limiter = self.rate_limiter.clone();

        Box::pin(async move {
            let client = client_key(&req);

            match rate_limiter.check(&client) {
                RateLimitDecision::Allowed { limit, remaining } => {
                    let mut res = service.call(req).await?;
                    let headers = res.headers_mut();
                    headers.insert(HeaderName::from_static(LIMIT_HEADER), HeaderValue::from(limit));
                    headers.insert(HeaderName::from_static(REMAINING_HEADER), HeaderValue::from(remaining));
                    Ok(res.map_into_boxed_body())
                }
                RateLimitDecision::Limited { limit, retry_after } => {
                    debug!("Rate limit exceeded for {} {} from {}", req.method(), req.path(), client);
                    sentry::capture_message(
                        &format!("Rate limit exceeded for {} {} from {}", req.method(), req.path(), client),
                        sentry::Level::Warning,
                    );

                    // Round up so clients never retry inside the same window
                    let retry_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                    // Rejected before the request id layer runs
                    let id = RequestId::from_header(req.headers().get(REQUEST_ID_HEADER));
                    let response = HttpResponse::TooManyRequests()
                        .insert_header((RETRY_AFTER, retry_secs.to_string()))
                        .insert_header((REQUEST_ID_HEADER, id.0))
                        .insert_header((LIMIT_HEADER, limit.to_string()))
                        .insert_header((REMAINING_HEADER, "0"))
                        .json(ErrorResponse::new(
                            "Rate limit exceeded",
                            StatusCode::TOO_MANY_REQUESTS,
                        ));
                    let (http_req, _) = req.into_parts();
                    Ok(ServiceResponse::new(http_req, response))
                }
            }
        })
    }
}

pub struct RateLimitFactory {
    rate_limiter: Arc<RateLimiter>,
}

impl RateLimitFactory {
    pub fn new(rate_limiter: Arc<RateLimiter>) -> Self {
        Self { rate_limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitMiddleware {
            service: Rc::new(service),
            rate_limiter: self.rate_limiter.clone(),
        })
    }
}
