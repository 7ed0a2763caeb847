use std::num::NonZeroU32;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use common::utils::config::AppConfig;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::{api_state::ApiState, error::ApiError};

/// Process-wide request quotas, one keyed limiter per route class.
/// Keys are client identities; governor's keyed state store is the only
/// state shared between concurrent requests.
pub struct RateGate {
    ingest: DefaultKeyedRateLimiter<String>,
    summary: DefaultKeyedRateLimiter<String>,
}

impl RateGate {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            ingest: RateLimiter::keyed(per_minute(config.ingest_rate_per_minute)),
            summary: RateLimiter::keyed(per_minute(config.summary_rate_per_minute)),
        }
    }

    pub fn check_ingest(&self, client: &str) -> bool {
        self.ingest.check_key(&client.to_owned()).is_ok()
    }

    pub fn check_summary(&self, client: &str) -> bool {
        self.summary.check_key(&client.to_owned()).is_ok()
    }
}

fn per_minute(requests: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN))
}

pub async fn ingest_rate_limit(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(&request);
    if !state.rate.check_ingest(&client) {
        return Err(ApiError::RateLimited(
            "ingest requests are limited per minute, try again shortly".to_owned(),
        ));
    }

    Ok(next.run(request).await)
}

pub async fn summary_rate_limit(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(&request);
    if !state.rate.check_summary(&client) {
        return Err(ApiError::RateLimited(
            "summary requests are limited per minute, try again shortly".to_owned(),
        ));
    }

    Ok(next.run(request).await)
}

/// Client identity for quota accounting: first forwarded hop, then the
/// reverse-proxy header, then a shared anonymous bucket.
fn client_key(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
        })
        .unwrap_or("anonymous")
        .to_owned()
}
