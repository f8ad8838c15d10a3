//! Per-client rate limiting

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use boatyard_core::ratelimit::{Quota, RateLimitDecision};
use std::net::SocketAddr;

use super::types::RateLimitedResponse;
use super::SharedState;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Client identity: first `X-Forwarded-For` hop, else the peer address
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Count the request against its client's window; reject with 429 over quota
pub(crate) async fn rate_limit_middleware(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(limiter) = state.limiter.as_ref() else {
        return next.run(request).await;
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_id(request.headers(), peer);

    match limiter.check(&client) {
        RateLimitDecision::Allowed(quota) => {
            let mut response = next.run(request).await;
            insert_quota_headers(response.headers_mut(), &quota);
            response
        }
        RateLimitDecision::Limited {
            quota,
            retry_after_secs,
        } => {
            tracing::warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(RateLimitedResponse {
                    error: "Too many requests, please try again later.".to_string(),
                    retry_after: retry_after_secs,
                }),
            )
                .into_response();
            let headers = response.headers_mut();
            insert_quota_headers(headers, &quota);
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            response
        }
        RateLimitDecision::FailOpen => next.run(request).await,
    }
}

fn insert_quota_headers(headers: &mut HeaderMap, quota: &Quota) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(quota.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(quota.remaining));
}
