//! Fixed-window request rate limiting over the shared counter store.
//!
//! One counter per client identity, created by the first request in a
//! window and destroyed by expiry. The store's atomic INCR totally orders
//! requests sharing a window; the limiter itself holds nothing but its
//! store handle, so any number of instances enforce one shared budget.

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::{database::CounterStore, error::AppError, models::ApiResponse, state::SharedState};

pub const LIMIT: i64 = 100;
pub const WINDOW: Duration = Duration::from_secs(60);

const KEY_PREFIX: &str = "ratelimit:";

pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// Admission outcome for a single request. A denial is a normal outcome,
/// not an error; the store being unreachable is the error case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: i64 },
    Denied { reset_at: DateTime<Utc> },
}

#[derive(Clone)]
pub struct RateLimiter<S> {
    store: S,
}

impl<S: CounterStore> RateLimiter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Admission check for one request from `identity`.
    ///
    /// The increment happens before the limit check, so the counter counts
    /// rejected requests too; a client hammering past the limit keeps its
    /// window saturated.
    pub async fn admit(&self, identity: &str) -> Result<Decision, AppError> {
        let key = format!("{KEY_PREFIX}{identity}");

        // Fail closed: without a counter value there is no safe decision.
        let count = self
            .store
            .incr(&key)
            .await
            .map_err(AppError::LimiterUnavailable)?;

        if count == 1 {
            // Only the request that created the counter arms the expiry. A
            // crash between the increment and this call leaves a counter
            // with no TTL, locking the identity out until the key is
            // removed by hand.
            if let Err(e) = self.store.expire(&key, WINDOW).await {
                warn!("Failed to arm rate limit window for {key}: {e}");
            }
        }

        if count > LIMIT {
            // Approximate: the window actually ends when the key expires,
            // which can be up to a full window earlier than this.
            return Ok(Decision::Denied {
                reset_at: Utc::now() + WINDOW,
            });
        }

        Ok(Decision::Allowed {
            remaining: (LIMIT - count).max(0),
        })
    }
}

/// Admission gate in front of every API route, applied with
/// `middleware::from_fn_with_state`.
pub async fn rate_limit(
    State(state): State<SharedState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let identity = client_identity(request.headers(), peer);

    match state.limiter.admit(&identity).await {
        Ok(Decision::Allowed { remaining }) => {
            let mut response = next.run(request).await;

            let headers = response.headers_mut();
            headers.insert(HEADER_LIMIT, HeaderValue::from(LIMIT));
            headers.insert(HEADER_REMAINING, HeaderValue::from(remaining));

            response
        }
        Ok(Decision::Denied { reset_at }) => {
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ApiResponse::<()>::error(
                    "Rate limit exceeded. Try again in 1 minute.",
                )),
            )
                .into_response();

            let headers = response.headers_mut();
            headers.insert(HEADER_LIMIT, HeaderValue::from(LIMIT));
            headers.insert(HEADER_REMAINING, HeaderValue::from(0));
            headers.insert(HEADER_RESET, HeaderValue::from(reset_at.timestamp()));

            response
        }
        Err(err) => err.into_response(),
    }
}

/// The first forwarded address wins over the transport peer, so limits
/// follow the original client through proxies.
fn client_identity(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|client| client.trim().to_string())
        .filter(|client| !client.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}
