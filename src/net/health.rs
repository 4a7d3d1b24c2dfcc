//! Cached backend health query.
//!
//! A response stays fresh for `stale_after`; a failed fetch is retried once
//! before the error reaches the caller. Concurrent callers share one fetch.

#[cfg(test)]
#[path = "health_test.rs"]
mod health_test;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::api::ApiClient;
use super::error::ApiError;
use super::types::HealthResponse;

const RETRIES: u32 = 1;

struct Cached {
    fetched_at: Instant,
    response: HealthResponse,
}

pub struct HealthMonitor {
    api: Arc<ApiClient>,
    stale_after: Duration,
    cache: Mutex<Option<Cached>>,
}

impl HealthMonitor {
    #[must_use]
    pub fn new(api: Arc<ApiClient>, stale_after: Duration) -> Self {
        Self { api, stale_after, cache: Mutex::new(None) }
    }

    /// Return the cached health response, refetching when stale.
    ///
    /// # Errors
    ///
    /// Returns the last [`ApiError`] once the retry budget is spent. A failed
    /// refresh leaves any previous cached value in place.
    pub async fn current(&self) -> Result<HealthResponse, ApiError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if is_fresh(cached.fetched_at, Instant::now(), self.stale_after) {
                return Ok(cached.response.clone());
            }
        }

        let response = self.fetch_with_retry().await?;
        *cache = Some(Cached { fetched_at: Instant::now(), response: response.clone() });
        Ok(response)
    }

    /// Last successful response, fresh or stale.
    pub async fn last_known(&self) -> Option<HealthResponse> {
        self.cache.lock().await.as_ref().map(|cached| cached.response.clone())
    }

    /// Drop the cached value so the next [`current`](Self::current) refetches.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    async fn fetch_with_retry(&self) -> Result<HealthResponse, ApiError> {
        let mut attempt = 0;
        loop {
            match self.api.health().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < RETRIES => {
                    attempt += 1;
                    tracing::debug!(error = %e, attempt, "health fetch failed; retrying");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "health fetch failed");
                    return Err(e);
                }
            }
        }
    }
}

fn is_fresh(fetched_at: Instant, now: Instant, stale_after: Duration) -> bool {
    now.saturating_duration_since(fetched_at) < stale_after
}
