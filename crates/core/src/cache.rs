//! Freshness-gated fetch cache.
//!
//! A [`FreshCache`] owns a single value. It serves the value while it is
//! younger than the TTL, refreshes it from upstream once it expires, and
//! falls back to the last good value (flagged stale) when the refresh
//! fails. A failed refresh never clears the slot.
//!
//! There is no single-flight: callers that observe an expired entry at the
//! same time each call upstream, and the last one to finish wins. The slot
//! lock is never held across the upstream call.

use crate::clock::Clock;
use crate::error::UpstreamError;
use crate::traits::Refresh;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Default freshness window shared by every cache in the relay.
pub const DEFAULT_TTL_MS: i64 = 5_000;

/// A value together with the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
    /// Always `fetched_at + ttl`, saturating at the latest representable time.
    pub expires_at: DateTime<Utc>,
}

impl<T> CachedValue<T> {
    pub fn new(value: T, fetched_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            fetched_at,
            expires_at: fetched_at
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Where a served value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheSource {
    /// Fetched from upstream during this call.
    Live,
    /// Fresh cache hit.
    Cache,
    /// Upstream failed; last known value returned.
    StaleCache,
}

/// A value handed out by [`FreshCache::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub value: T,
    /// `true` unless the value was fetched during this call.
    pub cached: bool,
    /// `true` when upstream failed and an expired value was returned.
    pub stale: bool,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Served<T> {
    fn live(entry: CachedValue<T>) -> Self {
        Self {
            value: entry.value,
            cached: false,
            stale: false,
            fetched_at: entry.fetched_at,
        }
    }

    fn hit(entry: CachedValue<T>) -> Self {
        Self {
            value: entry.value,
            cached: true,
            stale: false,
            fetched_at: entry.fetched_at,
        }
    }

    fn stale(entry: CachedValue<T>) -> Self {
        Self {
            value: entry.value,
            cached: true,
            stale: true,
            fetched_at: entry.fetched_at,
        }
    }

    pub fn source(&self) -> CacheSource {
        match (self.cached, self.stale) {
            (false, _) => CacheSource::Live,
            (true, false) => CacheSource::Cache,
            (true, true) => CacheSource::StaleCache,
        }
    }
}

/// Single-value cache with TTL freshness and stale fallback.
pub struct FreshCache<T> {
    name: String,
    ttl: Duration,
    /// Oldest age at which a stale value may still be served. `None` means
    /// the last good value is served for as long as upstream stays down.
    max_stale: Option<Duration>,
    clock: Arc<dyn Clock>,
    source: Arc<dyn Refresh<T>>,
    slot: Arc<RwLock<Option<CachedValue<T>>>>,
}

impl<T> FreshCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn Refresh<T>>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            ttl,
            max_stale: None,
            clock,
            source,
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// Bound how old a stale fallback may be.
    pub fn with_max_stale(mut self, max_stale: Option<Duration>) -> Self {
        self.max_stale = max_stale;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current entry, without refreshing.
    pub async fn peek(&self) -> Option<CachedValue<T>> {
        self.slot.read().await.clone()
    }

    /// Serve the cached value if fresh, otherwise refresh it.
    ///
    /// The refresh runs on its own task. If the caller is dropped while the
    /// upstream call is in flight, the call still completes and its result
    /// is stored for the next caller.
    pub async fn get(&self) -> Result<Served<T>, UpstreamError> {
        let now = self.clock.now();
        let previous = self.slot.read().await.clone();

        if let Some(entry) = &previous {
            if entry.is_fresh(now) {
                return Ok(Served::hit(entry.clone()));
            }
        }

        match self.spawn_refresh(previous.as_ref().map(|e| e.value.clone())).await {
            Ok(entry) => Ok(Served::live(entry)),
            Err(err) => match previous {
                Some(entry) if self.within_stale_ceiling(&entry, now) => {
                    warn!(
                        cache = %self.name,
                        error = %err,
                        age_ms = (now - entry.fetched_at).num_milliseconds(),
                        "Upstream refresh failed, serving stale value"
                    );
                    Ok(Served::stale(entry))
                }
                _ => Err(err),
            },
        }
    }

    async fn spawn_refresh(&self, previous: Option<T>) -> Result<CachedValue<T>, UpstreamError> {
        let name = self.name.clone();
        let ttl = self.ttl;
        let clock = self.clock.clone();
        let source = self.source.clone();
        let slot = self.slot.clone();

        let task = tokio::spawn(async move {
            let value = source.refresh(previous.as_ref()).await?;
            let entry = CachedValue::new(value, clock.now(), ttl);
            *slot.write().await = Some(entry.clone());
            debug!(cache = %name, "Refreshed from upstream");
            Ok::<_, UpstreamError>(entry)
        });

        match task.await {
            Ok(result) => result,
            Err(err) => Err(UpstreamError::UpstreamUnreachable(format!(
                "{}: refresh task failed: {err}",
                self.name
            ))),
        }
    }

    fn within_stale_ceiling(&self, entry: &CachedValue<T>, now: DateTime<Utc>) -> bool {
        match self.max_stale {
            Some(limit) => now - entry.fetched_at <= limit,
            None => true,
        }
    }
}
