//! Word-of-day cache over the shared counter store.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tracing::warn;

use crate::{
    database::CounterStore, error::AppError, models::Word, search::WordRepository, selector,
};

/// Fixed cache key shared by every replica. The day it belongs to is
/// implicit in its TTL, which always lands on the next UTC midnight.
const CACHE_KEY: &str = "word_of_day";

#[derive(Clone)]
pub struct DailyWord<S, R> {
    store: S,
    repository: R,
}

impl<S: CounterStore, R: WordRepository> DailyWord<S, R> {
    pub fn new(store: S, repository: R) -> Self {
        Self { store, repository }
    }

    /// Serves today's word, computing and caching it on a miss.
    ///
    /// No lock or single-flight guards the recompute: concurrent misses all
    /// run the deterministic selection for the same day and write identical
    /// entries, so the race is idempotent. If selection ever stops being
    /// deterministic, single-flight becomes mandatory here.
    pub async fn word_of_day(&self) -> Result<Word, AppError> {
        match self.store.get_bytes(CACHE_KEY).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Word>(&bytes) {
                Ok(mut word) => {
                    word.sanitize();
                    return Ok(word);
                }
                Err(e) => warn!("Discarding undecodable cached word: {e}"),
            },
            Ok(None) => {}
            // A failing cache degrades to recomputing every request.
            Err(e) => warn!("Cache read failed, recomputing word of day: {e}"),
        }

        let count = self.repository.count().await?;
        if count == 0 {
            return Err(AppError::EmptyPopulation);
        }

        let now = Utc::now();
        let offset = selector::select(&day_key(now), count)?;

        let mut word = self
            .repository
            .fetch_at_offset(offset)
            .await?
            .ok_or_else(|| AppError::repository(format!("no word at offset {offset}")))?;
        word.sanitize();

        match serde_json::to_vec(&word) {
            Ok(bytes) => {
                // Expiry lands on the next UTC midnight, not 24h from now:
                // the entry must not outlive the day it was selected for.
                let ttl = Duration::from_secs(seconds_until_tomorrow(now));

                if let Err(e) = self.store.set_bytes(CACHE_KEY, &bytes, ttl).await {
                    warn!("Failed to cache word of day: {e}");
                }
            }
            Err(e) => warn!("Failed to serialize word of day: {e}"),
        }

        Ok(word)
    }
}

/// Calendar date in UTC, e.g. `2024-01-01`. Recomputed on every access and
/// never stored; UTC so replicas in different zones agree on the day.
pub fn day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Seconds left until the next UTC midnight, never less than one.
pub fn seconds_until_tomorrow(now: DateTime<Utc>) -> u64 {
    let tomorrow = now.date_naive() + Days::new(1);
    let midnight = tomorrow.and_time(NaiveTime::MIN).and_utc();

    (midnight - now).num_seconds().max(1) as u64
}
