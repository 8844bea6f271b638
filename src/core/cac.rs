//! Daily cashback ledger (CAC tracking)
//!
//! Tracks the cashback a user has accumulated within one calendar day in
//! the service timezone, keyed `cac:{user_id}:{date}`. Entries only grow
//! within a day and expire at the day boundary. Additions go through the
//! store's atomic increment, so concurrent adds for the same user never
//! under- or double-count.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, Local, TimeZone};
use tracing::warn;

use crate::store::{self, keys, KeyValueStore};
use crate::types::LedgerError;

/// Per-user daily cashback accumulation
pub struct CacLedger {
    store: Arc<dyn KeyValueStore>,
}

impl CacLedger {
    /// Create a ledger over the given store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cashback accumulated by `user_id` on `date`
    ///
    /// Degrades to 0 with a warning on store failure or timeout; the caller
    /// still gets a usable decision input.
    pub async fn get_used(
        &self,
        user_id: &str,
        date: chrono::NaiveDate,
        timeout: Duration,
    ) -> u64 {
        let key = keys::daily_cac(user_id, date);
        match store::get_with_timeout(self.store.as_ref(), &key, timeout).await {
            Ok(Some(raw)) => match raw.parse::<i64>() {
                Ok(used) => used.max(0) as u64,
                Err(_) => {
                    warn!(key = %key, value = %raw, "unparseable CAC value, treating as 0");
                    0
                }
            },
            Ok(None) => 0,
            Err(e) => {
                warn!(key = %key, error = %e, "CAC read failed, degrading to 0");
                0
            }
        }
    }

    /// Cashback still grantable under `limit` given `used`
    pub fn remaining(used: u64, limit: u64) -> u64 {
        limit.saturating_sub(used)
    }

    /// Atomically add `delta` rupees to the day's accumulation
    ///
    /// The entry's TTL is (re)set to `ttl`, which callers compute to the end
    /// of the service day. Returns the new accumulated value.
    ///
    /// # Errors
    ///
    /// A negative `delta` is a programming error and is rejected as
    /// [`LedgerError::NegativeDelta`] without touching the store. Store
    /// failures surface as [`LedgerError::Store`] for the caller to absorb.
    pub async fn add(
        &self,
        user_id: &str,
        date: chrono::NaiveDate,
        delta: i64,
        ttl: Duration,
    ) -> Result<i64, LedgerError> {
        if delta < 0 {
            return Err(LedgerError::NegativeDelta {
                user_id: user_id.to_string(),
                delta,
            });
        }
        let key = keys::daily_cac(user_id, date);
        Ok(self.store.incrby(&key, delta, ttl).await?)
    }

    /// Seconds from `now` to the next local midnight, floored at 1 second
    ///
    /// Used as the ledger entry TTL so the accumulation expires exactly at
    /// the day boundary. Falls back to 24 hours on pathological local-time
    /// transitions.
    pub fn ttl_to_midnight(now: DateTime<Local>) -> Duration {
        let next_midnight = now
            .date_naive()
            .checked_add_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|naive| Local.from_local_datetime(&naive).earliest());

        match next_midnight {
            Some(midnight) => {
                let secs = (midnight - now).num_seconds().max(1);
                Duration::from_secs(secs as u64)
            }
            None => Duration::from_secs(86_400),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use rstest::rstest;

    const TIMEOUT: Duration = Duration::from_millis(500);
    const TTL: Duration = Duration::from_secs(60);

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
    }

    #[rstest]
    #[case::untouched(0, 200, 200)]
    #[case::partial(150, 200, 50)]
    #[case::at_limit(200, 200, 0)]
    #[case::beyond_limit(250, 200, 0)]
    fn test_remaining(#[case] used: u64, #[case] limit: u64, #[case] expected: u64) {
        assert_eq!(CacLedger::remaining(used, limit), expected);
    }

    #[tokio::test]
    async fn test_get_used_absent_is_zero() {
        let ledger = CacLedger::new(Arc::new(MemoryStore::new()));
        assert_eq!(ledger.get_used("u-1", date(), TIMEOUT).await, 0);
    }

    #[tokio::test]
    async fn test_add_accumulates_within_the_day() {
        let store = Arc::new(MemoryStore::new());
        let ledger = CacLedger::new(Arc::clone(&store) as _);

        assert_eq!(ledger.add("u-1", date(), 10, TTL).await.unwrap(), 10);
        assert_eq!(ledger.add("u-1", date(), 5, TTL).await.unwrap(), 15);
        assert_eq!(ledger.get_used("u-1", date(), TIMEOUT).await, 15);
    }

    #[tokio::test]
    async fn test_days_are_independent() {
        let store = Arc::new(MemoryStore::new());
        let ledger = CacLedger::new(Arc::clone(&store) as _);
        let next_day = date().succ_opt().unwrap();

        ledger.add("u-1", date(), 100, TTL).await.unwrap();

        assert_eq!(ledger.get_used("u-1", next_day, TIMEOUT).await, 0);
        assert_eq!(ledger.get_used("u-1", date(), TIMEOUT).await, 100);
    }

    #[tokio::test]
    async fn test_negative_delta_rejected_without_store_write() {
        let store = Arc::new(MemoryStore::new());
        let ledger = CacLedger::new(Arc::clone(&store) as _);

        let result = ledger.add("u-1", date(), -5, TTL).await;
        assert!(matches!(
            result,
            Err(LedgerError::NegativeDelta { delta: -5, .. })
        ));
        assert_eq!(ledger.get_used("u-1", date(), TIMEOUT).await, 0);
    }

    #[tokio::test]
    async fn test_zero_delta_is_accepted() {
        let ledger = CacLedger::new(Arc::new(MemoryStore::new()));
        assert_eq!(ledger.add("u-1", date(), 0, TTL).await.unwrap(), 0);
    }

    #[test]
    fn test_ttl_to_midnight_is_bounded() {
        let ttl = CacLedger::ttl_to_midnight(Local::now());
        assert!(ttl >= Duration::from_secs(1));
        // Never more than a day plus a DST hour
        assert!(ttl <= Duration::from_secs(25 * 3_600));
    }

    #[test]
    fn test_ttl_to_midnight_near_day_boundary() {
        let late = Local
            .with_ymd_and_hms(2026, 8, 24, 23, 59, 30)
            .single()
            .unwrap();
        let ttl = CacLedger::ttl_to_midnight(late);
        assert_eq!(ttl, Duration::from_secs(30));
    }
}
