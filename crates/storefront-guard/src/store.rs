//! # Counter Store
//!
//! Fixed-window counters keyed by `client:endpoint`.
//!
//! ## Fixed Window Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check_and_increment(key, policy, now)                                  │
//! │                                                                         │
//! │  no entry, or now > reset_at                                           │
//! │      ──► entry = { count: 1, reset_at: now + window }                  │
//! │          allowed, remaining = max - 1                                  │
//! │                                                                         │
//! │  otherwise count += 1                                                  │
//! │      count <= max ──► allowed, remaining = max - count                 │
//! │      count >  max ──► rejected, remaining = 0                          │
//! │                      (the attempt stays counted)                       │
//! │                                                                         │
//! │   t=0        t=window        t=2·window                                │
//! │   ├────────────┼───────────────┤                                       │
//! │   │ count 1..N │ count resets  │   no sliding, no token refill         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::RateLimitPolicy;

// =============================================================================
// Decision
// =============================================================================

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// When the current window ends.
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up, for a
    /// `Retry-After` header.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> i64 {
        let ms = (self.reset_at - now).num_milliseconds().max(0);
        (ms + 999) / 1000
    }
}

// =============================================================================
// Store Trait
// =============================================================================

/// Storage for window counters.
///
/// [`MemoryStore`] keeps them in process memory. A deployment running
/// several instances can put a shared store behind this trait without
/// touching call sites.
pub trait RateLimitStore: Send + Sync {
    /// Counts one request against `key` and decides whether it is allowed.
    fn check_and_increment(
        &self,
        key: &str,
        policy: RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision;

    /// Drops every window that ended before `now`. Returns how many.
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;

    /// Number of live windows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Memory Store
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

/// Process-local counter store.
///
/// One mutex guards every read-modify-write, so concurrent requests for the
/// same key never lose an increment. The sweeper takes the same lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current window for `key`, if any.
    pub fn entry(&self, key: &str) -> Option<WindowEntry> {
        self.lock().get(key).copied()
    }

    // Every mutation is a single insert or field write; a poisoned map is
    // still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, WindowEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RateLimitStore for MemoryStore {
    fn check_and_increment(
        &self,
        key: &str,
        policy: RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let mut entries = self.lock();

        if let Some(entry) = entries.get_mut(key) {
            if now <= entry.reset_at {
                entry.count = entry.count.saturating_add(1);

                return if entry.count > policy.max_requests {
                    RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_at: entry.reset_at,
                    }
                } else {
                    RateLimitDecision {
                        allowed: true,
                        remaining: policy.max_requests - entry.count,
                        reset_at: entry.reset_at,
                    }
                };
            }
        }

        let reset_at = now.checked_add_signed(policy.window()).unwrap_or(now);
        entries.insert(key.to_string(), WindowEntry { count: 1, reset_at });

        RateLimitDecision {
            allowed: true,
            remaining: policy.max_requests.saturating_sub(1),
            reset_at,
        }
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.reset_at >= now);
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn at(ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(ms)
    }

    #[test]
    fn test_third_request_in_window_rejected() {
        let store = MemoryStore::new();
        let policy = RateLimitPolicy::new(2, 1_000);

        let first = store.check_and_increment("1.2.3.4:search", policy, at(0));
        let second = store.check_and_increment("1.2.3.4:search", policy, at(10));
        let third = store.check_and_increment("1.2.3.4:search", policy, at(20));

        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        assert_eq!(third.reset_at, at(1_000));
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let store = MemoryStore::new();
        let policy = RateLimitPolicy::new(2, 1_000);

        store.check_and_increment("k", policy, at(0));
        let decision = store.check_and_increment("k", policy, at(1_001));

        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
        assert_eq!(decision.reset_at, at(2_001));
        assert_eq!(store.entry("k").unwrap().count, 1);
    }

    #[test]
    fn test_reset_instant_still_in_window() {
        let store = MemoryStore::new();
        let policy = RateLimitPolicy::new(1, 1_000);

        store.check_and_increment("k", policy, at(0));
        assert!(!store.check_and_increment("k", policy, at(1_000)).allowed);
    }

    #[test]
    fn test_rejected_attempts_stay_counted() {
        let store = MemoryStore::new();
        let policy = RateLimitPolicy::new(1, 1_000);

        for ms in [0, 1, 2, 3] {
            store.check_and_increment("k", policy, at(ms));
        }

        assert_eq!(store.entry("k").unwrap().count, 4);
        assert!(!store.check_and_increment("k", policy, at(500)).allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemoryStore::new();
        let policy = RateLimitPolicy::new(1, 1_000);

        assert!(store.check_and_increment("a:search", policy, at(0)).allowed);
        assert!(store.check_and_increment("b:search", policy, at(0)).allowed);
        assert!(store.check_and_increment("a:contact", policy, at(0)).allowed);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_purge_expired() {
        let store = MemoryStore::new();
        store.check_and_increment("short", RateLimitPolicy::new(5, 1_000), at(0));
        store.check_and_increment("long", RateLimitPolicy::new(5, 60_000), at(0));

        assert_eq!(store.purge_expired(at(1_000)), 0);
        assert_eq!(store.purge_expired(at(1_001)), 1);
        assert_eq!(store.len(), 1);
        assert!(store.entry("long").is_some());
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let policy = RateLimitPolicy::new(1_000, 60_000);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.check_and_increment("k", policy, t0());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.entry("k").unwrap().count, 400);
    }

    #[test]
    fn test_retry_after_secs() {
        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_at: at(1_500),
        };
        assert_eq!(decision.retry_after_secs(at(0)), 2);
        assert_eq!(decision.retry_after_secs(at(1_000)), 1);
        assert_eq!(decision.retry_after_secs(at(5_000)), 0);
    }

    #[test]
    fn test_decision_json() {
        let decision = RateLimitDecision {
            allowed: true,
            remaining: 4,
            reset_at: t0(),
        };
        let json = serde_json::to_value(decision).unwrap();
        assert_eq!(json["allowed"], true);
        assert_eq!(json["remaining"], 4);
        assert_eq!(json["resetAt"], "2024-03-01T09:00:00Z");
    }
}
