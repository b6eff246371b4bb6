//! # Rate Limiter
//!
//! The handle request handlers hold: policy lookup, key building, and the
//! counter store behind one call.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  handler                                                                │
//! │    │  client_id_from_forwarded(x-forwarded-for)   "203.0.113.7"        │
//! │    │  endpoint                                    "coupon-validate"    │
//! │    ▼                                                                    │
//! │  RateLimiter::check_and_increment                                       │
//! │    ├── PolicyTable::policy_for(endpoint)          10 / 60 s            │
//! │    ├── key = "203.0.113.7:coupon-validate"                              │
//! │    └── RateLimitStore::check_and_increment                              │
//! │    ▼                                                                    │
//! │  allowed ? continue : 429 (or silent no-op for fire-and-forget routes) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Multiple Instances
//! Counters are process-local. Behind a load balancer with N instances a
//! client can make up to N × `max_requests` requests per window, one quota
//! per instance. This is accepted: the limiter protects each instance, it
//! does not meter clients globally. Plug a shared [`RateLimitStore`] in via
//! [`RateLimiter::with_store`] if a global limit is ever needed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{trace, warn};

use crate::config::GuardConfig;
use crate::policy::PolicyTable;
use crate::store::{MemoryStore, RateLimitDecision, RateLimitStore};

/// Client id used when no forwarded address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Builds the counter key for a client and endpoint.
pub fn rate_limit_key(client_id: &str, endpoint: &str) -> String {
    format!("{}:{}", client_id, endpoint)
}

/// Extracts the client id from an `X-Forwarded-For` header value.
///
/// The left-most address is the original client. A missing or blank header
/// maps every such caller to [`UNKNOWN_CLIENT`], so they share one quota.
pub fn client_id_from_forwarded(header: Option<&str>) -> String {
    header
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

// =============================================================================
// Rate Limiter
// =============================================================================

/// Cloneable limiter handle. Clones share the same counters.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    policies: Arc<PolicyTable>,
}

impl RateLimiter {
    /// Creates a limiter with a fresh in-memory store.
    pub fn new(policies: PolicyTable) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), policies)
    }

    pub fn with_store(store: Arc<dyn RateLimitStore>, policies: PolicyTable) -> Self {
        RateLimiter {
            store,
            policies: Arc::new(policies),
        }
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(config.policy_table())
    }

    /// Counts one request from `client_id` to `endpoint` at `now`.
    pub fn check_and_increment(
        &self,
        client_id: &str,
        endpoint: &str,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let policy = self.policies.policy_for(endpoint);
        let key = rate_limit_key(client_id, endpoint);
        let decision = self.store.check_and_increment(&key, policy, now);

        if decision.allowed {
            trace!(
                client = %client_id,
                endpoint = %endpoint,
                remaining = decision.remaining,
                "Request admitted"
            );
        } else {
            warn!(
                client = %client_id,
                endpoint = %endpoint,
                max_requests = policy.max_requests,
                window_ms = policy.window_ms,
                reset_at = %decision.reset_at,
                "Rate limit exceeded"
            );
        }

        decision
    }

    /// [`check_and_increment`](Self::check_and_increment) at the current time.
    pub fn check(&self, client_id: &str, endpoint: &str) -> RateLimitDecision {
        self.check_and_increment(client_id, endpoint, Utc::now())
    }

    /// Drops windows that ended before `now`.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.store.purge_expired(now)
    }

    pub fn store(&self) -> Arc<dyn RateLimitStore> {
        Arc::clone(&self.store)
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(PolicyTable::default())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("windows", &self.store.len())
            .field("policies", &self.policies)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RateLimitPolicy;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn tight() -> PolicyTable {
        PolicyTable::new(RateLimitPolicy::new(2, 1_000))
    }

    #[test]
    fn test_fixed_window_sequence() {
        let limiter = RateLimiter::new(tight());

        assert!(limiter.check_and_increment("1.2.3.4", "search", t0()).allowed);
        assert!(limiter.check_and_increment("1.2.3.4", "search", t0()).allowed);

        let third = limiter.check_and_increment("1.2.3.4", "search", t0());
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);

        let later = t0() + Duration::milliseconds(1_001);
        let reset = limiter.check_and_increment("1.2.3.4", "search", later);
        assert!(reset.allowed);
        assert_eq!(reset.remaining, 1);
    }

    #[test]
    fn test_endpoints_have_separate_quotas() {
        let limiter = RateLimiter::default();

        for _ in 0..10 {
            assert!(limiter.check_and_increment("c", "coupon-validate", t0()).allowed);
        }
        assert!(!limiter.check_and_increment("c", "coupon-validate", t0()).allowed);

        let search = limiter.check_and_increment("c", "search", t0());
        assert!(search.allowed);
        assert_eq!(search.remaining, 29);

        let other = limiter.check_and_increment("c", "checkout", t0());
        assert_eq!(other.remaining, 59);
    }

    #[test]
    fn test_clones_share_counters() {
        let limiter = RateLimiter::new(tight());
        let clone = limiter.clone();

        limiter.check_and_increment("c", "search", t0());
        clone.check_and_increment("c", "search", t0());
        assert!(!limiter.check_and_increment("c", "search", t0()).allowed);
    }

    #[test]
    fn test_separate_instances_multiply_the_limit() {
        // Two server instances, each with its own process-local counters.
        let instance_a = RateLimiter::new(tight());
        let instance_b = RateLimiter::new(tight());

        let admitted = (0..4)
            .map(|i| if i % 2 == 0 { &instance_a } else { &instance_b })
            .filter(|limiter| limiter.check_and_increment("c", "search", t0()).allowed)
            .count();

        assert_eq!(admitted, 4);
        assert!(!instance_a.check_and_increment("c", "search", t0()).allowed);
        assert!(!instance_b.check_and_increment("c", "search", t0()).allowed);
    }

    #[test]
    fn test_sweep() {
        let limiter = RateLimiter::new(tight());
        limiter.check_and_increment("a", "search", t0());
        limiter.check_and_increment("b", "search", t0() + Duration::milliseconds(900));

        assert_eq!(limiter.sweep(t0() + Duration::milliseconds(1_500)), 1);
        assert_eq!(limiter.store().len(), 1);
    }

    #[test]
    fn test_custom_store() {
        let store = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::with_store(store.clone(), tight());

        limiter.check_and_increment("c", "search", t0());
        assert_eq!(store.entry("c:search").unwrap().count, 1);
    }

    #[test]
    fn test_client_id_from_forwarded() {
        assert_eq!(client_id_from_forwarded(Some("203.0.113.7")), "203.0.113.7");
        assert_eq!(
            client_id_from_forwarded(Some(" 203.0.113.7 , 10.0.0.1")),
            "203.0.113.7"
        );
        assert_eq!(client_id_from_forwarded(Some("")), UNKNOWN_CLIENT);
        assert_eq!(client_id_from_forwarded(None), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_rate_limit_key() {
        assert_eq!(rate_limit_key("203.0.113.7", "search"), "203.0.113.7:search");
    }
}
