//! # Rate Limit Policies
//!
//! Per-endpoint `(max_requests, window_ms)` pairs.
//!
//! ## Built-in Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Endpoint           Max requests   Window                               │
//! │  ─────────────────  ────────────   ──────                               │
//! │  search                       30   60 s                                 │
//! │  zip-lookup                   20   60 s                                 │
//! │  coupon-validate              10   60 s                                 │
//! │  analytics                   120   60 s                                 │
//! │  newsletter                    5   1 h                                  │
//! │  contact                       5   1 h                                  │
//! │  social-feed                  30   60 s                                 │
//! │  (anything else)              60   60 s    ◄── DEFAULT_POLICY           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Longest window a policy may use (7 days).
pub const MAX_WINDOW_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Policy for endpoints without an entry of their own.
pub const DEFAULT_POLICY: RateLimitPolicy = RateLimitPolicy::new(60, 60_000);

const MINUTE_MS: u64 = 60_000;
const HOUR_MS: u64 = 60 * MINUTE_MS;

const BUILTIN_POLICIES: &[(&str, RateLimitPolicy)] = &[
    ("search", RateLimitPolicy::new(30, MINUTE_MS)),
    ("zip-lookup", RateLimitPolicy::new(20, MINUTE_MS)),
    ("coupon-validate", RateLimitPolicy::new(10, MINUTE_MS)),
    ("analytics", RateLimitPolicy::new(120, MINUTE_MS)),
    ("newsletter", RateLimitPolicy::new(5, HOUR_MS)),
    ("contact", RateLimitPolicy::new(5, HOUR_MS)),
    ("social-feed", RateLimitPolicy::new(30, MINUTE_MS)),
];

// =============================================================================
// Rate Limit Policy
// =============================================================================

/// At most `max_requests` per fixed window of `window_ms` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl RateLimitPolicy {
    pub const fn new(max_requests: u32, window_ms: u64) -> Self {
        RateLimitPolicy {
            max_requests,
            window_ms,
        }
    }

    /// Window length, capped at [`MAX_WINDOW_MS`].
    pub fn window(&self) -> Duration {
        // MAX_WINDOW_MS fits in i64
        Duration::milliseconds(self.window_ms.min(MAX_WINDOW_MS) as i64)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        DEFAULT_POLICY
    }
}

// =============================================================================
// Policy Table
// =============================================================================

/// Endpoint name → policy, with a fallback for unlisted endpoints.
///
/// `PolicyTable::default()` is the built-in table above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    default: RateLimitPolicy,
    endpoints: BTreeMap<String, RateLimitPolicy>,
}

impl PolicyTable {
    /// An empty table: every endpoint gets `default`.
    pub fn new(default: RateLimitPolicy) -> Self {
        PolicyTable {
            default,
            endpoints: BTreeMap::new(),
        }
    }

    /// Adds or replaces the policy for one endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>, policy: RateLimitPolicy) -> Self {
        self.endpoints.insert(endpoint.into(), policy);
        self
    }

    /// Replaces the fallback policy.
    pub fn with_default(mut self, default: RateLimitPolicy) -> Self {
        self.default = default;
        self
    }

    /// Policy applied to `endpoint`.
    pub fn policy_for(&self, endpoint: &str) -> RateLimitPolicy {
        self.endpoints
            .get(endpoint)
            .copied()
            .unwrap_or(self.default)
    }

    pub fn default_policy(&self) -> RateLimitPolicy {
        self.default
    }

    /// Endpoints with an explicit policy, in name order.
    pub fn endpoints(&self) -> impl Iterator<Item = (&str, RateLimitPolicy)> {
        self.endpoints
            .iter()
            .map(|(name, policy)| (name.as_str(), *policy))
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        BUILTIN_POLICIES
            .iter()
            .fold(PolicyTable::new(DEFAULT_POLICY), |table, (name, policy)| {
                table.with_endpoint(*name, *policy)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = PolicyTable::default();

        assert_eq!(table.policy_for("search"), RateLimitPolicy::new(30, 60_000));
        assert_eq!(table.policy_for("coupon-validate"), RateLimitPolicy::new(10, 60_000));
        assert_eq!(table.policy_for("newsletter"), RateLimitPolicy::new(5, 3_600_000));
        assert_eq!(table.endpoints().count(), 7);
    }

    #[test]
    fn test_unlisted_endpoint_uses_default() {
        let table = PolicyTable::default();
        assert_eq!(table.policy_for("checkout"), DEFAULT_POLICY);
        assert_eq!(DEFAULT_POLICY, RateLimitPolicy::new(60, 60_000));
    }

    #[test]
    fn test_overrides() {
        let table = PolicyTable::default()
            .with_endpoint("search", RateLimitPolicy::new(100, 1_000))
            .with_default(RateLimitPolicy::new(1, 1_000));

        assert_eq!(table.policy_for("search"), RateLimitPolicy::new(100, 1_000));
        assert_eq!(table.policy_for("checkout"), RateLimitPolicy::new(1, 1_000));
        assert_eq!(table.policy_for("contact"), RateLimitPolicy::new(5, 3_600_000));
    }

    #[test]
    fn test_window_is_capped() {
        assert_eq!(RateLimitPolicy::new(1, 1_500).window(), Duration::milliseconds(1_500));
        assert_eq!(
            RateLimitPolicy::new(1, u64::MAX).window(),
            Duration::milliseconds(MAX_WINDOW_MS as i64)
        );
    }
}
