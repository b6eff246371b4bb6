//! # storefront-guard: Per-Client Request Throttling
//!
//! Bounds how often one client may call one storefront endpoint, using a
//! fixed-window counter held in process memory.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Rate Limiter Components                          │
//! │                                                                         │
//! │  GuardConfig (guard.toml + env)                                        │
//! │       │ policy_table()              │ sweep_interval()                  │
//! │       ▼                             ▼                                   │
//! │  ┌──────────────┐   Arc<dyn    ┌──────────────┐                        │
//! │  │ RateLimiter  │──RateLimit──►│ MemoryStore  │◄──── Sweeper task      │
//! │  │ (per request)│   Store>     │ Mutex<Map>   │      (every 300 s)     │
//! │  └──────────────┘              └──────────────┘                        │
//! │                                                                         │
//! │  One limiter per process, cloned into every handler.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`policy`] - Per-endpoint limits and the built-in table
//! - [`store`] - Counter store trait and the in-memory store
//! - [`limiter`] - The handle request handlers call
//! - [`sweeper`] - Background purge of expired windows
//! - [`config`] - TOML/env configuration
//! - [`error`] - Guard error types
//!
//! ## Usage
//!
//! ```rust
//! use storefront_guard::{GuardConfig, RateLimiter, Sweeper};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = GuardConfig::default();
//! let limiter = RateLimiter::from_config(&config);
//! let sweeper = Sweeper::for_limiter(&limiter, config.sweep_interval()).start();
//!
//! let decision = limiter.check("203.0.113.7", "coupon-validate");
//! assert!(decision.allowed);
//! assert_eq!(decision.remaining, 9);
//!
//! sweeper.shutdown().await.unwrap();
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod limiter;
pub mod policy;
pub mod store;
pub mod sweeper;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::GuardConfig;
pub use error::{GuardError, GuardResult};
pub use limiter::{client_id_from_forwarded, rate_limit_key, RateLimiter};
pub use policy::{PolicyTable, RateLimitPolicy, DEFAULT_POLICY};
pub use store::{MemoryStore, RateLimitDecision, RateLimitStore};
pub use sweeper::{Sweeper, SweeperHandle};
