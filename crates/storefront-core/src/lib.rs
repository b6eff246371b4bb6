//! # storefront-core: Pure Business Logic for the Storefront
//!
//! This crate holds the inventory and discount rules shared by the storefront
//! and the back-office. Everything here is a pure function over plain data.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Storefront Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Request handlers (product page, checkout)           │   │
//! │  │    read document ──► call core ──► return JSON payload          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  ingest   │  │   stock   │  │  coupon   │  │   money   │  │   │
//! │  │   │  coerce   │─►│ StockView │  │ evaluate  │─►│   Money   │  │   │
//! │  │   │  defaults │  │  report   │  │ lifecycle │  │  rounding │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`stock`] - Variant stock resolution with per-color / flat fallback
//! - [`coupon`] - Coupon validation and discount calculation
//! - [`ingest`] - Coerce-or-default conversion of raw documents
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use storefront_core::coupon::{evaluate_coupon, Coupon, CouponOutcome, DiscountType};
//! use storefront_core::money::Money;
//!
//! let coupon = Coupon::new("save10", DiscountType::Percentage, 10.0, Utc::now())
//!     .unwrap()
//!     .with_max_discount(5.0);
//!
//! let outcome = evaluate_coupon(Some(&coupon), Money::from_cents(10_000), Utc::now());
//! assert_eq!(outcome, CouponOutcome::Valid { discount: Money::from_cents(500) });
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coupon;
pub mod error;
pub mod ingest;
pub mod money;
pub mod stock;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use coupon::{
    check_coupon, evaluate_coupon, find_coupon, Coupon, CouponOutcome, CouponRejection,
    CouponResponse, DiscountType,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use stock::{ColorSizeStock, ProductStock, SizeStock, StockReport, StockView};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a coupon code after normalization.
pub const MAX_COUPON_CODE_LEN: usize = 32;

/// Total stock at or below which a product counts as "low stock" when the
/// product document carries no threshold of its own.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
