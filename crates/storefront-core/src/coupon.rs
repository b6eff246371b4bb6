//! # Coupon Module
//!
//! Decides whether a discount code applies to a cart and computes the
//! discount. Also carries the back-office lifecycle of a coupon record.
//!
//! ## Evaluation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      evaluate_coupon()                                  │
//! │                                                                         │
//! │  Checks run in order; the FIRST failure is the reason returned.        │
//! │                                                                         │
//! │  1. exists && is_active ──────── else NotFoundOrInactive               │
//! │  2. now >= starts_at ─────────── else NotYetActive                     │
//! │  3. now <= expires_at ────────── else Expired                          │
//! │  4. usage_count < usage_limit ── else UsageLimitReached                │
//! │  5. subtotal >= min_purchase ─── else MinimumPurchaseNotMet{minimum}   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Discount (in cents):                                                  │
//! │    Percentage: subtotal × value / 100, capped by max_discount          │
//! │    Fixed:      min(value, subtotal)                                    │
//! │    then rounded half-up to a whole cent                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejection is a value, never an error: handlers return
//! `reason.to_string()` to the shopper as-is.
//!
//! ## Usage
//! ```rust
//! use chrono::Utc;
//! use storefront_core::coupon::{evaluate_coupon, Coupon, CouponOutcome, DiscountType};
//! use storefront_core::money::Money;
//!
//! let coupon = Coupon::new("flat20", DiscountType::Fixed, 20.0, Utc::now()).unwrap();
//! let outcome = evaluate_coupon(Some(&coupon), Money::from_units(15.0), Utc::now());
//! assert_eq!(outcome.discount(), Some(Money::from_units(15.0)));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::{round_half_up, Money};
use crate::validation::{
    normalize_coupon_code, validate_coupon_window, validate_discount_value,
    validate_optional_amount, validate_uuid, ValidationResult,
};

// =============================================================================
// Discount Type
// =============================================================================

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the subtotal, 0 to 100.
    Percentage,
    /// `discount_value` is an amount in currency units.
    Fixed,
}

// =============================================================================
// Coupon Record
// =============================================================================

/// A discount code as stored in the coupons collection.
///
/// Amounts are currency units, the way the document store holds them. They
/// are converted to [`Money`] at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,

    /// Always stored upper-case.
    pub code: String,

    pub discount_type: DiscountType,

    pub discount_value: f64,

    #[serde(default)]
    pub min_purchase: Option<f64>,

    /// Cap on the discount amount. Only applies to percentage coupons.
    #[serde(default)]
    pub max_discount: Option<f64>,

    #[serde(default)]
    pub usage_limit: Option<u32>,

    #[serde(default)]
    pub usage_count: u32,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Creates an active, unrestricted coupon from back-office input.
    ///
    /// The code is normalized and the value checked against its type.
    pub fn new(
        code: &str,
        discount_type: DiscountType,
        discount_value: f64,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let code = normalize_coupon_code(code)?;
        validate_discount_value(discount_type, discount_value)?;

        Ok(Coupon {
            id: Uuid::new_v4().to_string(),
            code,
            discount_type,
            discount_value,
            min_purchase: None,
            max_discount: None,
            usage_limit: None,
            usage_count: 0,
            starts_at: None,
            expires_at: None,
            is_active: true,
            created_at: now,
        })
    }

    pub fn with_min_purchase(mut self, min_purchase: f64) -> Self {
        self.min_purchase = Some(min_purchase);
        self
    }

    pub fn with_max_discount(mut self, max_discount: f64) -> Self {
        self.max_discount = Some(max_discount);
        self
    }

    pub fn with_usage_limit(mut self, usage_limit: u32) -> Self {
        self.usage_limit = Some(usage_limit);
        self
    }

    /// Sets the activation window. Either bound may be open.
    pub fn with_window(
        mut self,
        starts_at: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.starts_at = starts_at;
        self.expires_at = expires_at;
        self
    }

    /// Checks every field against the back-office rules.
    ///
    /// Run this before persisting a record assembled with the builder
    /// setters; `evaluate_coupon` itself tolerates malformed records.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid(&self.id)?;
        normalize_coupon_code(&self.code)?;
        validate_discount_value(self.discount_type, self.discount_value)?;
        validate_optional_amount("min purchase", self.min_purchase)?;
        validate_optional_amount("max discount", self.max_discount)?;
        validate_coupon_window(self.starts_at, self.expires_at)
    }

    /// Whether the usage limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.usage_count >= limit)
    }

    /// Records one successful redemption.
    ///
    /// ## Errors
    /// - [`CoreError::CouponInactive`] if the coupon was disabled
    /// - [`CoreError::CouponUsageExhausted`] if the limit is already reached
    pub fn redeem(&mut self) -> CoreResult<()> {
        if !self.is_active {
            return Err(CoreError::CouponInactive(self.code.clone()));
        }

        if let Some(limit) = self.usage_limit {
            if self.usage_count >= limit {
                return Err(CoreError::CouponUsageExhausted {
                    code: self.code.clone(),
                    limit,
                });
            }
        }

        self.usage_count = self.usage_count.saturating_add(1);
        Ok(())
    }

    /// Soft-disables the coupon. Records are never deleted.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

/// Finds a coupon by code, ignoring case and surrounding whitespace.
///
/// ## Errors
/// - [`CoreError::Validation`] if `code` is not a well-formed code
/// - [`CoreError::CouponNotFound`] if no coupon carries it
pub fn find_coupon<'a>(coupons: &'a [Coupon], code: &str) -> CoreResult<&'a Coupon> {
    let code = normalize_coupon_code(code)?;
    coupons
        .iter()
        .find(|coupon| coupon.code == code)
        .ok_or(CoreError::CouponNotFound(code))
}

// =============================================================================
// Evaluation
// =============================================================================

/// Why a coupon cannot be applied. The `Display` text is shown to shoppers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("Coupon not found or inactive")]
    NotFoundOrInactive,

    #[error("Coupon is not yet active")]
    NotYetActive,

    #[error("Coupon has expired")]
    Expired,

    #[error("Coupon usage limit reached")]
    UsageLimitReached,

    #[error("Minimum purchase of {minimum} not met")]
    MinimumPurchaseNotMet { minimum: Money },
}

/// Result of evaluating a coupon against a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponOutcome {
    Valid { discount: Money },
    Invalid { reason: CouponRejection },
}

impl CouponOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, CouponOutcome::Valid { .. })
    }

    /// The discount, when valid.
    pub fn discount(&self) -> Option<Money> {
        match self {
            CouponOutcome::Valid { discount } => Some(*discount),
            CouponOutcome::Invalid { .. } => None,
        }
    }

    /// The rejection, when invalid.
    pub fn rejection(&self) -> Option<CouponRejection> {
        match self {
            CouponOutcome::Valid { .. } => None,
            CouponOutcome::Invalid { reason } => Some(*reason),
        }
    }
}

/// Evaluates `coupon` against a cart `subtotal` at instant `now`.
///
/// `coupon` is the result of the code lookup; `None` means no record
/// matched. This function is total: every failure is a
/// [`CouponOutcome::Invalid`].
pub fn evaluate_coupon(
    coupon: Option<&Coupon>,
    subtotal: Money,
    now: DateTime<Utc>,
) -> CouponOutcome {
    match check_eligibility(coupon, subtotal, now) {
        Ok(coupon) => CouponOutcome::Valid {
            discount: compute_discount(coupon, subtotal),
        },
        Err(reason) => CouponOutcome::Invalid { reason },
    }
}

fn check_eligibility(
    coupon: Option<&Coupon>,
    subtotal: Money,
    now: DateTime<Utc>,
) -> Result<&Coupon, CouponRejection> {
    let coupon = match coupon {
        Some(coupon) if coupon.is_active => coupon,
        _ => return Err(CouponRejection::NotFoundOrInactive),
    };

    if coupon.starts_at.is_some_and(|start| now < start) {
        return Err(CouponRejection::NotYetActive);
    }

    if coupon.expires_at.is_some_and(|end| now > end) {
        return Err(CouponRejection::Expired);
    }

    if coupon.is_exhausted() {
        return Err(CouponRejection::UsageLimitReached);
    }

    if let Some(min_purchase) = coupon.min_purchase {
        let minimum = Money::from_units(min_purchase);
        if subtotal < minimum {
            return Err(CouponRejection::MinimumPurchaseNotMet { minimum });
        }
    }

    Ok(coupon)
}

/// Discount in cents. The percentage cap is applied before rounding.
fn compute_discount(coupon: &Coupon, subtotal: Money) -> Money {
    let discount = match coupon.discount_type {
        DiscountType::Percentage => {
            let mut raw = subtotal.cents() as f64 * coupon.discount_value / 100.0;
            if let Some(max_discount) = coupon.max_discount {
                raw = raw.min(max_discount * 100.0);
            }
            Money::from_cents(round_half_up(raw))
        }
        DiscountType::Fixed => Money::from_units(coupon.discount_value).min(subtotal),
    };

    discount.max(Money::zero())
}

// =============================================================================
// Handler Payload
// =============================================================================

/// Coupon details echoed back to the cart when a code applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponSummary {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    /// Currency units, two decimals.
    pub discount_amount: f64,
}

/// JSON body of the coupon check endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CouponResponse {
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<CouponSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CouponResponse {
    /// Builds the response for an outcome produced from `coupon`.
    pub fn from_outcome(coupon: Option<&Coupon>, outcome: &CouponOutcome) -> Self {
        match (outcome, coupon) {
            (CouponOutcome::Valid { discount }, Some(coupon)) => CouponResponse {
                valid: true,
                coupon: Some(CouponSummary {
                    code: coupon.code.clone(),
                    discount_type: coupon.discount_type,
                    discount_value: coupon.discount_value,
                    discount_amount: discount.to_units(),
                }),
                message: None,
            },
            (CouponOutcome::Invalid { reason }, _) => CouponResponse {
                valid: false,
                coupon: None,
                message: Some(reason.to_string()),
            },
            (CouponOutcome::Valid { .. }, None) => CouponResponse {
                valid: false,
                coupon: None,
                message: Some(CouponRejection::NotFoundOrInactive.to_string()),
            },
        }
    }
}

/// Evaluates and shapes the response in one step.
pub fn check_coupon(coupon: Option<&Coupon>, subtotal: Money, now: DateTime<Utc>) -> CouponResponse {
    let outcome = evaluate_coupon(coupon, subtotal, now);
    CouponResponse::from_outcome(coupon, &outcome)
}

// =============================================================================
// Unit Tests
// =============================================================================
