//! # Validation Module
//!
//! Input validation utilities for back-office coupon management and the
//! public coupon check.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin form (frontend)                                        │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Code normalization (upper-case, allowed characters)               │
//! │  └── Discount value / amount / window rules                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Coupon evaluation at checkout                                │
//! │  └── Temporal, usage and minimum-purchase rules (crate::coupon)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::normalize_coupon_code;
//!
//! assert_eq!(normalize_coupon_code(" summer-24 ").unwrap(), "SUMMER-24");
//! assert!(normalize_coupon_code("").is_err());
//! ```

use chrono::{DateTime, Utc};

use crate::coupon::DiscountType;
use crate::error::ValidationError;
use crate::MAX_COUPON_CODE_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Normalizes a coupon code to its stored form.
///
/// Codes are matched case-insensitively, so every lookup and every insert
/// goes through this function and persisted codes are always upper-case.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - Must not be empty
/// - At most [`MAX_COUPON_CODE_LEN`] characters
/// - Letters, digits, hyphens and underscores only
pub fn normalize_coupon_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > MAX_COUPON_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_COUPON_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_ascii_uppercase())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a discount value against its discount type.
///
/// ## Rules
/// - Must be finite
/// - Percentage: between 0 and 100 inclusive
/// - Fixed: not negative (currency units)
///
/// ## Example
/// ```rust
/// use storefront_core::coupon::DiscountType;
/// use storefront_core::validation::validate_discount_value;
///
/// assert!(validate_discount_value(DiscountType::Percentage, 15.0).is_ok());
/// assert!(validate_discount_value(DiscountType::Percentage, 150.0).is_err());
/// assert!(validate_discount_value(DiscountType::Fixed, 150.0).is_ok());
/// ```
pub fn validate_discount_value(discount_type: DiscountType, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "discount value".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    match discount_type {
        DiscountType::Percentage if !(0.0..=100.0).contains(&value) => {
            Err(ValidationError::OutOfRange {
                field: "discount value".to_string(),
                min: 0.0,
                max: 100.0,
            })
        }
        DiscountType::Fixed if value < 0.0 => Err(ValidationError::MustBeNonNegative {
            field: "discount value".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Validates an optional currency amount such as a minimum purchase or a
/// discount cap. `None` is always valid.
pub fn validate_optional_amount(field: &str, value: Option<f64>) -> ValidationResult<()> {
    let Some(value) = value else {
        return Ok(());
    };

    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if value < 0.0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Temporal Validators
// =============================================================================

/// Validates a coupon activation window. Either bound may be open.
pub fn validate_coupon_window(
    starts_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
) -> ValidationResult<()> {
    if let (Some(start), Some(end)) = (starts_at, expires_at) {
        if start > end {
            return Err(ValidationError::InvalidFormat {
                field: "expires at".to_string(),
                reason: "must not be before starts at".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
