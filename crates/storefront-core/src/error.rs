//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CoreError        - Coupon lifecycle failures                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  NOT errors:                                                           │
//! │  └── CouponRejection  - Result of evaluating a coupon (a data value)   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → handler → JSON message            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock resolution has no error type at all: malformed input is coerced to
//! safe defaults in [`crate::ingest`].

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Coupon lifecycle errors raised by back-office operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No coupon exists for the given code.
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// Coupon has been soft-disabled.
    #[error("Coupon {0} is inactive")]
    CouponInactive(String),

    /// Redeeming would exceed the coupon's usage limit.
    ///
    /// ## When This Occurs
    /// - Two checkouts race for the last redemption
    /// - An order is replayed after the limit was reached
    #[error("Coupon {code} has reached its usage limit of {limit}")]
    CouponUsageExhausted { code: String, limit: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when admin or query input doesn't meet requirements.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid code characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::CouponUsageExhausted {
            code: "SAVE10".to_string(),
            limit: 5,
        };
        assert_eq!(
            err.to_string(),
            "Coupon SAVE10 has reached its usage limit of 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::OutOfRange {
            field: "discount value".to_string(),
            min: 0.0,
            max: 100.0,
        };
        assert_eq!(err.to_string(), "discount value must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
