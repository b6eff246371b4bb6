//! # Ingest Module
//!
//! Coerce-or-default conversion of raw product and coupon documents.
//!
//! Documents written by older admin screens carry quantities as strings,
//! floats, `null`, or worse. Everything is normalized here, once, so the
//! stock resolver only ever sees non-negative integers and the coupon
//! evaluator only ever sees a well-typed [`Coupon`].
//!
//! ```text
//! raw JSON value          coerced
//! ──────────────          ───────
//! 4                  ──►  4
//! 2.9                ──►  2      (truncated)
//! -3                 ──►  0      (quantities are never negative)
//! "5", true, null    ──►  0
//! ```
//!
//! Coupon fields fall back to the most restrictive reading: a missing or
//! non-boolean `isActive` is inactive, an unknown `discountType` is fixed.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::coupon::{Coupon, DiscountType};
use crate::stock::{ColorSizeStock, ProductStock, SizeStock};

/// Converts one raw quantity. Never fails.
pub fn coerce_quantity(value: &Value) -> i64 {
    let qty = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        _ => 0,
    };
    qty.max(0)
}

/// Coerces a `size → quantity` object. Anything but an object is `None`.
pub fn coerce_size_stock(value: &Value) -> Option<SizeStock> {
    let (stock, coerced) = coerce_size_map(value.as_object()?);
    if coerced > 0 {
        debug!(coerced, "Coerced malformed flat stock entries");
    }
    Some(stock)
}

/// Coerces a `color → (size → quantity)` object.
///
/// A color whose entry is not an object is kept with an empty size map, so
/// the product still counts as tracked per color.
pub fn coerce_color_size_stock(value: &Value) -> Option<ColorSizeStock> {
    let object = value.as_object()?;
    let mut coerced = 0;

    let stock = object
        .iter()
        .map(|(color, sizes)| {
            let sizes = match sizes.as_object() {
                Some(sizes) => {
                    let (map, count) = coerce_size_map(sizes);
                    coerced += count;
                    map
                }
                None => {
                    coerced += 1;
                    SizeStock::new()
                }
            };
            (color.clone(), sizes)
        })
        .collect();

    if coerced > 0 {
        debug!(coerced, "Coerced malformed per-color stock entries");
    }

    Some(stock)
}

/// Returns the map and how many entries were not already clean integers.
fn coerce_size_map(object: &Map<String, Value>) -> (SizeStock, usize) {
    let mut coerced = 0;
    let map = object
        .iter()
        .map(|(size, raw)| {
            let qty = coerce_quantity(raw);
            if raw.as_i64() != Some(qty) {
                coerced += 1;
            }
            (size.clone(), qty)
        })
        .collect();
    (map, coerced)
}

impl ProductStock {
    /// Reads the stock fields of a product document.
    ///
    /// Missing or malformed fields become `None`; malformed quantities
    /// become zero. A non-numeric `lowStockThreshold` is treated as unset.
    pub fn from_document(document: &Value) -> Self {
        let color_size_stock = document
            .get("colorSizeStock")
            .and_then(coerce_color_size_stock);

        let size_stock = document.get("sizeStock").and_then(coerce_size_stock);

        let low_stock_threshold = document
            .get("lowStockThreshold")
            .filter(|raw| raw.is_number())
            .map(coerce_quantity);

        debug!(
            per_color = color_size_stock.is_some(),
            flat = size_stock.is_some(),
            "Ingested product stock"
        );

        ProductStock {
            color_size_stock,
            size_stock,
            low_stock_threshold,
        }
    }
}

// =============================================================================
// Coupon Documents
// =============================================================================

/// A finite number, or `None`.
pub fn coerce_amount(value: &Value) -> Option<f64> {
    value.as_f64().filter(|f| f.is_finite())
}

/// An RFC 3339 timestamp string, or `None`.
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn coerce_count(value: &Value) -> u32 {
    u32::try_from(coerce_quantity(value)).unwrap_or(u32::MAX)
}

fn coerce_string(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

impl Coupon {
    /// Reads a coupon document. Never fails.
    ///
    /// ## Defaults
    /// - `isActive` missing or not a boolean: inactive
    /// - `discountType` other than `"percentage"`: fixed
    /// - `discountValue` non-numeric: 0
    /// - `minPurchase`, `maxDiscount` non-numeric: unset
    /// - `usageLimit` non-numeric: unset; numeric values coerce like quantities
    /// - `usageCount`: coerced like a quantity
    /// - unparseable `startsAt`, `expiresAt`: unbounded
    pub fn from_document(document: &Value) -> Self {
        let discount_type = match document.get("discountType").and_then(Value::as_str) {
            Some(kind) if kind.eq_ignore_ascii_case("percentage") => DiscountType::Percentage,
            _ => DiscountType::Fixed,
        };

        let coupon = Coupon {
            id: coerce_string(document.get("id")),
            code: coerce_string(document.get("code")).trim().to_ascii_uppercase(),
            discount_type,
            discount_value: document
                .get("discountValue")
                .and_then(coerce_amount)
                .unwrap_or(0.0),
            min_purchase: document.get("minPurchase").and_then(coerce_amount),
            max_discount: document.get("maxDiscount").and_then(coerce_amount),
            usage_limit: document
                .get("usageLimit")
                .filter(|raw| raw.is_number())
                .map(coerce_count),
            usage_count: document.get("usageCount").map(coerce_count).unwrap_or(0),
            starts_at: document.get("startsAt").and_then(coerce_timestamp),
            expires_at: document.get("expiresAt").and_then(coerce_timestamp),
            is_active: document
                .get("isActive")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            created_at: document
                .get("createdAt")
                .and_then(coerce_timestamp)
                .unwrap_or_default(),
        };

        debug!(
            code = %coupon.code,
            active = coupon.is_active,
            "Ingested coupon"
        );

        coupon
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon::{evaluate_coupon, CouponRejection};
    use crate::money::Money;
    use serde_json::json;

    #[test]
    fn test_coerce_quantity() {
        assert_eq!(coerce_quantity(&json!(4)), 4);
        assert_eq!(coerce_quantity(&json!(0)), 0);
        assert_eq!(coerce_quantity(&json!(2.9)), 2);
        assert_eq!(coerce_quantity(&json!(-3)), 0);
        assert_eq!(coerce_quantity(&json!(-0.5)), 0);
        assert_eq!(coerce_quantity(&json!("5")), 0);
        assert_eq!(coerce_quantity(&json!(true)), 0);
        assert_eq!(coerce_quantity(&json!(null)), 0);
        assert_eq!(coerce_quantity(&json!({ "qty": 1 })), 0);
        assert_eq!(coerce_quantity(&json!(u64::MAX)), i64::MAX);
    }

    #[test]
    fn test_coerce_size_stock() {
        let stock = coerce_size_stock(&json!({ "S": 2, "M": "x", "L": 1.5 })).unwrap();
        assert_eq!(stock.get("S"), Some(&2));
        assert_eq!(stock.get("M"), Some(&0));
        assert_eq!(stock.get("L"), Some(&1));

        assert_eq!(coerce_size_stock(&json!([1, 2])), None);
        assert_eq!(coerce_size_stock(&json!(null)), None);
    }

    #[test]
    fn test_coerce_color_size_stock() {
        let stock = coerce_color_size_stock(&json!({
            "Black": { "S": 1 },
            "Sand": "sold out"
        }))
        .unwrap();

        assert_eq!(stock["Black"].get("S"), Some(&1));
        assert!(stock["Sand"].is_empty());
        assert_eq!(coerce_color_size_stock(&json!(7)), None);
    }

    #[test]
    fn test_from_document_per_color() {
        let product = ProductStock::from_document(&json!({
            "name": "Linen Shirt",
            "colorSizeStock": { "Black": { "S": 2, "M": "3" }, "Sand": { "S": 1 } },
            "sizeStock": { "S": 40 },
            "lowStockThreshold": 2
        }));

        assert_eq!(product.low_stock_threshold, Some(2));
        assert_eq!(product.view().variant_quantity(Some("Black"), "M"), Some(0));

        let report = product.report();
        assert_eq!(report.total_stock, 3);
        assert_eq!(report.size_stock.get("S"), Some(&3));
        assert!(report.in_stock);
    }

    #[test]
    fn test_from_document_missing_fields() {
        let product = ProductStock::from_document(&json!({
            "sizeStock": "none",
            "lowStockThreshold": "low"
        }));

        assert_eq!(product, ProductStock::default());
        assert!(!product.report().in_stock);
    }

    #[test]
    fn test_coupon_null_usage_count() {
        let coupon = Coupon::from_document(&json!({
            "code": "save10",
            "discountType": "percentage",
            "discountValue": 10,
            "usageLimit": 3,
            "usageCount": null,
            "isActive": true
        }));

        assert_eq!(coupon.code, "SAVE10");
        assert_eq!(coupon.usage_count, 0);
        assert_eq!(coupon.usage_limit, Some(3));
        let outcome = evaluate_coupon(Some(&coupon), Money::from_units(50.0), Utc::now());
        assert_eq!(outcome.discount(), Some(Money::from_cents(500)));
    }

    #[test]
    fn test_coupon_string_discount_value_is_zero() {
        let coupon = Coupon::from_document(&json!({
            "code": "TEN",
            "discountType": "fixed",
            "discountValue": "10",
            "isActive": true
        }));

        assert_eq!(coupon.discount_value, 0.0);
        let outcome = evaluate_coupon(Some(&coupon), Money::from_units(50.0), Utc::now());
        assert_eq!(outcome.discount(), Some(Money::zero()));
    }

    #[test]
    fn test_coupon_float_usage_limit() {
        let coupon = Coupon::from_document(&json!({
            "code": "FIVE",
            "discountType": "fixed",
            "discountValue": 5,
            "usageLimit": 5.0,
            "usageCount": 5,
            "isActive": true
        }));

        assert_eq!(coupon.usage_limit, Some(5));
        assert_eq!(
            evaluate_coupon(Some(&coupon), Money::from_units(50.0), Utc::now()).rejection(),
            Some(CouponRejection::UsageLimitReached)
        );

        let unlimited = Coupon::from_document(&json!({ "usageLimit": "none", "usageCount": -2 }));
        assert_eq!(unlimited.usage_limit, None);
        assert_eq!(unlimited.usage_count, 0);
    }

    #[test]
    fn test_coupon_missing_active_flag_is_inactive() {
        let coupon = Coupon::from_document(&json!({
            "code": "SPRING",
            "discountType": "fixed",
            "discountValue": 5
        }));
        assert!(!coupon.is_active);

        let stringly = Coupon::from_document(&json!({ "code": "SPRING", "isActive": "true" }));
        assert!(!stringly.is_active);

        assert_eq!(
            evaluate_coupon(Some(&coupon), Money::from_units(50.0), Utc::now()).rejection(),
            Some(CouponRejection::NotFoundOrInactive)
        );
    }

    #[test]
    fn test_coupon_optional_amounts_and_window() {
        let coupon = Coupon::from_document(&json!({
            "code": "WINTER",
            "discountType": "PERCENTAGE",
            "discountValue": 20,
            "minPurchase": "50",
            "maxDiscount": null,
            "startsAt": "2024-01-01T00:00:00Z",
            "expiresAt": "next week",
            "isActive": true,
            "createdAt": 1704067200
        }));

        assert_eq!(coupon.discount_type, DiscountType::Percentage);
        assert_eq!(coupon.min_purchase, None);
        assert_eq!(coupon.max_discount, None);
        assert_eq!(
            coupon.starts_at,
            Some(DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc))
        );
        assert_eq!(coupon.expires_at, None);
        assert_eq!(coupon.created_at, DateTime::<Utc>::default());
    }

    #[test]
    fn test_coupon_unknown_type_is_fixed() {
        let coupon = Coupon::from_document(&json!({
            "code": "ODD",
            "discountType": "bogo",
            "discountValue": 30,
            "isActive": true
        }));

        assert_eq!(coupon.discount_type, DiscountType::Fixed);
        let outcome = evaluate_coupon(Some(&coupon), Money::from_units(20.0), Utc::now());
        assert_eq!(outcome.discount(), Some(Money::from_cents(2000)));
    }

    #[test]
    fn test_coupon_document_matches_strict_record() {
        let document = json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "code": "SAVE10",
            "discountType": "percentage",
            "discountValue": 10,
            "maxDiscount": 5,
            "isActive": true,
            "createdAt": "2024-01-01T00:00:00Z"
        });

        let strict: Coupon = serde_json::from_value(document.clone()).unwrap();
        assert_eq!(Coupon::from_document(&document), strict);
    }
}
