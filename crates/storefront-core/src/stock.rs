//! # Stock Module
//!
//! Answers inventory questions about a product's variants, the same way for
//! products tracked per color and products still on the legacy per-size map.
//!
//! ## Two Stock Representations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Stock Representations                              │
//! │                                                                         │
//! │  colorSizeStock (per-color, current)     sizeStock (flat, legacy)      │
//! │  ───────────────────────────────────     ────────────────────────      │
//! │  { "Black": { "S": 3, "M": 0 },          { "S": 5, "M": 2 }            │
//! │    "Sand":  { "S": 1, "M": 4 } }                                       │
//! │                                                                         │
//! │  StockView::resolve() picks ONE of them per product:                   │
//! │                                                                         │
//! │    colorSizeStock present and non-empty ──► PerColor (authoritative)   │
//! │    otherwise ─────────────────────────────► Flat (absent == empty)     │
//! │                                                                         │
//! │  Once a product is PerColor, a color missing from the map is           │
//! │  "unknown". It never falls through to the flat map.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::stock::{ColorSizeStock, SizeStock, StockView};
//!
//! let mut black = SizeStock::new();
//! black.insert("M".to_string(), 3);
//! let mut per_color = ColorSizeStock::new();
//! per_color.insert("Black".to_string(), black);
//!
//! let view = StockView::resolve(Some(&per_color), None);
//! assert_eq!(view.variant_quantity(Some("Black"), "M"), Some(3));
//! assert_eq!(view.variant_quantity(Some("White"), "M"), None);
//! assert_eq!(view.total_stock(), 3);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::DEFAULT_LOW_STOCK_THRESHOLD;

// =============================================================================
// Stock Maps
// =============================================================================

/// Quantity per size label. Ordered so that reports serialize identically
/// across calls.
pub type SizeStock = BTreeMap<String, i64>;

/// Size map per color name.
pub type ColorSizeStock = BTreeMap<String, SizeStock>;

static EMPTY_SIZE_STOCK: SizeStock = BTreeMap::new();

// =============================================================================
// Stock View
// =============================================================================

/// The stock representation that is authoritative for a product.
///
/// This is the single place where the per-color / flat fallback is decided.
/// Every query goes through a `StockView`, so call sites never inspect map
/// presence or emptiness themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockView<'a> {
    /// Per-color tracking is active. `flat` is kept only for lookups made
    /// without a color.
    PerColor {
        colors: &'a ColorSizeStock,
        flat: &'a SizeStock,
    },
    /// No per-color tracking; the legacy flat map (possibly empty) applies.
    Flat(&'a SizeStock),
}

impl<'a> StockView<'a> {
    /// Picks the authoritative representation.
    pub fn resolve(
        color_size_stock: Option<&'a ColorSizeStock>,
        size_stock: Option<&'a SizeStock>,
    ) -> Self {
        let flat = size_stock.unwrap_or(&EMPTY_SIZE_STOCK);
        match color_size_stock {
            Some(colors) if !colors.is_empty() => StockView::PerColor { colors, flat },
            _ => StockView::Flat(flat),
        }
    }

    /// Returns true when per-color tracking is active.
    pub fn is_per_color(&self) -> bool {
        matches!(self, StockView::PerColor { .. })
    }

    /// Quantity of one variant, or `None` when the variant is not tracked.
    ///
    /// With per-color tracking and a color supplied, only the per-color map
    /// is consulted. Without a color the flat map answers.
    pub fn variant_quantity(&self, color: Option<&str>, size: &str) -> Option<i64> {
        match (self, color) {
            (StockView::PerColor { colors, .. }, Some(color)) => colors
                .get(color)
                .and_then(|sizes| sizes.get(size))
                .copied(),
            (StockView::PerColor { flat, .. }, None) | (StockView::Flat(flat), _) => {
                flat.get(size).copied()
            }
        }
    }

    /// Full size → quantity map for one color.
    ///
    /// Per-color products return that color's map (empty when the color is
    /// untracked); flat products return the flat map for every color.
    pub fn sizes_for_color(&self, color: &str) -> SizeStock {
        match self {
            StockView::PerColor { colors, .. } => colors.get(color).cloned().unwrap_or_default(),
            StockView::Flat(flat) => (*flat).clone(),
        }
    }

    /// Returns true when none of the requested sizes can be bought.
    ///
    /// ## Rules
    /// - No sizes requested: never out of stock
    /// - Per-color: scans every TRACKED color, not the `colors` argument;
    ///   any tracked color with a requested size above zero means in stock
    /// - Flat: an empty flat map means out of stock; otherwise every
    ///   requested size must be zero or untracked
    ///
    /// The `colors` argument is accepted for call-site symmetry but does not
    /// narrow the per-color scan.
    pub fn is_fully_out_of_stock<C: AsRef<str>, S: AsRef<str>>(
        &self,
        _colors: &[C],
        sizes: &[S],
    ) -> bool {
        if sizes.is_empty() {
            return false;
        }

        match self {
            StockView::PerColor { colors, .. } => !colors
                .values()
                .any(|size_map| has_positive(size_map, sizes)),
            StockView::Flat(flat) => {
                if flat.is_empty() {
                    return true;
                }
                !has_positive(flat, sizes)
            }
        }
    }

    /// Sum of every tracked quantity in the authoritative map.
    pub fn total_stock(&self) -> i64 {
        match self {
            StockView::PerColor { colors, .. } => colors
                .values()
                .map(sum_quantities)
                .fold(0, i64::saturating_add),
            StockView::Flat(flat) => sum_quantities(flat),
        }
    }

    /// Per-size quantities, aggregated across colors when tracked per color.
    pub fn flat_stock(&self) -> SizeStock {
        match self {
            StockView::PerColor { colors, .. } => flatten_to_flat_stock(colors),
            StockView::Flat(flat) => (*flat).clone(),
        }
    }
}

fn has_positive<S: AsRef<str>>(size_map: &SizeStock, sizes: &[S]) -> bool {
    sizes.iter().any(|size| {
        let size: &str = size.as_ref();
        size_map.get(size).is_some_and(|qty| *qty > 0)
    })
}

fn sum_quantities(size_map: &SizeStock) -> i64 {
    size_map.values().copied().fold(0, i64::saturating_add)
}

// =============================================================================
// Map-Level Operations
// =============================================================================
// Call shapes used by handlers that still hold the two raw maps.

/// Quantity for a color + size pair. See [`StockView::variant_quantity`].
pub fn variant_quantity(
    color_size_stock: Option<&ColorSizeStock>,
    size_stock: Option<&SizeStock>,
    color: Option<&str>,
    size: &str,
) -> Option<i64> {
    StockView::resolve(color_size_stock, size_stock).variant_quantity(color, size)
}

/// Size map applicable to a color. See [`StockView::sizes_for_color`].
pub fn sizes_for_color(
    color_size_stock: Option<&ColorSizeStock>,
    size_stock: Option<&SizeStock>,
    color: &str,
) -> SizeStock {
    StockView::resolve(color_size_stock, size_stock).sizes_for_color(color)
}

/// See [`StockView::is_fully_out_of_stock`].
pub fn is_fully_out_of_stock<C: AsRef<str>, S: AsRef<str>>(
    color_size_stock: Option<&ColorSizeStock>,
    size_stock: Option<&SizeStock>,
    colors: &[C],
    sizes: &[S],
) -> bool {
    StockView::resolve(color_size_stock, size_stock).is_fully_out_of_stock(colors, sizes)
}

/// See [`StockView::total_stock`].
pub fn total_stock(
    color_size_stock: Option<&ColorSizeStock>,
    size_stock: Option<&SizeStock>,
) -> i64 {
    StockView::resolve(color_size_stock, size_stock).total_stock()
}

/// Collapses a per-color map into per-size totals across all colors.
///
/// ## Example
/// ```text
/// { "Black": { "S": 3, "M": 1 }, "Sand": { "S": 2 } }  ──►  { "M": 1, "S": 5 }
/// ```
pub fn flatten_to_flat_stock(color_size_stock: &ColorSizeStock) -> SizeStock {
    let mut flat = SizeStock::new();
    for sizes in color_size_stock.values() {
        for (size, qty) in sizes {
            let entry = flat.entry(size.clone()).or_insert(0);
            *entry = entry.saturating_add(*qty);
        }
    }
    flat
}

// =============================================================================
// Product Stock Record
// =============================================================================

/// The stock-related fields of a product document.
///
/// Build it from a raw document with
/// [`ProductStock::from_document`](crate::ingest) so malformed quantities are
/// coerced once, at the edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductStock {
    /// Per-color stock, when the product has been migrated to it.
    #[serde(default)]
    pub color_size_stock: Option<ColorSizeStock>,

    /// Legacy per-size stock.
    #[serde(default)]
    pub size_stock: Option<SizeStock>,

    /// Total stock at or below which the product shows a "low stock" badge.
    #[serde(default)]
    pub low_stock_threshold: Option<i64>,
}

impl ProductStock {
    /// Returns the authoritative view over this product's stock.
    pub fn view(&self) -> StockView<'_> {
        StockView::resolve(self.color_size_stock.as_ref(), self.size_stock.as_ref())
    }

    /// Builds the payload returned by the product stock endpoint.
    pub fn report(&self) -> StockReport {
        let view = self.view();
        let total_stock = view.total_stock();

        let color_size_stock = match view {
            StockView::PerColor { colors, .. } => Some(colors.clone()),
            StockView::Flat(_) => None,
        };

        StockReport {
            size_stock: view.flat_stock(),
            color_size_stock,
            total_stock,
            low_stock_threshold: self.low_stock_threshold,
            in_stock: total_stock > 0,
        }
    }
}

// =============================================================================
// Stock Report
// =============================================================================

/// JSON payload describing a product's stock.
///
/// `sizeStock` is always populated: for per-color products it holds the
/// per-size totals across colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockReport {
    pub size_stock: SizeStock,
    pub color_size_stock: Option<ColorSizeStock>,
    pub total_stock: i64,
    pub low_stock_threshold: Option<i64>,
    pub in_stock: bool,
}

impl StockReport {
    /// In stock, but at or below the low-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        let threshold = self
            .low_stock_threshold
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        self.in_stock && self.total_stock <= threshold
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
