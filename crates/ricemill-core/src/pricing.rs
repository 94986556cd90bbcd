//! # Pricing
//!
//! Line pricing and sale totals. Checkout in `ricemill-db` runs these against
//! the product rows it reads inside its transaction, then writes exactly
//! what they return.
//!
//! ## Line Normalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Weight line:     10.000 kg × 40.00/kg                                  │
//! │                   quantity = 10000 g, unit_price = 40.00                │
//! │                   line_total = round(10000 × 4000 / 1000) = 400.00      │
//! │                                                                         │
//! │  Container line:  2 bags × 1625.00/bag (bag = 25 kg)                    │
//! │                   quantity = 50000 g, unit_price = 1625.00              │
//! │                   line_total = 2 × 162500 = 3250.00                     │
//! │                                                                         │
//! │  subtotal = Σ line_total;  total = subtotal - discount                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{LineQuantity, Product, SaleLine, UnitKind};
use crate::weight::{Weight, GRAMS_PER_KG};
use crate::{MAX_LINE_CONTAINERS, MAX_LINE_WEIGHT};

/// Prices a loose weight at a per-kg rate, rounding half up to the minor unit.
///
/// Returns `None` when the total does not fit in [`Money`].
///
/// ```rust
/// use ricemill_core::{money::Money, weight::Weight, pricing::price_by_weight};
///
/// // 1.255 kg × 10.00 = 12.55
/// assert_eq!(price_by_weight(Weight::from_grams(1255), Money::from_cents(1000)).unwrap().cents(), 1255);
/// // 0.333 kg × 0.05 = 0.01665 → 0.02
/// assert_eq!(price_by_weight(Weight::from_grams(333), Money::from_cents(5)).unwrap().cents(), 2);
/// // 10 kg at i64::MAX / 2 per kg
/// assert!(price_by_weight(Weight::from_kg(10), Money::from_cents(i64::MAX / 2)).is_none());
/// ```
pub fn price_by_weight(weight: Weight, price_per_kg: Money) -> Option<Money> {
    let product = weight.grams() as i128 * price_per_kg.cents() as i128;
    let half = GRAMS_PER_KG as i128 / 2;
    let rounded = if product >= 0 {
        (product + half) / GRAMS_PER_KG as i128
    } else {
        (product - half) / GRAMS_PER_KG as i128
    };
    i64::try_from(rounded).ok().map(Money::from_cents)
}

fn line_total_overflow() -> CoreError {
    CoreError::invalid_quantity("line total overflow")
}

/// A priced line, ready to be written as a [`SaleLine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub unit_kind: UnitKind,
    pub container_count: Option<i64>,
    /// Weight-equivalent taken from stock.
    pub quantity: Weight,
    /// Snapshot of the per-kg or per-container price.
    pub unit_price: Money,
    pub line_total: Money,
}

/// Validates a requested quantity without looking at a product.
///
/// Checked for every line before any product row is read, so a zero or
/// negative quantity fails the same way whether or not the product exists.
pub fn check_quantity(quantity: LineQuantity) -> CoreResult<()> {
    match quantity {
        LineQuantity::Weight(w) => {
            if !w.is_positive() {
                return Err(CoreError::invalid_quantity(format!(
                    "weight must be positive, got {}",
                    w
                )));
            }
            if w > MAX_LINE_WEIGHT {
                return Err(CoreError::invalid_quantity(format!(
                    "weight {} exceeds the per-line maximum {}",
                    w, MAX_LINE_WEIGHT
                )));
            }
        }
        LineQuantity::Containers(count) => {
            if count <= 0 {
                return Err(CoreError::invalid_quantity(format!(
                    "container count must be positive, got {}",
                    count
                )));
            }
            if count > MAX_LINE_CONTAINERS {
                return Err(CoreError::invalid_quantity(format!(
                    "container count {} exceeds the per-line maximum {}",
                    count, MAX_LINE_CONTAINERS
                )));
            }
        }
    }
    Ok(())
}

/// Prices one requested line against the current product row.
///
/// Does not check stock; the caller compares [`PricedLine::quantity`] with
/// what is on hand inside its transaction.
pub fn price_line(product: &Product, quantity: LineQuantity) -> CoreResult<PricedLine> {
    check_quantity(quantity)?;

    match quantity {
        LineQuantity::Weight(weight) => Ok(PricedLine {
            unit_kind: UnitKind::Weight,
            container_count: None,
            quantity: weight,
            unit_price: product.price_per_kg,
            line_total: price_by_weight(weight, product.price_per_kg)
                .ok_or_else(line_total_overflow)?,
        }),
        LineQuantity::Containers(count) => {
            let container = product
                .container
                .ok_or_else(|| CoreError::ContainerNotDefined {
                    code: product.code.clone(),
                })?;

            let quantity = container
                .weight
                .checked_mul(count)
                .ok_or_else(|| CoreError::invalid_quantity("container weight overflow"))?;

            Ok(PricedLine {
                unit_kind: UnitKind::Container,
                container_count: Some(count),
                quantity,
                unit_price: container.price,
                line_total: container
                    .price
                    .checked_mul(count)
                    .ok_or_else(line_total_overflow)?,
            })
        }
    }
}

/// Recomputes a stored line's total from its own snapshot fields.
///
/// Reports and tests use this to check `line_total == quantity × unit_price`
/// without consulting the (possibly re-priced) product. `None` on overflow.
pub fn expected_line_total(line: &SaleLine) -> Option<Money> {
    match line.unit_kind {
        UnitKind::Weight => price_by_weight(line.quantity, line.unit_price),
        UnitKind::Container => line
            .unit_price
            .checked_mul(line.container_count.unwrap_or(0)),
    }
}

/// Subtotal, discount and total of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

/// Sums line totals and applies an absolute discount.
///
/// ## Rules
/// - `discount >= 0`
/// - `discount <= subtotal`
/// - `total = subtotal - discount`
pub fn compute_totals<I>(line_totals: I, discount: Money) -> CoreResult<SaleTotals>
where
    I: IntoIterator<Item = Money>,
{
    if discount.is_negative() {
        return Err(CoreError::invalid_discount(discount, "discount cannot be negative"));
    }

    let mut subtotal = Money::zero();
    for amount in line_totals {
        subtotal = subtotal
            .checked_add(amount)
            .ok_or_else(|| CoreError::invalid_quantity("sale subtotal overflow"))?;
    }

    if discount > subtotal {
        return Err(CoreError::invalid_discount(
            discount,
            format!("discount exceeds subtotal {}", subtotal),
        ));
    }

    let total = subtotal
        .checked_sub(discount)
        .ok_or_else(|| CoreError::invalid_quantity("sale total overflow"))?;

    Ok(SaleTotals {
        subtotal,
        discount,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContainerSpec, Quality};
    use chrono::Utc;
    use proptest::prelude::*;

    fn basmati() -> Product {
        let now = Utc::now();
        Product {
            id: "p-basmati".to_string(),
            code: "RICE001".to_string(),
            name: "Basmati Rice".to_string(),
            quality: Quality::Premium,
            price_per_kg: Money::from_cents(6500),
            container: Some(ContainerSpec {
                weight: Weight::from_kg(25),
                price: Money::from_cents(162_500),
            }),
            on_hand: Weight::from_kg(500),
            min_stock: Weight::from_kg(100),
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_price_weight_line() {
        let line = price_line(&basmati(), LineQuantity::Weight(Weight::from_kg(10))).unwrap();
        assert_eq!(line.unit_kind, UnitKind::Weight);
        assert_eq!(line.quantity, Weight::from_kg(10));
        assert_eq!(line.unit_price.cents(), 6500);
        assert_eq!(line.line_total.cents(), 65_000);
        assert_eq!(line.container_count, None);
    }

    #[test]
    fn test_price_container_line() {
        let line = price_line(&basmati(), LineQuantity::Containers(2)).unwrap();
        assert_eq!(line.unit_kind, UnitKind::Container);
        assert_eq!(line.quantity, Weight::from_kg(50));
        assert_eq!(line.unit_price.cents(), 162_500);
        assert_eq!(line.line_total.cents(), 325_000);
        assert_eq!(line.container_count, Some(2));
    }

    #[test]
    fn test_container_line_without_container() {
        let mut product = basmati();
        product.container = None;
        let err = price_line(&product, LineQuantity::Containers(1)).unwrap_err();
        assert!(matches!(err, CoreError::ContainerNotDefined { .. }));
    }

    #[test]
    fn test_rejects_non_positive_quantities() {
        let p = basmati();
        assert!(matches!(
            price_line(&p, LineQuantity::Weight(Weight::zero())),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            price_line(&p, LineQuantity::Weight(Weight::from_grams(-1))),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            price_line(&p, LineQuantity::Containers(0)),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            price_line(&p, LineQuantity::Containers(MAX_LINE_CONTAINERS + 1)),
            Err(CoreError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_compute_totals() {
        let totals = compute_totals(
            [Money::from_cents(40_000), Money::from_cents(325_000)],
            Money::from_cents(5_000),
        )
        .unwrap();
        assert_eq!(totals.subtotal.cents(), 365_000);
        assert_eq!(totals.total.cents(), 360_000);
    }

    #[test]
    fn test_discount_bounds() {
        let lines = [Money::from_cents(40_000)];
        assert!(compute_totals(lines, Money::from_cents(40_000)).is_ok());
        assert!(matches!(
            compute_totals(lines, Money::from_cents(40_001)),
            Err(CoreError::InvalidDiscount { .. })
        ));
        assert!(matches!(
            compute_totals(lines, Money::from_cents(-1)),
            Err(CoreError::InvalidDiscount { .. })
        ));
    }

    #[test]
    fn test_expected_line_total_uses_snapshot() {
        let priced = price_line(&basmati(), LineQuantity::Containers(3)).unwrap();
        let line = SaleLine {
            id: "l1".to_string(),
            sale_id: "s1".to_string(),
            product_id: "p-basmati".to_string(),
            code_snapshot: "RICE001".to_string(),
            name_snapshot: "Basmati Rice".to_string(),
            unit_kind: priced.unit_kind,
            container_count: priced.container_count,
            quantity: priced.quantity,
            unit_price: priced.unit_price,
            line_total: priced.line_total,
            position: 0,
        };
        assert_eq!(expected_line_total(&line), Some(line.line_total));
    }

    #[test]
    fn test_weight_line_total_overflow() {
        let mut product = basmati();
        product.price_per_kg = Money::from_cents(i64::MAX / 2);
        let err = price_line(&product, LineQuantity::Weight(Weight::from_kg(10))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_container_line_total_overflow() {
        let mut product = basmati();
        product.container = Some(ContainerSpec {
            weight: Weight::from_grams(1),
            price: Money::from_cents(1_000_000_000_000_000),
        });
        let err = price_line(&product, LineQuantity::Containers(MAX_LINE_CONTAINERS)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { .. }));
    }

    proptest! {
        #[test]
        fn prop_totals_subtract_discount(
            cents in proptest::collection::vec(0i64..10_000_000, 1..20),
            discount_pct in 0i64..=100,
        ) {
            let lines: Vec<Money> = cents.iter().copied().map(Money::from_cents).collect();
            let subtotal: i64 = cents.iter().sum();
            let discount = Money::from_cents(subtotal * discount_pct / 100);

            let totals = compute_totals(lines, discount).unwrap();
            prop_assert_eq!(totals.subtotal.cents(), subtotal);
            prop_assert_eq!(totals.total, totals.subtotal - totals.discount);
            prop_assert!(!totals.total.is_negative());
        }

        #[test]
        fn prop_weight_price_within_half_unit(grams in 1i64..100_000_000, price in 0i64..1_000_000) {
            let total = price_by_weight(Weight::from_grams(grams), Money::from_cents(price)).unwrap();
            let exact = grams as i128 * price as i128;
            let diff = (total.cents() as i128 * 1000 - exact).abs();
            prop_assert!(diff <= 500);
        }
    }
}
