//! # Weight Module
//!
//! Stock quantities in integer grams.
//!
//! The kilogram is the base unit users see; the gram is what gets stored.
//! Three decimal places of kilograms is the ledger's fixed precision, so
//! every stock delta, sale-line quantity and reconciliation sum is exact.
//!
//! ```rust
//! use ricemill_core::weight::Weight;
//!
//! let bag = Weight::from_kg(25);
//! assert_eq!(bag.grams(), 25_000);
//! assert_eq!(Weight::parse_kg("12.5").unwrap(), Weight::from_grams(12_500));
//! assert_eq!(bag.to_string(), "25.000 kg");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::error::ValidationError;

/// Grams per kilogram.
pub const GRAMS_PER_KG: i64 = 1000;

/// A signed weight in grams.
///
/// Signed because stock movements carry deltas: `-10.000 kg` for a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Weight(i64);

impl Weight {
    #[inline]
    pub const fn from_grams(grams: i64) -> Self {
        Weight(grams)
    }

    #[inline]
    pub const fn from_kg(kg: i64) -> Self {
        Weight(kg * GRAMS_PER_KG)
    }

    #[inline]
    pub const fn zero() -> Self {
        Weight(0)
    }

    #[inline]
    pub const fn grams(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Checked multiplication by a container count.
    pub fn checked_mul(self, count: i64) -> Option<Weight> {
        self.0.checked_mul(count).map(Weight)
    }

    #[inline]
    pub fn checked_add(self, other: Weight) -> Option<Weight> {
        self.0.checked_add(other.0).map(Weight)
    }

    #[inline]
    pub fn checked_sub(self, other: Weight) -> Option<Weight> {
        self.0.checked_sub(other.0).map(Weight)
    }

    /// Parses a decimal kilogram string such as `"12.5"` or `"-3.250"`.
    ///
    /// At most three decimal places are accepted; anything finer than a gram
    /// is rejected rather than silently rounded.
    pub fn parse_kg(input: &str) -> Result<Weight, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "weight".to_string(),
            reason: reason.to_string(),
        };

        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "weight".to_string(),
            });
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal number of kilograms"));
        }
        if frac.len() > 3 {
            return Err(invalid("at most three decimal places (grams)"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("number too large"))?
        };
        let frac_grams: i64 = if frac.is_empty() {
            0
        } else {
            // "5" → 500 g, "25" → 250 g, "125" → 125 g
            let padded = format!("{:0<3}", frac);
            padded.parse().map_err(|_| invalid("bad fraction"))?
        };

        let grams = whole
            .checked_mul(GRAMS_PER_KG)
            .and_then(|g| g.checked_add(frac_grams))
            .ok_or_else(|| invalid("number too large"))?;

        Ok(Weight(if negative { -grams } else { grams }))
    }

    /// Formats as kilograms with three decimals, no unit suffix.
    ///
    /// Used for CSV export.
    pub fn to_kg_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        format!("{}{}.{:03}", sign, abs / GRAMS_PER_KG, abs % GRAMS_PER_KG)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kg", self.to_kg_string())
    }
}

// Ledger arithmetic on stock uses the `checked_*` methods.
impl Add for Weight {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Weight(self.0 + other.0)
    }
}

impl AddAssign for Weight {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Weight {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Weight(self.0 - other.0)
    }
}

impl SubAssign for Weight {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Weight {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Weight(-self.0)
    }
}

impl Mul<i64> for Weight {
    type Output = Self;

    #[inline]
    fn mul(self, count: i64) -> Self {
        Weight(self.0 * count)
    }
}

impl Sum for Weight {
    fn sum<I: Iterator<Item = Weight>>(iter: I) -> Self {
        iter.fold(Weight::zero(), |acc, w| acc + w)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
