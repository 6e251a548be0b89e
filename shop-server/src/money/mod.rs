//! Money and VAT arithmetic using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` for storage/serialization. Every monetary checkpoint is rounded to
//! two decimals independently: accumulations sum already-rounded values, and
//! downstream invoice totals depend on that exact drift pattern.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed price per line (€1,000,000)
pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// Convert f64 to Decimal for calculation
///
/// Input values should be validated as finite at the boundary. If
/// NaN/Infinity somehow reaches here, logs an error and returns ZERO to
/// avoid silent data corruption in financial calculations.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round2(value)
        .to_f64()
        // SAFETY: Decimal rounded to 2dp with inputs bounded by MAX_AMOUNT
        // is always within f64 representable range
        .expect("Decimal rounded to 2dp is always representable as f64")
}

/// Round to two decimals, half-up away from zero
#[inline]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

/// The shop-wide VAT rate, as a percentage (France: 20)
///
/// Catalog prices are tax-included, so the common direction is extracting
/// the VAT share from a gross amount. The net-side helpers exist for the
/// invoice breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VatRate(Decimal);

impl VatRate {
    pub fn new(percent: f64) -> Self {
        Self(to_decimal(percent))
    }

    pub fn percent(&self) -> Decimal {
        self.0
    }

    /// Bucket key used in per-rate tax maps ("20", "5.5")
    pub fn bucket_key(&self) -> String {
        self.0.normalize().to_string()
    }

    /// Gross price from a net price: `round2(net × (1 + r/100))`
    pub fn apply_taxes(&self, net: Decimal) -> Decimal {
        round2(net * (Decimal::ONE + self.0 / Decimal::ONE_HUNDRED))
    }

    /// Net price from a gross price: `round2(gross / (1 + r/100))`
    pub fn remove_taxes(&self, gross: Decimal) -> Decimal {
        round2(gross / (Decimal::ONE + self.0 / Decimal::ONE_HUNDRED))
    }

    /// Tax amount on a net price: `round2(net × r/100)`
    pub fn taxes_of(&self, net: Decimal) -> Decimal {
        round2(net * self.0 / Decimal::ONE_HUNDRED)
    }

    /// VAT share inside a tax-included amount: `round2(gross × r / (100 + r))`
    pub fn tax_in_gross(&self, gross: Decimal) -> Decimal {
        if self.0 <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        round2(gross * self.0 / (Decimal::ONE_HUNDRED + self.0))
    }
}

#[cfg(test)]
mod tests;
