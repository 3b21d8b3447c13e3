//! Scale-2 decimal money policy
//!
//! Every stored amount is normalized to two decimal places. Installment
//! slicing floors all-but-the-last slice and lets the last slice absorb
//! the remainder, so slice sums always reconcile exactly with the
//! requested total.

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, RoundingMode};

/// Round to two decimal places, half away from zero
pub fn round2(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// Truncate down to two decimal places
pub fn floor2(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::Floor)
}

/// One cent, the reconciliation tolerance for user-edited totals
pub fn cent() -> BigDecimal {
    BigDecimal::new(BigInt::from(1), 2)
}

/// True when two amounts agree within one cent
pub fn within_cent(a: &BigDecimal, b: &BigDecimal) -> bool {
    (a - b).abs() <= cent()
}

/// True for strictly positive amounts
pub fn is_positive(value: &BigDecimal) -> bool {
    value > &BigDecimal::from(0)
}
