//! Fixed-point amount type.
//!
//! Amounts are represented as integers (u128) to avoid floating-point errors.
//! The smallest unit is 1 raw; every division truncates toward zero.

use ethnum::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// Basis-point denominator: 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// An amount of the host ledger's settlement currency, in raw units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// `self * numerator / denominator` with truncation.
    ///
    /// The product is taken in 256 bits, so this only returns `None` when the
    /// quotient itself exceeds u128 or the denominator is zero.
    pub fn checked_mul_div(self, numerator: u128, denominator: u128) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let quotient = U256::from(self.0) * U256::from(numerator) / U256::from(denominator);
        let (high, low) = quotient.into_words();
        (high == 0).then_some(Self(low))
    }

    /// Take `bps` basis points of this amount, truncating.
    pub fn apply_bps(self, bps: u32) -> Option<Self> {
        self.checked_mul_div(bps as u128, BPS_DENOMINATOR)
    }
}

/// Unchecked arithmetic panics on overflow; ledger paths use the `checked_*`
/// forms and surface the failure as an error.
impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, a| acc + a)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_bps_truncates() {
        assert_eq!(Amount::new(300).apply_bps(1000), Some(Amount::new(30)));
        assert_eq!(Amount::new(9).apply_bps(1000), Some(Amount::ZERO));
        assert_eq!(Amount::new(1000).apply_bps(6000), Some(Amount::new(600)));
    }

    #[test]
    fn mul_div_overflow_and_zero_denominator() {
        assert_eq!(Amount::new(u128::MAX).checked_mul_div(2, 1), None);
        assert_eq!(Amount::new(10).checked_mul_div(1, 0), None);
        assert_eq!(Amount::new(700).checked_mul_div(30, 700), Some(Amount::new(30)));
    }

    #[test]
    fn mul_div_widens_the_intermediate_product() {
        let e18 = 10u128.pow(18);
        // 2000e18 * 100e18 overflows u128 but the quotient fits comfortably.
        let reward = Amount::new(2_000 * e18).checked_mul_div(100 * e18, 2_000 * e18);
        assert_eq!(reward, Some(Amount::new(100 * e18)));
        assert_eq!(
            Amount::new(u128::MAX).checked_mul_div(u128::MAX, u128::MAX),
            Some(Amount::new(u128::MAX))
        );
        assert_eq!(Amount::new(u128::MAX).checked_mul_div(3, 2), None);
    }

    #[test]
    fn checked_sub_underflow() {
        assert_eq!(Amount::new(1).checked_sub(Amount::new(2)), None);
        assert_eq!(Amount::new(1).saturating_sub(Amount::new(2)), Amount::ZERO);
    }
}
