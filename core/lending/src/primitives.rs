use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed uuid newtype, one distinct id type per entity.
#[macro_export]
macro_rules! entity_id {
    ($($name:ident),+ $(,)?) => {
        $(
            #[derive(
                Debug,
                Clone,
                Copy,
                PartialEq,
                Eq,
                Hash,
                PartialOrd,
                Ord,
                serde::Serialize,
                serde::Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(uuid::Uuid);

            impl $name {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self {
                    Self(uuid::Uuid::new_v4())
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    self.0.fmt(f)
                }
            }

            impl From<uuid::Uuid> for $name {
                fn from(id: uuid::Uuid) -> Self {
                    Self(id)
                }
            }
        )+
    };
}

entity_id! {
    LoanId,
    InstallmentId,
    LoanProductId,
    OfficeId,
    GlAccountId,
    DelinquencyBucketId,
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("ConversionError - UnexpectedNegativeNumber: {0}")]
    UnexpectedNegativeNumber(Decimal),
}

/// Monetary amounts as whole cents. Balances are never negative; signed
/// arithmetic goes through [`SignedUsdCents`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct UsdCents(u64);

impl UsdCents {
    pub const ZERO: Self = Self(0);

    pub fn into_inner(self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn to_usd(self) -> Decimal {
        Decimal::from(self.0) / dec!(100)
    }

    pub fn try_from_usd(amount: Decimal) -> Result<Self, ConversionError> {
        if amount.is_sign_negative() {
            return Err(ConversionError::UnexpectedNegativeNumber(amount));
        }
        let cents = (amount * dec!(100))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Ok(Self(cents.to_u64().expect("non-negative cents fit u64")))
    }

    /// `self × pct / 100`, rounded half-up at the cent boundary.
    pub fn apply_pct(self, pct: Decimal) -> Self {
        let cents = (Decimal::from(self.0) * pct / dec!(100))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Self(cents.to_u64().expect("non-negative cents fit u64"))
    }

    /// Simple-interest accrual on this balance: `annual_rate_pct` over
    /// `days`, actual/365, rounded half-up at the cent boundary.
    pub fn accrue_for_days(self, annual_rate_pct: Decimal, days: i64) -> Self {
        let cents = (Decimal::from(self.0) * annual_rate_pct * Decimal::from(days)
            / (dec!(100) * dec!(365)))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Self(cents.to_u64().expect("non-negative cents fit u64"))
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<u64> for UsdCents {
    fn from(cents: u64) -> Self {
        Self(cents)
    }
}

impl std::ops::Add for UsdCents {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl std::ops::AddAssign for UsdCents {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl std::iter::Sum for UsdCents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl std::fmt::Display for UsdCents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_usd().fmt(f)
    }
}

/// Difference between two balances; used for provisioning net change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct SignedUsdCents(i64);

impl SignedUsdCents {
    pub const ZERO: Self = Self(0);

    pub fn difference(current: UsdCents, prior: UsdCents) -> Self {
        Self(current.0 as i64 - prior.0 as i64)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn abs(self) -> UsdCents {
        UsdCents(self.0.unsigned_abs())
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl From<UsdCents> for SignedUsdCents {
    fn from(cents: UsdCents) -> Self {
        Self(cents.0 as i64)
    }
}

impl std::fmt::Display for SignedUsdCents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        (Decimal::from(self.0) / dec!(100)).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_conversion_round_trips() {
        let cents = UsdCents::try_from_usd(dec!(1234.56)).unwrap();
        assert_eq!(cents.into_inner(), 123_456);
        assert_eq!(cents.to_usd(), dec!(1234.56));
    }

    #[test]
    fn negative_usd_is_rejected() {
        assert!(matches!(
            UsdCents::try_from_usd(dec!(-0.01)),
            Err(ConversionError::UnexpectedNegativeNumber(_))
        ));
    }

    #[test]
    fn apply_pct_rounds_half_up_at_cent_boundary() {
        // 10.01 × 25% = 2.5025 -> 2.50
        assert_eq!(UsdCents::from(1001).apply_pct(dec!(25)).into_inner(), 250);
        // 10.02 × 25% = 2.5050 -> 2.51 (half-up)
        assert_eq!(UsdCents::from(1002).apply_pct(dec!(25)).into_inner(), 251);
    }

    #[test]
    fn accrual_uses_actual_365() {
        // 10_000.00 at 12% for 30 days: 1_000_000 × 0.12 × 30/365 = 9863.01... cents
        assert_eq!(
            UsdCents::from(1_000_000)
                .accrue_for_days(dec!(12), 30)
                .into_inner(),
            9_863
        );
        assert_eq!(
            UsdCents::from(1_000_000).accrue_for_days(dec!(12), 0),
            UsdCents::ZERO
        );
    }

    #[test]
    fn signed_difference_keeps_direction() {
        let decrease = SignedUsdCents::difference(UsdCents::from(100), UsdCents::from(250));
        assert!(decrease.is_negative());
        assert_eq!(decrease.abs(), UsdCents::from(150));

        let increase = SignedUsdCents::difference(UsdCents::from(250), UsdCents::from(100));
        assert!(!increase.is_negative());
        assert_eq!(increase.abs(), UsdCents::from(150));
    }
}
