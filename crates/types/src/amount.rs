use alloy_primitives::U256;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// Number of decimal places the engine normalizes every balance and route computation to.
pub const CANONICAL_DECIMALS: u8 = 18;

/// An amount expressed in the engine's canonical 18-decimal fixed-point representation.
///
/// All route-level arithmetic (comparisons against `maximum`/`reserve`, slippage math) happens
/// in this representation. Conversion to and from a chain's native decimals happens at exactly
/// two boundaries: the balance read-in and the adapter call-out.
/// Never construct one from a floating point value.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into, Serialize, Deserialize,
)]
pub struct CanonicalAmount(#[serde(with = "u256_as_dec_str")] U256);

/// Errors raised while converting between canonical and native decimal representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmountConversionError {
    /// `decimals` exceeded [`CANONICAL_DECIMALS`]; the canonical representation cannot hold a
    /// native unit with more precision than itself.
    #[error("asset decimals {0} exceed canonical decimals {CANONICAL_DECIMALS}")]
    DecimalsExceedCanonical(u8),

    /// Scaling overflowed `U256`.
    #[error("amount overflowed during decimal conversion")]
    Overflow,
}

impl CanonicalAmount {
    /// The zero amount.
    pub const ZERO: Self = Self(U256::ZERO);

    /// Wraps a raw canonical-unit integer.
    pub const fn from_canonical(raw: U256) -> Self {
        Self(raw)
    }

    /// Returns the raw canonical-unit integer.
    pub const fn raw(self) -> U256 {
        self.0
    }

    /// Converts a native-decimal amount (e.g. a balance read from an ERC-20 `balanceOf` call)
    /// into the canonical 18-decimal representation.
    ///
    /// Multiplies by `10^(18-decimals)` when `decimals < 18`; never divides — the canonical
    /// representation always has at least as many digits as native.
    pub fn from_native(native: U256, decimals: u8) -> Result<Self, AmountConversionError> {
        if decimals > CANONICAL_DECIMALS {
            return Err(AmountConversionError::DecimalsExceedCanonical(decimals));
        }
        let scale = CANONICAL_DECIMALS - decimals;
        if scale == 0 {
            return Ok(Self(native));
        }
        let factor = U256::from(10u64).checked_pow(U256::from(scale)).ok_or(AmountConversionError::Overflow)?;
        native.checked_mul(factor).map(Self).ok_or(AmountConversionError::Overflow)
    }

    /// Converts this canonical amount down to the native decimals of a specific chain/asset.
    ///
    /// Converts by integer division by `10^(18-decimals)`; truncation toward zero is the only
    /// mode. Adapters never see 18-decimal figures.
    pub fn to_native(self, decimals: u8) -> Result<U256, AmountConversionError> {
        if decimals > CANONICAL_DECIMALS {
            return Err(AmountConversionError::DecimalsExceedCanonical(decimals));
        }
        let scale = CANONICAL_DECIMALS - decimals;
        if scale == 0 {
            return Ok(self.0);
        }
        let factor = U256::from(10u64).checked_pow(U256::from(scale)).ok_or(AmountConversionError::Overflow)?;
        Ok(self.0 / factor)
    }

    /// `true` if this amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Checked subtraction; returns `None` on underflow rather than wrapping or panicking.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl Sub for CanonicalAmount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

mod u256_as_dec_str {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_to_canonical_scales_up_for_fewer_decimals() {
        // USDC-like asset, 6 decimals.
        let native = U256::from(48_796_999u64);
        let canonical = CanonicalAmount::from_native(native, 6).unwrap();
        assert_eq!(canonical.raw(), U256::from(48_796_999u64) * U256::from(10u64).pow(U256::from(12u64)));
    }

    #[test]
    fn canonical_to_native_truncates_toward_zero() {
        // Boundary behavior: decimals = 6, reserve consumes most of
        // the balance, leaving a remainder that isn't a clean multiple of the native scale.
        let current = CanonicalAmount::from_native(U256::from(48_796_999u64), 6).unwrap();
        let reserve = CanonicalAmount::from_native(U256::from(47_000_000u64), 6).unwrap();
        let amount_to_bridge = current.checked_sub(reserve).unwrap();
        let native = amount_to_bridge.to_native(6).unwrap();
        assert_eq!(native, U256::from(1_796_999u64));
    }

    #[test]
    fn decimals_18_is_identity() {
        let amount = CanonicalAmount::from_canonical(U256::from(15u64) * U256::from(10u64).pow(U256::from(18u64)));
        assert_eq!(amount.to_native(18).unwrap(), amount.raw());
        let roundtrip = CanonicalAmount::from_native(amount.raw(), 18).unwrap();
        assert_eq!(roundtrip, amount);
    }

    #[test]
    fn rejects_decimals_above_canonical() {
        let err = CanonicalAmount::from_native(U256::from(1u64), 19).unwrap_err();
        assert_eq!(err, AmountConversionError::DecimalsExceedCanonical(19));
    }

    proptest::proptest! {
        #[test]
        fn roundtrip_never_increases_value(raw in 0u64..=u64::MAX, decimals in 0u8..=18u8) {
            let native = U256::from(raw);
            if let Ok(canonical) = CanonicalAmount::from_native(native, decimals) {
                let back = canonical.to_native(decimals).unwrap();
                proptest::prop_assert_eq!(back, native);
            }
        }
    }
}
