//! Exact decimal token amounts.
//!
//! Amounts are held as an unsigned 256-bit integer of significant digits
//! plus a decimal scale, so summing and scaling never touch floating point.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;

use crate::{CoreError, Result};

/// A non-negative decimal quantity in human (whole-token) units.
///
/// The value is `units / 10^scale`. Trailing fractional zeros are always
/// stripped, so equal values have equal representations and `scale` counts
/// only significant fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenAmount {
    units: U256,
    scale: u32,
}

/// Largest token precision whose scaling factor fits in 256 bits.
pub const MAX_DECIMALS: u32 = 77;

/// `10^exp`, or `None` if it does not fit in 256 bits.
pub fn pow10(exp: u32) -> Option<U256> {
    let ten = U256::from(10u64);
    let mut acc = U256::from(1u64);
    for _ in 0..exp {
        acc = acc.checked_mul(ten)?;
    }
    Some(acc)
}

impl TokenAmount {
    pub const ZERO: Self = Self {
        units: U256::ZERO,
        scale: 0,
    };

    fn normalized(mut units: U256, mut scale: u32) -> Self {
        if units.is_zero() {
            return Self::ZERO;
        }
        let ten = U256::from(10u64);
        while scale > 0 && (units % ten).is_zero() {
            units /= ten;
            scale -= 1;
        }
        Self { units, scale }
    }

    /// Number of significant fractional digits.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.units.is_zero()
    }

    /// Exact sum of two amounts.
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        let scale = self.scale.max(other.scale);
        let lhs = self
            .units
            .checked_mul(pow10(scale - self.scale).ok_or(CoreError::AmountOverflow)?)
            .ok_or(CoreError::AmountOverflow)?;
        let rhs = other
            .units
            .checked_mul(pow10(scale - other.scale).ok_or(CoreError::AmountOverflow)?)
            .ok_or(CoreError::AmountOverflow)?;
        let sum = lhs.checked_add(rhs).ok_or(CoreError::AmountOverflow)?;
        Ok(Self::normalized(sum, scale))
    }

    /// Scale to the token's smallest unit (`amount * 10^decimals`).
    pub fn to_base_units(&self, decimals: u32) -> Result<U256> {
        if self.scale > decimals {
            return Err(CoreError::ExcessPrecision {
                scale: self.scale,
                decimals,
            });
        }
        let factor = pow10(decimals - self.scale).ok_or(CoreError::AmountOverflow)?;
        self.units
            .checked_mul(factor)
            .ok_or(CoreError::AmountOverflow)
    }
}

impl FromStr for TokenAmount {
    type Err = CoreError;

    /// Parses `digits[.digits]` with no sign, exponent or separators.
    fn from_str(s: &str) -> Result<Self> {
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        let digits_ok = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if int_part.is_empty()
            || !digits_ok(int_part)
            || !digits_ok(frac_part)
            || (s.contains('.') && frac_part.is_empty())
        {
            return Err(CoreError::InvalidAmount(s.to_string()));
        }

        let frac_part = frac_part.trim_end_matches('0');
        let mut digits = String::with_capacity(int_part.len() + frac_part.len());
        digits.push_str(int_part);
        digits.push_str(frac_part);

        let units = U256::from_str_radix(&digits, 10).map_err(|_| CoreError::AmountOverflow)?;
        let scale = u32::try_from(frac_part.len()).map_err(|_| CoreError::AmountOverflow)?;
        Ok(Self::normalized(units, scale))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.units.to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return f.write_str(&digits);
        }
        if digits.len() <= scale {
            write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
        } else {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{}.{}", int_part, frac_part)
        }
    }
}
