//! Fixed-point amount handling
//!
//! Chain amounts are `U256` integers scaled by the token's decimals. Signed
//! quantities (profits) are `I256`. `Decimal` only appears at the
//! configuration and reporting boundaries.

use alloy_primitives::{I256, U256};
use rust_decimal::Decimal;

use crate::AmountError;

/// Fractional digits kept in net-profit percentages
pub const PCT_SCALE: u32 = 18;

/// Largest scale `Decimal` can represent
pub const MAX_DECIMAL_SCALE: u8 = 28;

/// 10^exp as U256
pub fn pow10(exp: u8) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// Convert a human amount into raw token units.
///
/// Rejects amounts finer than the token's precision instead of truncating.
pub fn to_raw(amount: Decimal, decimals: u8) -> Result<U256, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative);
    }

    let amount = amount.normalize();
    let scale = amount.scale();
    if scale > decimals as u32 {
        return Err(AmountError::TooPrecise { scale, decimals });
    }

    let mantissa = U256::from(amount.mantissa().unsigned_abs());
    mantissa
        .checked_mul(pow10(decimals - scale as u8))
        .ok_or(AmountError::Overflow)
}

/// Convert raw token units into a human amount, if it fits a `Decimal`
pub fn to_decimal(raw: U256, decimals: u8) -> Option<Decimal> {
    let mantissa = i128::try_from(u128::try_from(raw).ok()?).ok()?;
    scaled_decimal(mantissa, decimals)
}

/// Signed variant of [`to_decimal`]
pub fn signed_to_decimal(value: I256, decimals: u8) -> Option<Decimal> {
    let mantissa = i128::try_from(value).ok()?;
    scaled_decimal(mantissa, decimals)
}

fn scaled_decimal(mantissa: i128, decimals: u8) -> Option<Decimal> {
    if decimals > MAX_DECIMAL_SCALE {
        return None;
    }
    Decimal::try_from_i128_with_scale(mantissa, decimals as u32)
        .ok()
        .map(|d| d.normalize())
}

/// `numerator / denominator * 100`, truncated toward zero at [`PCT_SCALE`] digits.
///
/// Both operands are in the same raw unit, so the result is exact up to the
/// truncation. Returns `None` for a zero denominator or out-of-range values.
pub fn percentage(numerator: I256, denominator: U256) -> Option<Decimal> {
    let denominator = I256::try_from(denominator).ok()?;
    if denominator.is_zero() {
        return None;
    }

    let factor = I256::try_from(U256::from(100u64) * pow10(PCT_SCALE as u8)).ok()?;
    let scaled = numerator.checked_mul(factor)? / denominator;
    let mantissa = i128::try_from(scaled).ok()?;

    Decimal::try_from_i128_with_scale(mantissa, PCT_SCALE)
        .ok()
        .map(|d| d.normalize())
}
