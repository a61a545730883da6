use crate::math::muldiv::{muldiv, MuldivError};
use crate::math::uint::U256;
use num_traits::Zero;
use thiserror::Error;

/// The 128.128 fixed point representation of a price of one.
pub const SQRT_RATIO_ONE: U256 = U256::from_limbs([0, 0, 1, 0]);

const TWO_POW_160: U256 = U256::from_limbs([0, 0, 0x100000000, 0]);
const TWO_POW_128: U256 = U256::from_limbs([0, 0, 1, 0]);
const TWO_POW_96: U256 = U256::from_limbs([0, 0x0100000000, 0, 0]);

/// Truncates a sqrt ratio to the bits of precision the pool contracts
/// actually store. Larger prices keep fewer low bits so the value always
/// round-trips through the compact float encoding.
pub fn truncate_sqrt_ratio_precision(ratio: U256) -> U256 {
    if ratio >= TWO_POW_160 {
        (ratio >> 98) << 98
    } else if ratio >= TWO_POW_128 {
        (ratio >> 66) << 66
    } else if ratio >= TWO_POW_96 {
        (ratio >> 34) << 34
    } else {
        (ratio >> 2) << 2
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum PriceMathError {
    #[error("no liquidity")]
    NoLiquidity,
    #[error("overflow")]
    Overflow,
    #[error("underflow")]
    Underflow,
    #[error("muldiv error")]
    Muldiv(#[from] MuldivError),
}

pub fn next_sqrt_ratio_from_amount0(
    sqrt_ratio: U256,
    liquidity: u128,
    amount0: i128,
) -> Result<U256, PriceMathError> {
    if amount0 == 0 {
        return Ok(sqrt_ratio);
    }

    if liquidity.is_zero() {
        return Err(PriceMathError::NoLiquidity);
    }

    let numerator1: U256 = U256::from(liquidity) << 128;

    if amount0 < 0 {
        let amount0_abs = U256::from(amount0.unsigned_abs());

        let product = amount0_abs
            .checked_mul(sqrt_ratio)
            .ok_or(PriceMathError::Overflow)?;

        let denominator = numerator1
            .checked_sub(product)
            .ok_or(PriceMathError::Overflow)?;

        Ok(muldiv(numerator1, sqrt_ratio, denominator, true)?)
    } else {
        let denominator = (numerator1 / sqrt_ratio)
            .checked_add(U256::from(amount0.unsigned_abs()))
            .ok_or(PriceMathError::Overflow)?;

        Ok(muldiv(numerator1, U256::ONE, denominator, true)?)
    }
}

pub fn next_sqrt_ratio_from_amount1(
    sqrt_ratio: U256,
    liquidity: u128,
    amount1: i128,
) -> Result<U256, PriceMathError> {
    if amount1 == 0 {
        return Ok(sqrt_ratio);
    }

    if liquidity.is_zero() {
        return Err(PriceMathError::NoLiquidity);
    }

    let amount1_abs = U256::from(amount1.unsigned_abs());
    let round_up = amount1 < 0;

    let quotient = muldiv(amount1_abs, SQRT_RATIO_ONE, U256::from(liquidity), round_up)?;

    if amount1 < 0 {
        sqrt_ratio
            .checked_sub(quotient)
            .ok_or(PriceMathError::Underflow)
    } else {
        sqrt_ratio
            .checked_add(quotient)
            .ok_or(PriceMathError::Overflow)
    }
}

/// Expands the 96-bit float sqrt ratio the contracts emit in events into the
/// full 128.128 fixed point value. The top two bits select the exponent, the
/// remaining 94 bits are the mantissa.
pub fn float_sqrt_ratio_to_fixed(float: U256) -> U256 {
    let exponent = usize::try_from((float >> 94) & U256::from(3u8)).unwrap_or(0);
    (float & (U256::MAX >> 162)) << (2 + 32 * exponent)
}

/// Compresses a fixed sqrt ratio into the 96-bit float wire form, truncating
/// precision the same way `truncate_sqrt_ratio_precision` does.
pub fn to_float_sqrt_ratio(fixed: U256) -> U256 {
    if fixed >= TWO_POW_160 {
        (fixed >> 98) | (U256::from(3u8) << 94)
    } else if fixed >= TWO_POW_128 {
        (fixed >> 66) | (U256::from(2u8) << 94)
    } else if fixed >= TWO_POW_96 {
        (fixed >> 34) | (U256::from(1u8) << 94)
    } else {
        fixed >> 2
    }
}
