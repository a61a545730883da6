use crate::math::muldiv::{muldiv, MuldivError};
use crate::math::sqrt_ratio::SQRT_RATIO_ONE;
use crate::math::uint::U256;
use num_traits::Zero;
use thiserror::Error;

fn sort_ratios(sqrt_ratio_a: U256, sqrt_ratio_b: U256) -> Option<(U256, U256)> {
    let (lower, higher) = if sqrt_ratio_a < sqrt_ratio_b {
        (sqrt_ratio_a, sqrt_ratio_b)
    } else {
        (sqrt_ratio_b, sqrt_ratio_a)
    };

    if lower.is_zero() {
        None
    } else {
        Some((lower, higher))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum AmountDeltaError {
    #[error("sqrt ratio is zero")]
    ZeroRatio,
    #[error("amount does not fit in u128")]
    Overflow,
    #[error("muldiv error")]
    Muldiv(#[from] MuldivError),
}

/// Amount of token0 in a liquidity segment between two sqrt ratios. The
/// rounding flag must be set so the result always favors the pool.
pub fn amount0_delta(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, AmountDeltaError> {
    let (lower, upper) =
        sort_ratios(sqrt_ratio_a, sqrt_ratio_b).ok_or(AmountDeltaError::ZeroRatio)?;

    if liquidity == 0 || lower == upper {
        return Ok(0);
    }

    let result_0 = muldiv(upper - lower, U256::from(liquidity) << 128, upper, round_up)?;

    let (result, remainder) = result_0.div_rem(lower);
    let rounded = if round_up && !remainder.is_zero() {
        result
            .checked_add(U256::ONE)
            .ok_or(AmountDeltaError::Overflow)?
    } else {
        result
    };

    u128::try_from(rounded).map_err(|_| AmountDeltaError::Overflow)
}

/// Amount of token1 in a liquidity segment between two sqrt ratios.
pub fn amount1_delta(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, AmountDeltaError> {
    let (lower, upper) =
        sort_ratios(sqrt_ratio_a, sqrt_ratio_b).ok_or(AmountDeltaError::ZeroRatio)?;

    if liquidity.is_zero() || lower == upper {
        return Ok(0);
    }

    let result = muldiv(U256::from(liquidity), upper - lower, SQRT_RATIO_ONE, round_up)?;

    u128::try_from(result).map_err(|_| AmountDeltaError::Overflow)
}
