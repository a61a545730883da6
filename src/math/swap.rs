use crate::math::delta::{amount0_delta, amount1_delta, AmountDeltaError};
use crate::math::sqrt_ratio::{next_sqrt_ratio_from_amount0, next_sqrt_ratio_from_amount1};
use crate::math::uint::U256;
use num_traits::Zero;
use thiserror::Error;

/// Fees are 0.64 fixed point fractions of this denominator.
pub const FEE_DENOMINATOR: U256 = U256::from_limbs([0, 1, 0, 0]);

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct SwapResult {
    pub consumed_amount: i128,
    pub calculated_amount: u128,
    pub sqrt_ratio_next: U256,
    pub fee_amount: u128,
}

#[must_use]
pub fn is_price_increasing(amount: i128, is_token1: bool) -> bool {
    (amount < 0) != is_token1
}

/// Exact inverse of the net amount after `compute_fee` is deducted. `None`
/// when the grossed up amount does not fit in a u128.
pub fn amount_before_fee(after_fee: u128, fee: u64) -> Option<u128> {
    let denominator = FEE_DENOMINATOR - U256::from(fee);
    let (quotient, remainder) = (U256::from(after_fee) << 64usize).div_rem(denominator);

    let unrounded = u128::try_from(quotient).ok()?;
    if remainder.is_zero() {
        Some(unrounded)
    } else {
        unrounded.checked_add(1)
    }
}

pub fn compute_fee(amount: u128, fee: u64) -> u128 {
    let num = U256::from(amount) * U256::from(fee);
    let (quotient, remainder) = num.div_rem(FEE_DENOMINATOR);

    // quotient < amount because fee < FEE_DENOMINATOR
    let unrounded = u128::try_from(quotient).expect("fee quotient fits in u128");
    if remainder.is_zero() {
        unrounded
    } else {
        unrounded + 1
    }
}

fn no_op(sqrt_ratio_next: U256) -> SwapResult {
    SwapResult {
        consumed_amount: 0,
        calculated_amount: 0,
        sqrt_ratio_next,
        fee_amount: 0,
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Error, Hash)]
pub enum ComputeStepError {
    #[error("wrong direction")]
    WrongDirection,
    #[error("amount before fee overflow")]
    AmountBeforeFeeOverflow,
    #[error("signed integer overflow")]
    SignedIntegerOverflow,
    #[error("amount delta error")]
    AmountDelta(#[from] AmountDeltaError),
}

/// Advances the price as far as `amount` allows, bounded by
/// `sqrt_ratio_limit`. A positive amount is an exact input of the specified
/// token, a negative amount an exact output. If the closed form price update
/// overflows or exceeds the limit, the step is clamped to the limit and the
/// consumed amount recomputed from the actual price movement.
pub fn compute_step(
    sqrt_ratio: U256,
    liquidity: u128,
    sqrt_ratio_limit: U256,
    amount: i128,
    is_token1: bool,
    fee: u64,
) -> Result<SwapResult, ComputeStepError> {
    if amount.is_zero() || sqrt_ratio == sqrt_ratio_limit {
        return Ok(no_op(sqrt_ratio));
    }

    let increasing = is_price_increasing(amount, is_token1);

    if (sqrt_ratio_limit < sqrt_ratio) == increasing {
        return Err(ComputeStepError::WrongDirection);
    }

    if liquidity.is_zero() {
        return Ok(no_op(sqrt_ratio_limit));
    }

    let price_impact_amount = if amount < 0 {
        amount
    } else {
        // compute_fee always returns a value less than amount so the
        // conversion cannot fail
        let fee: i128 = compute_fee(amount.unsigned_abs(), fee)
            .try_into()
            .map_err(|_| ComputeStepError::SignedIntegerOverflow)?;
        amount - fee
    };

    let sqrt_ratio_next_from_amount = if is_token1 {
        next_sqrt_ratio_from_amount1(sqrt_ratio, liquidity, price_impact_amount)
    } else {
        next_sqrt_ratio_from_amount0(sqrt_ratio, liquidity, price_impact_amount)
    };

    // we got a next price
    if let Ok(sqrt_ratio_next) = sqrt_ratio_next_from_amount {
        // and it's not in excess of the limit
        if (sqrt_ratio_next <= sqrt_ratio_limit) == increasing {
            // price did not move so we consume the entire amount
            if sqrt_ratio_next == sqrt_ratio {
                return Ok(SwapResult {
                    consumed_amount: amount,
                    calculated_amount: 0,
                    fee_amount: amount.unsigned_abs(),
                    sqrt_ratio_next: sqrt_ratio,
                });
            }

            let calculated_amount_excluding_fee = if is_token1 {
                amount0_delta(sqrt_ratio_next, sqrt_ratio, liquidity, amount < 0)
            } else {
                amount1_delta(sqrt_ratio_next, sqrt_ratio, liquidity, amount < 0)
            }?;

            return if amount < 0 {
                let including_fee = amount_before_fee(calculated_amount_excluding_fee, fee)
                    .ok_or(ComputeStepError::AmountBeforeFeeOverflow)?;
                Ok(SwapResult {
                    consumed_amount: amount,
                    calculated_amount: including_fee,
                    sqrt_ratio_next,
                    fee_amount: including_fee - calculated_amount_excluding_fee,
                })
            } else {
                Ok(SwapResult {
                    consumed_amount: amount,
                    calculated_amount: calculated_amount_excluding_fee,
                    sqrt_ratio_next,
                    fee_amount: amount.unsigned_abs() - price_impact_amount.unsigned_abs(),
                })
            };
        }
    }

    // this branch is only reached if we are trading all the way up to the limit
    let (specified_amount_delta, calculated_amount_delta) = if is_token1 {
        (
            amount1_delta(sqrt_ratio_limit, sqrt_ratio, liquidity, amount > 0),
            amount0_delta(sqrt_ratio_limit, sqrt_ratio, liquidity, amount < 0),
        )
    } else {
        (
            amount0_delta(sqrt_ratio_limit, sqrt_ratio, liquidity, amount > 0),
            amount1_delta(sqrt_ratio_limit, sqrt_ratio, liquidity, amount < 0),
        )
    };

    if amount < 0 {
        let amount_after_fee = calculated_amount_delta?;
        let before_fee = amount_before_fee(amount_after_fee, fee)
            .ok_or(ComputeStepError::AmountBeforeFeeOverflow)?;
        Ok(SwapResult {
            consumed_amount: -specified_amount_delta?
                .try_into()
                .map_err(|_| ComputeStepError::SignedIntegerOverflow)?,
            calculated_amount: before_fee,
            fee_amount: before_fee - amount_after_fee,
            sqrt_ratio_next: sqrt_ratio_limit,
        })
    } else {
        let specified_amount = specified_amount_delta?;
        let before_fee = amount_before_fee(specified_amount, fee)
            .ok_or(ComputeStepError::AmountBeforeFeeOverflow)?;

        Ok(SwapResult {
            consumed_amount: before_fee
                .try_into()
                .map_err(|_| ComputeStepError::SignedIntegerOverflow)?,
            calculated_amount: calculated_amount_delta?,
            fee_amount: before_fee - specified_amount,
            sqrt_ratio_next: sqrt_ratio_limit,
        })
    }
}
