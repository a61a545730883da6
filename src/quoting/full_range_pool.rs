use crate::math::swap::{compute_step, is_price_increasing, ComputeStepError};
use crate::math::tick::{
    FULL_RANGE_TICK_SPACING, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK,
};
use crate::math::uint::U256;
use crate::private;
use crate::quoting::types::{Pool, PoolKey, PoolState, Quote, QuoteParams};
use crate::quoting::{
    ensure_valid_token_order, is_token1, CommonPoolConstructionError, CommonPoolQuoteError,
};
use derive_more::{Add, AddAssign, Sub, SubAssign};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Price and liquidity of a pool whose positions span the entire usable
/// price range, so swaps never cross a tick boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FullRangePoolState {
    pub sqrt_ratio: U256,
    pub liquidity: u128,
}

// Resources consumed during any swap execution in a full range pool.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Add, AddAssign, Sub, SubAssign)]
pub struct FullRangePoolResources {
    pub no_override_price_change: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullRangePool {
    key: PoolKey,
    state: FullRangePoolState,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum FullRangePoolConstructionError {
    #[error(transparent)]
    Common(#[from] CommonPoolConstructionError),
    #[error("tick spacing must be the full range sentinel value")]
    TickSpacingNotFullRange,
    #[error("sqrt ratio out of bounds")]
    SqrtRatioInvalid,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum FullRangePoolQuoteError {
    #[error(transparent)]
    Common(#[from] CommonPoolQuoteError),
    #[error("invalid price limit")]
    InvalidSqrtRatioLimit,
    #[error("failed swap step computation")]
    FailedComputeSwapStep(#[from] ComputeStepError),
}

impl FullRangePool {
    pub fn new(
        key: PoolKey,
        state: FullRangePoolState,
    ) -> Result<Self, FullRangePoolConstructionError> {
        ensure_valid_token_order(&key)?;

        if key.config.tick_spacing != FULL_RANGE_TICK_SPACING {
            return Err(FullRangePoolConstructionError::TickSpacingNotFullRange);
        }

        if state.sqrt_ratio < MIN_SQRT_RATIO || state.sqrt_ratio > MAX_SQRT_RATIO {
            return Err(FullRangePoolConstructionError::SqrtRatioInvalid);
        }

        Ok(Self { key, state })
    }
}

impl Pool for FullRangePool {
    type Resources = FullRangePoolResources;
    type State = FullRangePoolState;
    type QuoteError = FullRangePoolQuoteError;
    type Meta = ();

    fn key(&self) -> &PoolKey {
        &self.key
    }

    fn state(&self) -> Self::State {
        self.state
    }

    fn quote(
        &self,
        params: QuoteParams<Self::State, Self::Meta>,
    ) -> Result<Quote<Self::Resources, Self::State>, Self::QuoteError> {
        let amount = params.token_amount.amount;
        let is_token1 = is_token1(&self.key, params.token_amount.token)?;

        let state = params.override_state.unwrap_or(self.state);

        if amount == 0 {
            return Ok(Quote {
                is_price_increasing: is_token1,
                consumed_amount: 0,
                calculated_amount: 0,
                execution_resources: FullRangePoolResources::default(),
                state_after: state,
                fees_paid: 0,
            });
        }

        let is_increasing = is_price_increasing(amount, is_token1);

        let mut sqrt_ratio = state.sqrt_ratio;
        let liquidity = state.liquidity;

        if liquidity.is_zero() {
            return Ok(Quote {
                is_price_increasing: is_increasing,
                consumed_amount: 0,
                calculated_amount: 0,
                execution_resources: FullRangePoolResources::default(),
                state_after: state,
                fees_paid: 0,
            });
        }

        let sqrt_ratio_limit = if let Some(limit) = params.sqrt_ratio_limit {
            if is_increasing && limit < sqrt_ratio {
                return Err(FullRangePoolQuoteError::InvalidSqrtRatioLimit);
            }
            if !is_increasing && limit > sqrt_ratio {
                return Err(FullRangePoolQuoteError::InvalidSqrtRatioLimit);
            }
            if limit < MIN_SQRT_RATIO || limit > MAX_SQRT_RATIO {
                return Err(FullRangePoolQuoteError::InvalidSqrtRatioLimit);
            }
            limit
        } else if is_increasing {
            MAX_SQRT_RATIO
        } else {
            MIN_SQRT_RATIO
        };

        let starting_sqrt_ratio = sqrt_ratio;

        // full range liquidity never crosses a tick, one step completes the swap
        let step = compute_step(
            sqrt_ratio,
            liquidity,
            sqrt_ratio_limit,
            amount,
            is_token1,
            self.key.config.fee,
        )?;

        sqrt_ratio = step.sqrt_ratio_next;

        let resources = FullRangePoolResources {
            no_override_price_change: u32::from(
                starting_sqrt_ratio == self.state.sqrt_ratio && starting_sqrt_ratio != sqrt_ratio,
            ),
        };

        Ok(Quote {
            is_price_increasing: is_increasing,
            consumed_amount: step.consumed_amount,
            calculated_amount: step.calculated_amount,
            execution_resources: resources,
            state_after: FullRangePoolState {
                sqrt_ratio,
                liquidity,
            },
            fees_paid: step.fee_amount,
        })
    }

    fn has_liquidity(&self) -> bool {
        self.state.liquidity > 0
    }

    fn max_tick_with_liquidity(&self) -> Option<i32> {
        self.has_liquidity().then_some(MAX_TICK)
    }

    fn min_tick_with_liquidity(&self) -> Option<i32> {
        self.has_liquidity().then_some(MIN_TICK)
    }

    fn is_path_dependent(&self) -> bool {
        false
    }
}

impl PoolState for FullRangePoolState {
    fn sqrt_ratio(&self) -> U256 {
        self.sqrt_ratio
    }

    fn liquidity(&self) -> u128 {
        self.liquidity
    }
}

impl private::Sealed for FullRangePool {}
impl private::Sealed for FullRangePoolState {}
