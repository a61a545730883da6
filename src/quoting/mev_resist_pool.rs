use crate::math::swap::{amount_before_fee, compute_fee, ComputeStepError};
use crate::math::tick::{approximate_sqrt_ratio_to_tick, FULL_RANGE_TICK_SPACING};
use crate::math::uint::U256;
use crate::private;
use crate::quoting::base_pool::{BasePool, BasePoolQuoteError, BasePoolResources, BasePoolState};
use crate::quoting::types::{BlockTimestamp, Pool, PoolKey, PoolState, Quote, QuoteParams};
use derive_more::{Add, AddAssign, Sub, SubAssign};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MEV-resist pool: wraps a concentrated liquidity pool with a fee that
/// scales with the price impact of the swap within the block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MevResistPool {
    /// Underlying concentrated liquidity pool.
    base_pool: BasePool,
    /// Last update timestamp.
    last_update_time: u64,
    /// Current tick used for fixed-point fee calculation.
    tick: i32,
}

/// State snapshot for a [`MevResistPool`].
#[derive(Clone, Debug, PartialEq, Eq, Copy, Hash, Serialize, Deserialize)]
pub struct MevResistPoolState {
    /// Last update timestamp.
    pub last_update_time: u64,
    /// State of the underlying base pool.
    pub base_pool_state: BasePoolState,
}

/// Resources added by the MEV-resist wrapper.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Add, AddAssign, Sub, SubAssign)]
pub struct MevResistStandalonePoolResources {
    /// Count of state updates (time syncs).
    pub state_update_count: u32,
}

/// Resources consumed during MEV-resist quote execution.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Add, AddAssign, Sub, SubAssign)]
pub struct MevResistPoolResources {
    /// Resources consumed by the underlying base pool.
    pub base: BasePoolResources,
    /// Resources added by the MEV-resist wrapper.
    pub mev_resist: MevResistStandalonePoolResources,
}

/// Errors that can occur when constructing a [`MevResistPool`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum MevResistPoolConstructionError {
    #[error("fee must be non-zero")]
    FeeMustBeGreaterThanZero,
    #[error("underlying pool must not be full range")]
    CannotBeFullRange,
    #[error("extension must be non-zero")]
    MissingExtension,
    #[error("current tick is invalid")]
    InvalidCurrentTick,
}

impl MevResistPool {
    // An MEV resist pool just wraps a base pool with some additional logic
    pub fn new(
        base_pool: BasePool,
        last_update_time: u64,
        tick: i32,
    ) -> Result<Self, MevResistPoolConstructionError> {
        let config = base_pool.key().config;

        if config.fee.is_zero() {
            return Err(MevResistPoolConstructionError::FeeMustBeGreaterThanZero);
        }
        if config.tick_spacing == FULL_RANGE_TICK_SPACING {
            return Err(MevResistPoolConstructionError::CannotBeFullRange);
        }
        if config.extension.is_zero() {
            return Err(MevResistPoolConstructionError::MissingExtension);
        }

        // the current tick must lie within the active tick's range
        if let Some(i) = base_pool.state().active_tick_index {
            let sorted_ticks = base_pool.ticks();
            if let Some(t) = sorted_ticks.get(i) {
                if t.index > tick {
                    return Err(MevResistPoolConstructionError::InvalidCurrentTick);
                }
            }
            if let Some(t) = sorted_ticks.get(i + 1) {
                if t.index <= tick {
                    return Err(MevResistPoolConstructionError::InvalidCurrentTick);
                }
            }
        } else if let Some(t) = base_pool.ticks().first() {
            if t.index <= tick {
                return Err(MevResistPoolConstructionError::InvalidCurrentTick);
            }
        }

        Ok(Self {
            base_pool,
            last_update_time,
            tick,
        })
    }

    pub fn base_pool(&self) -> &BasePool {
        &self.base_pool
    }

    /// The tick the pool last settled at, used for the price-impact fee.
    pub fn tick(&self) -> i32 {
        self.tick
    }
}

impl Pool for MevResistPool {
    type Resources = MevResistPoolResources;
    type State = MevResistPoolState;
    type QuoteError = BasePoolQuoteError;
    type Meta = BlockTimestamp;

    fn key(&self) -> &PoolKey {
        self.base_pool.key()
    }

    fn state(&self) -> Self::State {
        MevResistPoolState {
            base_pool_state: self.base_pool.state(),
            last_update_time: self.last_update_time,
        }
    }

    fn quote(
        &self,
        params: QuoteParams<Self::State, Self::Meta>,
    ) -> Result<Quote<Self::Resources, Self::State>, Self::QuoteError> {
        let quote = self.base_pool.quote(QuoteParams {
            token_amount: params.token_amount,
            sqrt_ratio_limit: params.sqrt_ratio_limit,
            override_state: params.override_state.map(|o| o.base_pool_state),
            meta: (),
        })?;

        let current_time = params.meta;

        let tick_after_swap = approximate_sqrt_ratio_to_tick(quote.state_after.sqrt_ratio);

        let pool_config = self.key().config;
        let approximate_fee_multiplier = f64::from((tick_after_swap - self.tick).abs() + 1)
            / f64::from(pool_config.tick_spacing);

        let fixed_point_additional_fee: u64 =
            ((approximate_fee_multiplier * pool_config.fee as f64).round() as u128)
                .min(u128::from(u64::MAX)) as u64;

        let pool_time = params
            .override_state
            .map_or(self.last_update_time, |os| os.last_update_time);

        // if the time is updated, fees are accumulated to the current
        // liquidity providers, costing up to 3 additional storage writes
        let state_update_count = u32::from(pool_time != current_time);

        let mut calculated_amount = quote.calculated_amount;

        if params.token_amount.amount >= 0 {
            // exact input, remove the additional fee from the output
            calculated_amount -= compute_fee(calculated_amount, fixed_point_additional_fee);
        } else {
            let input_amount_fee = compute_fee(calculated_amount, pool_config.fee);
            let input_amount = calculated_amount - input_amount_fee;

            if let Some(bf) = amount_before_fee(input_amount, fixed_point_additional_fee) {
                // exact output, add the additional fee to the required input
                calculated_amount += bf - input_amount;
            } else {
                return Err(BasePoolQuoteError::FailedComputeSwapStep(
                    ComputeStepError::AmountBeforeFeeOverflow,
                ));
            }
        }

        Ok(Quote {
            calculated_amount,
            consumed_amount: quote.consumed_amount,
            execution_resources: MevResistPoolResources {
                base: quote.execution_resources,
                mev_resist: MevResistStandalonePoolResources { state_update_count },
            },
            fees_paid: quote.fees_paid,
            is_price_increasing: quote.is_price_increasing,
            state_after: MevResistPoolState {
                last_update_time: current_time,
                base_pool_state: quote.state_after,
            },
        })
    }

    fn has_liquidity(&self) -> bool {
        self.base_pool.has_liquidity()
    }

    fn max_tick_with_liquidity(&self) -> Option<i32> {
        self.base_pool.max_tick_with_liquidity()
    }

    fn min_tick_with_liquidity(&self) -> Option<i32> {
        self.base_pool.min_tick_with_liquidity()
    }

    fn is_path_dependent(&self) -> bool {
        true
    }
}

impl PoolState for MevResistPoolState {
    fn sqrt_ratio(&self) -> U256 {
        self.base_pool_state.sqrt_ratio()
    }

    fn liquidity(&self) -> u128 {
        self.base_pool_state.liquidity()
    }
}

impl private::Sealed for MevResistPoolState {}
impl private::Sealed for MevResistPool {}
