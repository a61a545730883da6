use crate::math::tick::{FULL_RANGE_TICK_SPACING, MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use crate::math::twamm::sqrt_ratio::calculate_next_sqrt_ratio;
use crate::math::uint::U256;
use crate::private;
use crate::quoting::full_range_pool::{
    FullRangePool, FullRangePoolConstructionError, FullRangePoolQuoteError, FullRangePoolResources,
    FullRangePoolState,
};
use crate::quoting::types::{
    BlockTimestamp, Pool, PoolConfig, PoolKey, PoolState, Quote, QuoteParams, TokenAmount,
};
use alloy_primitives::Address;
use derive_more::{Add, AddAssign, Sub, SubAssign};
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pool using the TWAMM extension: a full range pool plus two continuous
/// sale flows whose virtual orders are executed lazily at swap time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwammPool {
    full_range_pool: FullRangePool,
    active_liquidity: u128,
    token0_sale_rate: u128,
    token1_sale_rate: u128,
    last_execution_time: u64,
    virtual_order_deltas: Vec<TwammSaleRateDelta>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TwammPoolState {
    pub full_range_pool_state: FullRangePoolState,
    /// Token0 sold per second, as a 32.32 fixed point rate.
    pub token0_sale_rate: u128,
    /// Token1 sold per second, as a 32.32 fixed point rate.
    pub token1_sale_rate: u128,
    pub last_execution_time: u64,
}

#[derive(Clone, Debug, Copy, Default, PartialEq, Eq, Hash, Add, AddAssign, Sub, SubAssign)]
pub struct TwammPoolResources {
    pub full_range_pool_resources: FullRangePoolResources,
    /// The number of seconds that passed since the last virtual order execution.
    pub virtual_order_seconds_executed: u32,
    /// The number of sale rate deltas applied while executing virtual orders.
    pub virtual_order_delta_times_crossed: u32,
    /// Whether the virtual orders were executed (for a single swap, 1 or 0).
    pub virtual_orders_executed: u32,
}

/// A scheduled change to the token sale rates, keyed by the time at which
/// orders expire or begin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TwammSaleRateDelta {
    pub time: u64,
    pub sale_rate_delta0: i128,
    pub sale_rate_delta1: i128,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum TwammPoolConstructionError {
    #[error(transparent)]
    FullRangePoolError(#[from] FullRangePoolConstructionError),
    /// Sale rate deltas are not ordered or not greater than `last_execution_time`.
    #[error("sale rate deltas not ordered or not greater than last execution time")]
    SaleRateDeltasInvalid,
    /// Sale rate deltas overflow or underflow at some point.
    #[error("sale rate delta overflow or underflow")]
    SaleRateDeltasOverflowOrUnderflow,
    /// Sum of current sale rate and sale rate deltas must be zero.
    #[error("sale rate delta sum non-zero")]
    SaleRateDeltaSumNonZero,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum TwammPoolQuoteError {
    #[error("execution time exceeds block time")]
    ExecutionTimeExceedsBlockTime,
    #[error("sale amount overflow")]
    SaleAmountOverflow,
    #[error("too much time passed since last execution")]
    TooMuchTimePassedSinceLastExecution,
    #[error("full range quote error")]
    FullRangeQuoteError(#[from] FullRangePoolQuoteError),
}

impl TwammPool {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        token0: Address,
        token1: Address,
        fee: u64,
        extension: Address,
        sqrt_ratio: U256,
        active_liquidity: u128,
        last_execution_time: u64,
        token0_sale_rate: u128,
        token1_sale_rate: u128,
        virtual_order_deltas: Vec<TwammSaleRateDelta>,
    ) -> Result<Self, TwammPoolConstructionError> {
        let mut last_time = last_execution_time;
        let mut sr0: u128 = token0_sale_rate;
        let mut sr1: u128 = token1_sale_rate;

        for t in virtual_order_deltas.iter() {
            if t.time <= last_time {
                return Err(TwammPoolConstructionError::SaleRateDeltasInvalid);
            }
            last_time = t.time;

            sr0 = if t.sale_rate_delta0 < 0 {
                sr0.checked_sub(t.sale_rate_delta0.unsigned_abs())
            } else {
                sr0.checked_add(t.sale_rate_delta0.unsigned_abs())
            }
            .ok_or(TwammPoolConstructionError::SaleRateDeltasOverflowOrUnderflow)?;

            sr1 = if t.sale_rate_delta1 < 0 {
                sr1.checked_sub(t.sale_rate_delta1.unsigned_abs())
            } else {
                sr1.checked_add(t.sale_rate_delta1.unsigned_abs())
            }
            .ok_or(TwammPoolConstructionError::SaleRateDeltasOverflowOrUnderflow)?;
        }

        if !(sr0.is_zero() && sr1.is_zero()) {
            return Err(TwammPoolConstructionError::SaleRateDeltaSumNonZero);
        }

        // force the price within the usable range to simplify the state;
        // this does not change quote results, only resource estimates in
        // extreme cases by a negligible amount
        let sqrt_ratio = sqrt_ratio.clamp(MIN_SQRT_RATIO, MAX_SQRT_RATIO);

        Ok(TwammPool {
            active_liquidity,
            full_range_pool: FullRangePool::new(
                PoolKey::new(
                    token0,
                    token1,
                    PoolConfig {
                        fee,
                        tick_spacing: FULL_RANGE_TICK_SPACING,
                        extension,
                    },
                ),
                FullRangePoolState {
                    sqrt_ratio,
                    liquidity: active_liquidity,
                },
            )?,
            virtual_order_deltas,
            last_execution_time,
            token0_sale_rate,
            token1_sale_rate,
        })
    }

    /// The scheduled sale rate changes, ordered by time.
    pub fn sale_rate_deltas(&self) -> &[TwammSaleRateDelta] {
        &self.virtual_order_deltas
    }
}

impl Pool for TwammPool {
    type Resources = TwammPoolResources;
    type State = TwammPoolState;
    type QuoteError = TwammPoolQuoteError;
    type Meta = BlockTimestamp;

    fn key(&self) -> &PoolKey {
        self.full_range_pool.key()
    }

    fn state(&self) -> Self::State {
        TwammPoolState {
            full_range_pool_state: self.full_range_pool.state(),
            last_execution_time: self.last_execution_time,
            token0_sale_rate: self.token0_sale_rate,
            token1_sale_rate: self.token1_sale_rate,
        }
    }

    fn quote(
        &self,
        params: QuoteParams<Self::State, Self::Meta>,
    ) -> Result<Quote<Self::Resources, Self::State>, Self::QuoteError> {
        let QuoteParams {
            token_amount,
            sqrt_ratio_limit,
            override_state,
            meta,
        } = params;

        let current_time = meta;
        let initial_state = override_state.unwrap_or_else(|| self.state());

        let mut next_sqrt_ratio = initial_state.full_range_pool_state.sqrt_ratio();
        let mut token0_sale_rate = initial_state.token0_sale_rate;
        let mut token1_sale_rate = initial_state.token1_sale_rate;
        let mut last_execution_time = initial_state.last_execution_time;

        if current_time < last_execution_time {
            return Err(TwammPoolQuoteError::ExecutionTimeExceedsBlockTime);
        }

        let mut virtual_order_delta_times_crossed = 0;
        let mut next_sale_rate_delta_index = self
            .virtual_order_deltas
            .iter()
            .position(|srd| srd.time > last_execution_time)
            .unwrap_or(self.virtual_order_deltas.len());

        let mut full_range_pool_state_override = override_state.map(|s| s.full_range_pool_state);
        let mut full_range_pool_execution_resources = FullRangePoolResources::default();

        let key = self.full_range_pool.key();
        let (token0, token1, fee) = (key.token0, key.token1, key.config.fee);

        while last_execution_time != current_time {
            let sale_rate_delta = self.virtual_order_deltas.get(next_sale_rate_delta_index);

            let next_execution_time = sale_rate_delta
                .map(|srd| srd.time.min(current_time))
                .unwrap_or(current_time);

            let time_elapsed = next_execution_time - last_execution_time;
            if time_elapsed > u32::MAX.into() {
                return Err(TwammPoolQuoteError::TooMuchTimePassedSinceLastExecution);
            }

            // sale rates are 32.32 so the product with a u32 duration always
            // fits in a u128 after the shift
            let amount0: u128 =
                u128::try_from((U256::from(token0_sale_rate) * U256::from(time_elapsed)) >> 32)
                    .expect("sale amount fits in u128");
            let amount1: u128 =
                u128::try_from((U256::from(token1_sale_rate) * U256::from(time_elapsed)) >> 32)
                    .expect("sale amount fits in u128");

            if amount0 > 0 && amount1 > 0 {
                let current_sqrt_ratio = next_sqrt_ratio.clamp(MIN_SQRT_RATIO, MAX_SQRT_RATIO);

                // always computed with the configured active liquidity, not
                // the (possibly overridden) state variable
                next_sqrt_ratio = calculate_next_sqrt_ratio(
                    current_sqrt_ratio,
                    self.active_liquidity,
                    token0_sale_rate,
                    token1_sale_rate,
                    time_elapsed as u32,
                    fee,
                );

                let (token, amount) = if current_sqrt_ratio < next_sqrt_ratio {
                    (token1, amount1)
                } else {
                    (token0, amount0)
                };

                let quote = self.full_range_pool.quote(QuoteParams {
                    token_amount: TokenAmount {
                        amount: amount
                            .to_i128()
                            .ok_or(TwammPoolQuoteError::SaleAmountOverflow)?,
                        token,
                    },
                    sqrt_ratio_limit: Some(next_sqrt_ratio),
                    override_state: full_range_pool_state_override,
                    meta: (),
                })?;

                full_range_pool_state_override = Some(quote.state_after);
                full_range_pool_execution_resources += quote.execution_resources;
            } else if amount0 > 0 || amount1 > 0 {
                let (amount, token, sqrt_ratio_limit) = if amount0 != 0 {
                    (amount0, token0, MIN_SQRT_RATIO)
                } else {
                    (amount1, token1, MAX_SQRT_RATIO)
                };

                let quote = self.full_range_pool.quote(QuoteParams {
                    token_amount: TokenAmount {
                        amount: amount
                            .to_i128()
                            .ok_or(TwammPoolQuoteError::SaleAmountOverflow)?,
                        token,
                    },
                    sqrt_ratio_limit: Some(sqrt_ratio_limit),
                    override_state: full_range_pool_state_override,
                    meta: (),
                })?;

                full_range_pool_state_override = Some(quote.state_after);
                full_range_pool_execution_resources += quote.execution_resources;

                next_sqrt_ratio = quote.state_after.sqrt_ratio();
            }

            if let Some(next_delta) = sale_rate_delta {
                if next_delta.time == next_execution_time {
                    token0_sale_rate = if next_delta.sale_rate_delta0 < 0 {
                        token0_sale_rate - next_delta.sale_rate_delta0.unsigned_abs()
                    } else {
                        token0_sale_rate + next_delta.sale_rate_delta0.unsigned_abs()
                    };
                    token1_sale_rate = if next_delta.sale_rate_delta1 < 0 {
                        token1_sale_rate - next_delta.sale_rate_delta1.unsigned_abs()
                    } else {
                        token1_sale_rate + next_delta.sale_rate_delta1.unsigned_abs()
                    };
                    next_sale_rate_delta_index += 1;
                    virtual_order_delta_times_crossed += 1;
                }
            }

            last_execution_time = next_execution_time;
        }

        let final_quote = self.full_range_pool.quote(QuoteParams {
            token_amount,
            sqrt_ratio_limit,
            meta: (),
            override_state: full_range_pool_state_override,
        })?;

        Ok(Quote {
            is_price_increasing: final_quote.is_price_increasing,
            consumed_amount: final_quote.consumed_amount,
            calculated_amount: final_quote.calculated_amount,
            fees_paid: final_quote.fees_paid,
            execution_resources: TwammPoolResources {
                full_range_pool_resources: full_range_pool_execution_resources
                    + final_quote.execution_resources,
                virtual_order_seconds_executed: (current_time - initial_state.last_execution_time)
                    as u32,
                virtual_order_delta_times_crossed,
                virtual_orders_executed: u32::from(
                    current_time > initial_state.last_execution_time,
                ),
            },
            state_after: TwammPoolState {
                full_range_pool_state: final_quote.state_after,
                token0_sale_rate,
                token1_sale_rate,
                last_execution_time: current_time,
            },
        })
    }

    fn has_liquidity(&self) -> bool {
        !self.active_liquidity.is_zero()
    }

    fn max_tick_with_liquidity(&self) -> Option<i32> {
        self.full_range_pool.max_tick_with_liquidity()
    }

    fn min_tick_with_liquidity(&self) -> Option<i32> {
        self.full_range_pool.min_tick_with_liquidity()
    }

    fn is_path_dependent(&self) -> bool {
        false
    }
}

impl PoolState for TwammPoolState {
    fn sqrt_ratio(&self) -> U256 {
        self.full_range_pool_state.sqrt_ratio()
    }

    fn liquidity(&self) -> u128 {
        self.full_range_pool_state.liquidity()
    }
}

impl private::Sealed for TwammPool {}
impl private::Sealed for TwammPoolState {}
