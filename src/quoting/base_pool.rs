use crate::math::swap::{compute_step, is_price_increasing, ComputeStepError};
use crate::math::tick::{to_sqrt_ratio, MAX_SQRT_RATIO, MAX_TICK_SPACING, MIN_SQRT_RATIO};
use crate::math::uint::U256;
use crate::private;
use crate::quoting::types::{Pool, PoolKey, PoolState, Quote, QuoteParams, Tick};
use crate::quoting::util::{
    approximate_number_of_tick_spacings_crossed, construct_sorted_ticks,
    find_nearest_initialized_tick_index, ConstructSortedTicksError,
};
use crate::quoting::{
    ensure_valid_token_order, is_token1, CommonPoolConstructionError, CommonPoolQuoteError,
};
use derive_more::{Add, AddAssign, Sub, SubAssign};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Concentrated liquidity pool defined by sorted ticks and active liquidity state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePool {
    /// Immutable pool key identifying tokens and fee config.
    key: PoolKey,
    /// Current pool state (price, liquidity, active tick index).
    state: BasePoolState,
    /// Sorted ticks defining liquidity changes across price ranges.
    sorted_ticks: Vec<Tick>,
}

/// Price/liquidity state for a [`BasePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasePoolState {
    /// Current square root price ratio.
    pub sqrt_ratio: U256,
    /// Active liquidity at the current price.
    pub liquidity: u128,
    /// Index of the greatest initialized tick at or below the current price, if any.
    pub active_tick_index: Option<usize>,
}

/// Resources consumed during swap execution.
#[derive(
    Clone, Copy, Default, Debug, PartialEq, Hash, Eq, Add, AddAssign, Sub, SubAssign, Serialize,
    Deserialize,
)]
pub struct BasePoolResources {
    /// Whether price changed when no override was provided.
    pub no_override_price_change: u32,
    /// Count of initialized ticks crossed during the quote.
    pub initialized_ticks_crossed: u32,
    /// Count of tick spacings crossed during the quote.
    pub tick_spacings_crossed: u32,
}

/// Errors that can occur when constructing a `BasePool`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum BasePoolConstructionError {
    #[error(transparent)]
    Common(#[from] CommonPoolConstructionError),
    #[error("constructing ticks from partial data")]
    ConstructSortedTicksFromPartialDataError(#[from] ConstructSortedTicksError),
    /// Tick spacing must be less than or equal to max tick spacing.
    #[error("tick spacing too large")]
    TickSpacingTooLarge,
    /// Tick spacing must be greater than zero. Use `FullRangePool` instead if
    /// you encounter this error.
    #[error("tick spacing must be non-zero")]
    TickSpacingCannotBeZero,
    /// Ticks must be sorted in ascending order.
    #[error("ticks are not sorted in ascending order")]
    TicksNotSorted,
    /// All ticks must be a multiple of `tick_spacing`.
    #[error("all ticks must be a multiple of the tick spacing")]
    TickNotMultipleOfSpacing,
    /// The total liquidity across all ticks must sum to zero.
    #[error("total liquidity is non-zero")]
    TotalLiquidityNotZero,
    /// Active liquidity doesn't match the sum of liquidity deltas up to the active tick.
    #[error("active liquidity mismatch")]
    ActiveLiquidityMismatch,
    /// The `sqrt_ratio` of the active tick is not less than or equal to the current `sqrt_ratio`.
    #[error("active tick price is invalid")]
    ActiveTickSqrtRatioInvalid,
    /// Current `sqrt_ratio` must be at most the first tick's `sqrt_ratio` when
    /// `active_tick_index` is none.
    #[error("active price is higher than lowest initialized tick's price")]
    SqrtRatioTooHighWithNoActiveTick,
    /// The active tick index is out of bounds.
    #[error("active tick index out of bounds")]
    ActiveTickIndexOutOfBounds,
    /// Invalid tick index.
    #[error("invalid tick index {0}")]
    InvalidTickIndex(i32),
    /// The application of all tick liquidity deltas must result in a valid
    /// intermediate active liquidity.
    #[error("active liquidity overflow")]
    ActiveLiquidityOverflow,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum BasePoolQuoteError {
    #[error(transparent)]
    Common(#[from] CommonPoolQuoteError),
    #[error("invalid price limit")]
    InvalidSqrtRatioLimit,
    #[error("invalid tick {0}")]
    InvalidTick(i32),
    #[error("failed swap step computation")]
    FailedComputeSwapStep(#[from] ComputeStepError),
}

impl BasePool {
    /// Creates a `BasePool` from partial tick data retrieved from a quote data
    /// fetcher lens contract.
    ///
    /// The partial ticks cover only the searched window
    /// `[min_tick_searched, max_tick_searched]`; the remaining liquidity is
    /// folded into sentinel ticks at the window bounds so the constructor's
    /// conservation checks hold.
    pub fn from_partial_data(
        key: PoolKey,
        sqrt_ratio: U256,
        partial_ticks: Vec<Tick>,
        min_tick_searched: i32,
        max_tick_searched: i32,
        liquidity: u128,
        current_tick: i32,
    ) -> Result<Self, BasePoolConstructionError> {
        let sorted_ticks = construct_sorted_ticks(
            partial_ticks,
            min_tick_searched,
            max_tick_searched,
            key.config.tick_spacing,
            liquidity,
            current_tick,
        )?;

        let active_tick_index = find_nearest_initialized_tick_index(&sorted_ticks, current_tick);

        let state = BasePoolState {
            sqrt_ratio,
            liquidity,
            active_tick_index,
        };

        Self::new(key, state, sorted_ticks)
    }

    pub fn new(
        key: PoolKey,
        state: BasePoolState,
        sorted_ticks: Vec<Tick>,
    ) -> Result<Self, BasePoolConstructionError> {
        ensure_valid_token_order(&key)?;

        let tick_spacing = key.config.tick_spacing;

        if tick_spacing > MAX_TICK_SPACING {
            return Err(BasePoolConstructionError::TickSpacingTooLarge);
        }

        if tick_spacing.is_zero() {
            return Err(BasePoolConstructionError::TickSpacingCannotBeZero);
        }

        let mut last_tick: Option<i32> = None;
        let mut total_liquidity: u128 = 0;
        let mut active_liquidity: u128 = 0;
        let spacing_i32 = tick_spacing as i32;

        for (i, tick) in sorted_ticks.iter().enumerate() {
            if let Some(last) = last_tick {
                if tick.index <= last {
                    return Err(BasePoolConstructionError::TicksNotSorted);
                }
            }

            if !(tick.index % spacing_i32).is_zero() {
                return Err(BasePoolConstructionError::TickNotMultipleOfSpacing);
            }

            last_tick = Some(tick.index);

            total_liquidity = if tick.liquidity_delta < 0 {
                total_liquidity.checked_sub(tick.liquidity_delta.unsigned_abs())
            } else {
                total_liquidity.checked_add(tick.liquidity_delta.unsigned_abs())
            }
            .ok_or(BasePoolConstructionError::ActiveLiquidityOverflow)?;

            if let Some(active_index) = state.active_tick_index {
                if i <= active_index {
                    active_liquidity = if tick.liquidity_delta > 0 {
                        active_liquidity.checked_add(tick.liquidity_delta.unsigned_abs())
                    } else {
                        active_liquidity.checked_sub(tick.liquidity_delta.unsigned_abs())
                    }
                    .ok_or(BasePoolConstructionError::ActiveLiquidityOverflow)?;
                }
            }
        }

        if !total_liquidity.is_zero() {
            return Err(BasePoolConstructionError::TotalLiquidityNotZero);
        }

        if active_liquidity != state.liquidity {
            return Err(BasePoolConstructionError::ActiveLiquidityMismatch);
        }

        if let Some(active) = state.active_tick_index {
            let tick = sorted_ticks
                .get(active)
                .ok_or(BasePoolConstructionError::ActiveTickIndexOutOfBounds)?;

            let active_tick_sqrt_ratio = to_sqrt_ratio(tick.index)
                .ok_or(BasePoolConstructionError::InvalidTickIndex(tick.index))?;

            if active_tick_sqrt_ratio > state.sqrt_ratio {
                return Err(BasePoolConstructionError::ActiveTickSqrtRatioInvalid);
            }
        } else if let Some(first) = sorted_ticks.first() {
            let first_tick_sqrt_ratio = to_sqrt_ratio(first.index)
                .ok_or(BasePoolConstructionError::InvalidTickIndex(first.index))?;

            if state.sqrt_ratio > first_tick_sqrt_ratio {
                return Err(BasePoolConstructionError::SqrtRatioTooHighWithNoActiveTick);
            }
        }

        Ok(Self {
            key,
            state,
            sorted_ticks,
        })
    }

    pub fn ticks(&self) -> &[Tick] {
        &self.sorted_ticks
    }
}

impl PoolState for BasePoolState {
    fn sqrt_ratio(&self) -> U256 {
        self.sqrt_ratio
    }

    fn liquidity(&self) -> u128 {
        self.liquidity
    }
}

impl Pool for BasePool {
    type Resources = BasePoolResources;
    type State = BasePoolState;
    type QuoteError = BasePoolQuoteError;
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
                execution_resources: BasePoolResources::default(),
                state_after: state,
                fees_paid: 0,
            });
        }

        let is_increasing = is_price_increasing(amount, is_token1);
        let mut sqrt_ratio = state.sqrt_ratio;
        let mut liquidity = state.liquidity;
        let mut active_tick_index = state.active_tick_index;

        let sqrt_ratio_limit = if let Some(limit) = params.sqrt_ratio_limit {
            if is_increasing && limit < sqrt_ratio {
                return Err(BasePoolQuoteError::InvalidSqrtRatioLimit);
            }
            if !is_increasing && limit > sqrt_ratio {
                return Err(BasePoolQuoteError::InvalidSqrtRatioLimit);
            }
            if limit < MIN_SQRT_RATIO || limit > MAX_SQRT_RATIO {
                return Err(BasePoolQuoteError::InvalidSqrtRatioLimit);
            }
            limit
        } else if is_increasing {
            MAX_SQRT_RATIO
        } else {
            MIN_SQRT_RATIO
        };

        let mut calculated_amount: u128 = 0;
        let mut fees_paid: u128 = 0;
        let mut initialized_ticks_crossed: u32 = 0;
        let mut amount_remaining = amount;
        let starting_sqrt_ratio = sqrt_ratio;

        while amount_remaining != 0 && sqrt_ratio != sqrt_ratio_limit {
            let next_initialized_tick = if is_increasing {
                if let Some(index) = active_tick_index {
                    if let Some(tick) = self.sorted_ticks.get(index + 1) {
                        let ratio = to_sqrt_ratio(tick.index)
                            .ok_or(BasePoolQuoteError::InvalidTick(tick.index))?;
                        Some((index + 1, tick, ratio))
                    } else {
                        None
                    }
                } else if let Some(tick) = self.sorted_ticks.first() {
                    let ratio = to_sqrt_ratio(tick.index)
                        .ok_or(BasePoolQuoteError::InvalidTick(tick.index))?;
                    Some((0, tick, ratio))
                } else {
                    None
                }
            } else if let Some(index) = active_tick_index {
                if let Some(tick) = self.sorted_ticks.get(index) {
                    let ratio = to_sqrt_ratio(tick.index)
                        .ok_or(BasePoolQuoteError::InvalidTick(tick.index))?;
                    Some((index, tick, ratio))
                } else {
                    None
                }
            } else {
                None
            };

            let step_sqrt_ratio_limit =
                next_initialized_tick
                    .as_ref()
                    .map_or(sqrt_ratio_limit, |(_, _, ratio)| {
                        if (*ratio < sqrt_ratio_limit) == is_increasing {
                            *ratio
                        } else {
                            sqrt_ratio_limit
                        }
                    });

            let step = compute_step(
                sqrt_ratio,
                liquidity,
                step_sqrt_ratio_limit,
                amount_remaining,
                is_token1,
                self.key.config.fee,
            )?;

            amount_remaining -= step.consumed_amount;
            calculated_amount += step.calculated_amount;
            fees_paid += step.fee_amount;
            sqrt_ratio = step.sqrt_ratio_next;

            if let Some((index, next_tick, tick_sqrt_ratio)) = next_initialized_tick {
                if sqrt_ratio == tick_sqrt_ratio {
                    active_tick_index = if is_increasing {
                        Some(index)
                    } else {
                        index.checked_sub(1)
                    };

                    initialized_ticks_crossed += 1;

                    if (next_tick.liquidity_delta.signum() == 1) == is_increasing {
                        liquidity += next_tick.liquidity_delta.unsigned_abs();
                    } else {
                        liquidity -= next_tick.liquidity_delta.unsigned_abs();
                    }
                }
            } else {
                active_tick_index = if is_increasing {
                    self.sorted_ticks.len().checked_sub(1)
                } else {
                    None
                };
            }
        }

        let resources = BasePoolResources {
            no_override_price_change: u32::from(
                starting_sqrt_ratio == self.state.sqrt_ratio && starting_sqrt_ratio != sqrt_ratio,
            ),
            initialized_ticks_crossed,
            tick_spacings_crossed: approximate_number_of_tick_spacings_crossed(
                starting_sqrt_ratio,
                sqrt_ratio,
                self.key.config.tick_spacing,
            ),
        };

        let state_after = BasePoolState {
            sqrt_ratio,
            liquidity,
            active_tick_index,
        };

        Ok(Quote {
            is_price_increasing: is_increasing,
            consumed_amount: amount - amount_remaining,
            calculated_amount,
            execution_resources: resources,
            state_after,
            fees_paid,
        })
    }

    fn has_liquidity(&self) -> bool {
        self.state.liquidity > 0 || !self.sorted_ticks.is_empty()
    }

    fn max_tick_with_liquidity(&self) -> Option<i32> {
        self.sorted_ticks.last().map(|t| t.index)
    }

    fn min_tick_with_liquidity(&self) -> Option<i32> {
        self.sorted_ticks.first().map(|t| t.index)
    }

    fn is_path_dependent(&self) -> bool {
        false
    }
}

impl private::Sealed for BasePool {}
impl private::Sealed for BasePoolState {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::sqrt_ratio::SQRT_RATIO_ONE;
    use crate::math::tick::MAX_TICK;
    use crate::quoting::types::{PoolConfig, TokenAmount};
    use alloy_primitives::Address;

    fn token0() -> Address {
        Address::ZERO
    }

    fn token1() -> Address {
        Address::with_last_byte(1)
    }

    fn pool_key(tick_spacing: u32, fee: u64) -> PoolKey {
        PoolKey::new(
            token0(),
            token1(),
            PoolConfig {
                fee,
                tick_spacing,
                extension: Address::ZERO,
            },
        )
    }

    fn ticks(indices: &[(i32, i128)]) -> Vec<Tick> {
        indices
            .iter()
            .map(|&(index, liquidity_delta)| Tick {
                index,
                liquidity_delta,
            })
            .collect()
    }

    fn pool_state(sqrt_ratio: U256, liquidity: u128, active: Option<usize>) -> BasePoolState {
        BasePoolState {
            sqrt_ratio,
            liquidity,
            active_tick_index: active,
        }
    }

    mod constructor_validation {
        use super::*;

        #[test]
        fn token0_must_be_less_than_token1() {
            let result = BasePool::new(
                PoolKey::new(token0(), token0(), pool_key(1, 0).config),
                pool_state(SQRT_RATIO_ONE, 0, None),
                vec![],
            );
            assert_eq!(
                result.unwrap_err(),
                BasePoolConstructionError::Common(CommonPoolConstructionError::TokenOrderInvalid)
            );
        }

        #[test]
        fn tick_spacing_zero_reverts() {
            let result = BasePool::new(
                pool_key(0, 0),
                pool_state(SQRT_RATIO_ONE, 0, None),
                vec![],
            );
            assert_eq!(
                result.unwrap_err(),
                BasePoolConstructionError::TickSpacingCannotBeZero
            );
        }

        #[test]
        fn tick_spacing_cannot_exceed_max() {
            let result = BasePool::new(
                pool_key(MAX_TICK_SPACING + 1, 0),
                pool_state(SQRT_RATIO_ONE, 0, None),
                vec![],
            );
            assert_eq!(
                result.unwrap_err(),
                BasePoolConstructionError::TickSpacingTooLarge
            );
        }

        #[test]
        fn ticks_must_be_sorted() {
            let result = BasePool::new(
                pool_key(1, 0),
                pool_state(SQRT_RATIO_ONE, 1, Some(0)),
                ticks(&[(MAX_TICK, 0), (0, 0)]),
            );
            assert_eq!(result.unwrap_err(), BasePoolConstructionError::TicksNotSorted);
        }

        #[test]
        fn ticks_must_align_with_spacing() {
            let result = BasePool::new(
                pool_key(MAX_TICK_SPACING, 0),
                pool_state(SQRT_RATIO_ONE, 1, Some(0)),
                ticks(&[(-1, 1), (MAX_TICK - 1, -1)]),
            );
            assert_eq!(
                result.unwrap_err(),
                BasePoolConstructionError::TickNotMultipleOfSpacing
            );
        }

        #[test]
        fn total_liquidity_must_sum_to_zero() {
            let result = BasePool::new(
                pool_key(1, 0),
                pool_state(SQRT_RATIO_ONE, 2, Some(0)),
                ticks(&[(0, 2), (MAX_TICK, -1)]),
            );
            assert_eq!(
                result.unwrap_err(),
                BasePoolConstructionError::TotalLiquidityNotZero
            );
        }

        #[test]
        fn active_tick_index_within_bounds() {
            let result = BasePool::new(
                pool_key(1, 0),
                pool_state(SQRT_RATIO_ONE, 0, Some(2)),
                ticks(&[(0, 2), (MAX_TICK, -2)]),
            );
            assert_eq!(
                result.unwrap_err(),
                BasePoolConstructionError::ActiveTickIndexOutOfBounds
            );
        }

        #[test]
        fn active_liquidity_must_match_sum_before_active_tick() {
            let result = BasePool::new(
                pool_key(1, 0),
                pool_state(SQRT_RATIO_ONE, 0, Some(0)),
                ticks(&[(0, 2), (MAX_TICK, -2)]),
            );
            assert_eq!(
                result.unwrap_err(),
                BasePoolConstructionError::ActiveLiquidityMismatch
            );
        }

        #[test]
        fn active_tick_sqrt_ratio_cannot_exceed_state() {
            let result = BasePool::new(
                pool_key(1, 0),
                pool_state(SQRT_RATIO_ONE - U256::ONE, 2, Some(0)),
                ticks(&[(0, 2), (MAX_TICK, -2)]),
            );
            assert_eq!(
                result.unwrap_err(),
                BasePoolConstructionError::ActiveTickSqrtRatioInvalid
            );
        }

        #[test]
        fn sqrt_ratio_must_be_below_first_tick_when_no_active_tick() {
            let result = BasePool::new(
                pool_key(1, 0),
                pool_state(SQRT_RATIO_ONE + U256::ONE, 0, None),
                ticks(&[(0, 2), (MAX_TICK, -2)]),
            );
            assert_eq!(
                result.unwrap_err(),
                BasePoolConstructionError::SqrtRatioTooHighWithNoActiveTick
            );
        }
    }

    mod quoting {
        use super::*;

        fn quote_amount(
            pool: &BasePool,
            amount: i128,
            token: Address,
        ) -> Quote<BasePoolResources, BasePoolState> {
            pool.quote(QuoteParams {
                token_amount: TokenAmount { amount, token },
                sqrt_ratio_limit: None,
                override_state: None,
                meta: (),
            })
            .unwrap()
        }

        #[test]
        fn zero_liquidity_token1_input() {
            let pool = BasePool::new(
                pool_key(1, 0),
                pool_state(SQRT_RATIO_ONE, 0, None),
                vec![],
            )
            .unwrap();

            let quote = quote_amount(&pool, 1, token1());
            assert_eq!(
                (
                    quote.calculated_amount,
                    quote.execution_resources.initialized_ticks_crossed
                ),
                (0, 0)
            );
        }

        #[test]
        fn zero_liquidity_token0_input() {
            let pool = BasePool::new(
                pool_key(1, 0),
                pool_state(SQRT_RATIO_ONE, 0, None),
                vec![],
            )
            .unwrap();

            let quote = quote_amount(&pool, 1, token0());
            assert_eq!(
                (
                    quote.calculated_amount,
                    quote.execution_resources.initialized_ticks_crossed
                ),
                (0, 0)
            );
        }

        #[test]
        fn liquidity_token1_input() {
            let pool = BasePool::new(
                pool_key(1, 0),
                pool_state(SQRT_RATIO_ONE, 1_000_000_000, Some(0)),
                ticks(&[(0, 1_000_000_000), (1, -1_000_000_000)]),
            )
            .unwrap();

            let quote = quote_amount(&pool, 1000, token1());
            assert_eq!(
                (
                    quote.calculated_amount,
                    quote.execution_resources.initialized_ticks_crossed
                ),
                (499, 1)
            );
        }

        #[test]
        fn liquidity_token0_input() {
            let pool = BasePool::new(
                pool_key(1, 0),
                pool_state(to_sqrt_ratio(1).unwrap(), 0, Some(1)),
                ticks(&[(0, 1_000_000_000), (1, -1_000_000_000)]),
            )
            .unwrap();

            let quote = quote_amount(&pool, 1000, token0());
            assert_eq!(
                (
                    quote.calculated_amount,
                    quote.execution_resources.initialized_ticks_crossed
                ),
                (499, 2)
            );
        }

        #[test]
        fn production_example_quote() {
            let pool = BasePool::new(
                pool_key(100, 922337203685477),
                BasePoolState {
                    sqrt_ratio: U256::from_limbs([16035209758820767612, 757181812420893, 0, 0]),
                    liquidity: 99999,
                    active_tick_index: Some(16),
                },
                ticks(&[
                    (-88722000, 99999),
                    (-24124600, 103926982998885),
                    (-24124500, -103926982998885),
                    (-20236100, 20192651866847),
                    (-20235900, 676843433645),
                    (-20235400, 620315686813),
                    (-20235000, 3899271022058),
                    (-20234900, 1985516133391),
                    (-20233000, 2459469409600),
                    (-20232100, -20192651866847),
                    (-20231900, -663892969024),
                    (-20231400, -620315686813),
                    (-20231000, -3516445235227),
                    (-20230900, -1985516133391),
                    (-20229000, -2459469409600),
                    (-20227900, -12950464621),
                    (-20227000, -382825786831),
                    (-2000, 140308196),
                    (2000, -140308196),
                    (88722000, -99999),
                ]),
            )
            .unwrap();

            // the input is fully consumed even though nothing comes out
            let quote_token0 = quote_amount(&pool, 1_000_000, token0());
            assert_eq!(quote_token0.consumed_amount, 1_000_000);
            assert_eq!(
                (
                    quote_token0.calculated_amount,
                    quote_token0.execution_resources.initialized_ticks_crossed
                ),
                (0, 0)
            );

            let quote_token1 = quote_amount(&pool, 1_000_000, token1());
            assert_eq!(quote_token1.consumed_amount, 1_000_000);
            assert_eq!(
                (
                    quote_token1.calculated_amount,
                    quote_token1.execution_resources.initialized_ticks_crossed
                ),
                (2_436_479_431, 2)
            );
        }
    }

    mod partial_data {
        use super::*;

        #[test]
        fn balances_untracked_liquidity_into_sentinels() {
            let pool = BasePool::from_partial_data(
                pool_key(100, 0),
                SQRT_RATIO_ONE,
                ticks(&[(-100, 500), (100, -500)]),
                -1_000,
                1_000,
                800,
                0,
            )
            .unwrap();

            assert_eq!(
                pool.ticks(),
                ticks(&[(-1_000, 300), (-100, 500), (100, -500), (1_000, -300)]).as_slice()
            );
            assert_eq!(pool.state().liquidity, 800);
            assert_eq!(pool.state().active_tick_index, Some(1));
        }

        #[test]
        fn empty_partial_data_zero_liquidity() {
            let pool = BasePool::from_partial_data(
                pool_key(100, 0),
                SQRT_RATIO_ONE,
                vec![],
                -500,
                500,
                0,
                0,
            )
            .unwrap();

            assert_eq!(pool.ticks(), ticks(&[(-500, 0), (500, 0)]).as_slice());
            assert!(pool.has_liquidity());
        }
    }
}
