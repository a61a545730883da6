use crate::math::tick::FULL_RANGE_TICK_SPACING;
use crate::math::uint::U256;
use crate::private;
use crate::quoting::full_range_pool::{
    FullRangePool, FullRangePoolConstructionError, FullRangePoolQuoteError, FullRangePoolResources,
    FullRangePoolState,
};
use crate::quoting::types::{
    BlockTimestamp, Pool, PoolConfig, PoolKey, PoolState, Quote, QuoteParams,
};
use alloy_primitives::Address;
use derive_more::{Add, AddAssign, Sub, SubAssign};
use serde::{Deserialize, Serialize};

/// State of a pool using the oracle extension: a zero-fee full range pool
/// that records a price snapshot on the first swap of each block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OraclePoolState {
    pub full_range_pool_state: FullRangePoolState,
    pub last_snapshot_time: u64,
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Add, AddAssign, Sub, SubAssign)]
pub struct OraclePoolResources {
    pub full_range_pool_resources: FullRangePoolResources,
    /// Number of oracle snapshots the swap would write.
    pub snapshots_written: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePool {
    full_range_pool: FullRangePool,
    last_snapshot_time: u64,
}

impl OraclePool {
    pub fn new(
        token0: Address,
        token1: Address,
        extension: Address,
        sqrt_ratio: U256,
        active_liquidity: u128,
        last_snapshot_time: u64,
    ) -> Result<Self, FullRangePoolConstructionError> {
        // oracle pools always have zero fee and full range liquidity only
        let key = PoolKey::new(
            token0,
            token1,
            PoolConfig {
                fee: 0,
                tick_spacing: FULL_RANGE_TICK_SPACING,
                extension,
            },
        );

        Ok(OraclePool {
            full_range_pool: FullRangePool::new(
                key,
                FullRangePoolState {
                    sqrt_ratio,
                    liquidity: active_liquidity,
                },
            )?,
            last_snapshot_time,
        })
    }
}

impl Pool for OraclePool {
    type Resources = OraclePoolResources;
    type State = OraclePoolState;
    type QuoteError = FullRangePoolQuoteError;
    type Meta = BlockTimestamp;

    fn key(&self) -> &PoolKey {
        self.full_range_pool.key()
    }

    fn state(&self) -> Self::State {
        OraclePoolState {
            full_range_pool_state: self.full_range_pool.state(),
            last_snapshot_time: self.last_snapshot_time,
        }
    }

    fn quote(
        &self,
        params: QuoteParams<Self::State, Self::Meta>,
    ) -> Result<Quote<Self::Resources, Self::State>, Self::QuoteError> {
        let block_time = params.meta;
        let pool_time = params
            .override_state
            .map_or(self.last_snapshot_time, |os| os.last_snapshot_time);

        let result = self.full_range_pool.quote(QuoteParams {
            sqrt_ratio_limit: params.sqrt_ratio_limit,
            override_state: params.override_state.map(|s| s.full_range_pool_state),
            token_amount: params.token_amount,
            meta: (),
        })?;

        Ok(Quote {
            calculated_amount: result.calculated_amount,
            consumed_amount: result.consumed_amount,
            execution_resources: OraclePoolResources {
                snapshots_written: u32::from(pool_time != block_time),
                full_range_pool_resources: result.execution_resources,
            },
            fees_paid: result.fees_paid,
            is_price_increasing: result.is_price_increasing,
            state_after: OraclePoolState {
                full_range_pool_state: result.state_after,
                last_snapshot_time: block_time,
            },
        })
    }

    fn has_liquidity(&self) -> bool {
        self.full_range_pool.has_liquidity()
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

impl PoolState for OraclePoolState {
    fn sqrt_ratio(&self) -> U256 {
        self.full_range_pool_state.sqrt_ratio()
    }

    fn liquidity(&self) -> u128 {
        self.full_range_pool_state.liquidity()
    }
}

impl private::Sealed for OraclePool {}
impl private::Sealed for OraclePoolState {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick::{to_sqrt_ratio, MAX_SQRT_RATIO, MIN_SQRT_RATIO};
    use crate::quoting::types::TokenAmount;

    const DEFAULT_LIQUIDITY: u128 = 1_000_000_000;

    fn build_pool(sqrt_ratio: U256, liquidity: u128, last_snapshot_time: u64) -> OraclePool {
        OraclePool::new(
            Address::ZERO,
            Address::with_last_byte(1),
            Address::with_last_byte(1),
            sqrt_ratio,
            liquidity,
            last_snapshot_time,
        )
        .unwrap()
    }

    fn default_pool() -> OraclePool {
        build_pool(to_sqrt_ratio(0).unwrap(), DEFAULT_LIQUIDITY, 1)
    }

    mod constructor_validation {
        use super::*;

        #[test]
        fn max_price_constructor() {
            let state = build_pool(MAX_SQRT_RATIO, 1, 0).state();
            assert_eq!(state.full_range_pool_state.liquidity(), 1);
        }

        #[test]
        fn min_price_constructor() {
            let state = build_pool(MIN_SQRT_RATIO, 1, 0).state();
            assert_eq!(state.full_range_pool_state.liquidity(), 1);
        }

        #[test]
        fn out_of_bounds_price_is_rejected() {
            let result = OraclePool::new(
                Address::ZERO,
                Address::with_last_byte(1),
                Address::with_last_byte(1),
                MAX_SQRT_RATIO + U256::ONE,
                1,
                0,
            );
            assert_eq!(
                result.unwrap_err(),
                FullRangePoolConstructionError::SqrtRatioInvalid
            );
        }
    }

    #[test]
    fn quote_token1_input_update() {
        let pool = default_pool();

        let quote = pool
            .quote(QuoteParams {
                token_amount: TokenAmount {
                    amount: 1000,
                    token: Address::with_last_byte(1),
                },
                sqrt_ratio_limit: None,
                override_state: None,
                meta: 2,
            })
            .unwrap();

        assert_eq!(
            (
                quote.calculated_amount,
                quote.consumed_amount,
                quote.execution_resources.snapshots_written,
                quote.state_after.last_snapshot_time
            ),
            (999, 1000, 1, 2)
        );
    }

    #[test]
    fn quote_token0_input() {
        let pool = default_pool();

        let quote = pool
            .quote(QuoteParams {
                token_amount: TokenAmount {
                    amount: 1000,
                    token: Address::ZERO,
                },
                sqrt_ratio_limit: None,
                override_state: None,
                meta: 2,
            })
            .unwrap();

        assert_eq!(
            (
                quote.calculated_amount,
                quote.consumed_amount,
                quote.execution_resources.snapshots_written,
                quote.state_after.last_snapshot_time
            ),
            (999, 1000, 1, 2)
        );
    }

    #[test]
    fn same_block_swap_writes_no_snapshot() {
        let pool = default_pool();

        let quote = pool
            .quote(QuoteParams {
                token_amount: TokenAmount {
                    amount: 1000,
                    token: Address::ZERO,
                },
                sqrt_ratio_limit: None,
                override_state: None,
                meta: 1,
            })
            .unwrap();

        assert_eq!(quote.execution_resources.snapshots_written, 0);
        assert_eq!(quote.state_after.last_snapshot_time, 1);
    }
}
