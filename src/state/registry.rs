use crate::quoting::types::{PoolKey, TokenAmount};
use crate::state::pool::{ComputeTvlError, PoolSwapQuote, TrackedPool};
use alloy_primitives::Address;
use std::collections::HashMap;

/// One slot in the registry. `NotLoaded` (discovery has seen the id but no
/// snapshot exists yet) is deliberately distinct from `Missing` (the chain
/// confirmed the pool does not exist) so concurrent first-use fetches do
/// not re-query confirmed absences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolSlot {
    NotLoaded,
    Ready(TrackedPool),
    Missing,
}

/// Quote rows for one pool across a vector of trade sizes. `None` marks a
/// size the pool cannot serve (partial fill or failed quote).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolQuotes {
    pub pool_id: String,
    pub quotes: Vec<Option<PoolSwapQuote>>,
}

/// Explicit cache of tracked pools keyed by the pool key string id. The
/// quoting entry point fans trade sizes out across all ready pools for a
/// token pair.
#[derive(Default)]
pub struct PoolRegistry {
    slots: HashMap<String, PoolSlot>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `key` was discovered, without a snapshot yet. Keeps an
    /// existing `Ready` or `Missing` slot untouched.
    pub fn track(&mut self, key: &PoolKey) {
        self.slots
            .entry(key.string_id().to_string())
            .or_insert(PoolSlot::NotLoaded);
    }

    pub fn insert(&mut self, pool: TrackedPool) {
        self.slots
            .insert(pool.key().string_id().to_string(), PoolSlot::Ready(pool));
    }

    /// Marks `key` as confirmed nonexistent on chain.
    pub fn mark_missing(&mut self, key: &PoolKey) {
        self.slots
            .insert(key.string_id().to_string(), PoolSlot::Missing);
    }

    pub fn slot(&self, key: &PoolKey) -> Option<&PoolSlot> {
        self.slots.get(key.string_id())
    }

    pub fn get(&self, key: &PoolKey) -> Option<&TrackedPool> {
        match self.slots.get(key.string_id()) {
            Some(PoolSlot::Ready(pool)) => Some(pool),
            _ => None,
        }
    }

    /// String ids of all ready pools for the (unordered) token pair.
    pub fn pool_ids_for_pair(&self, token_a: Address, token_b: Address) -> Vec<String> {
        self.pools_for_pair(token_a, token_b)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Quotes `amounts` of `specified_token` against every ready pool for
    /// the pair. A size a pool cannot fully serve yields `None` in that
    /// row; pools that serve no size at all are omitted.
    pub fn quote(
        &self,
        specified_token: Address,
        other_token: Address,
        amounts: &[i128],
        block_time: u64,
    ) -> Vec<PoolQuotes> {
        self.pools_for_pair(specified_token, other_token)
            .filter_map(|(id, pool)| {
                let quotes: Vec<Option<PoolSwapQuote>> = amounts
                    .iter()
                    .map(|&amount| {
                        pool.quote(
                            TokenAmount {
                                amount,
                                token: specified_token,
                            },
                            block_time,
                        )
                        .ok()
                        .filter(|quote| quote.consumed_amount == amount)
                    })
                    .collect();

                quotes.iter().any(Option::is_some).then(|| PoolQuotes {
                    pool_id: id.clone(),
                    quotes,
                })
            })
            .collect()
    }

    /// Token amounts held by each ready pool for the pair, for liquidity
    /// ranking. Pools whose TVL cannot be computed are skipped.
    pub fn liquidity_for_pair(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Vec<(String, (u128, u128))> {
        self.pools_for_pair(token_a, token_b)
            .filter_map(|(id, pool)| {
                pool.compute_tvl()
                    .ok()
                    .map(|amounts| (id.clone(), amounts))
            })
            .collect()
    }

    pub fn compute_tvl(&self, key: &PoolKey) -> Option<Result<(u128, u128), ComputeTvlError>> {
        self.get(key).map(TrackedPool::compute_tvl)
    }

    fn pools_for_pair(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> impl Iterator<Item = (&String, &TrackedPool)> {
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };

        self.slots.iter().filter_map(move |(id, slot)| match slot {
            PoolSlot::Ready(pool)
                if pool.key().token0 == token0 && pool.key().token1 == token1 =>
            {
                Some((id, pool))
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::sqrt_ratio::SQRT_RATIO_ONE;
    use crate::quoting::base_pool::{BasePool, BasePoolState};
    use crate::quoting::full_range_pool::{FullRangePool, FullRangePoolState};
    use crate::quoting::types::{PoolConfig, Tick};
    use crate::state::pool::TrackedBasePool;

    fn token(n: u8) -> Address {
        Address::with_last_byte(n)
    }

    fn full_range_pool() -> TrackedPool {
        TrackedPool::FullRange(
            FullRangePool::new(
                PoolKey::new(
                    Address::ZERO,
                    token(1),
                    PoolConfig {
                        fee: 0,
                        tick_spacing: 0,
                        extension: Address::ZERO,
                    },
                ),
                FullRangePoolState {
                    sqrt_ratio: SQRT_RATIO_ONE,
                    liquidity: 1_000_000_000,
                },
            )
            .unwrap(),
        )
    }

    fn base_pool() -> TrackedPool {
        let ticks = vec![
            Tick {
                index: -1000,
                liquidity_delta: 1_000_000,
            },
            Tick {
                index: 1000,
                liquidity_delta: -1_000_000,
            },
        ];
        TrackedPool::Base(TrackedBasePool {
            pool: BasePool::new(
                PoolKey::new(
                    Address::ZERO,
                    token(1),
                    PoolConfig {
                        fee: 0,
                        tick_spacing: 100,
                        extension: Address::ZERO,
                    },
                ),
                BasePoolState {
                    sqrt_ratio: SQRT_RATIO_ONE,
                    liquidity: 1_000_000,
                    active_tick_index: Some(0),
                },
                ticks,
            )
            .unwrap(),
            active_tick: 0,
            checked_ticks_bounds: (-1000, 1000),
        })
    }

    #[test]
    fn slots_distinguish_not_loaded_from_missing() {
        let mut registry = PoolRegistry::new();
        let key = full_range_pool().key().clone();

        assert_eq!(registry.slot(&key), None);

        registry.track(&key);
        assert_eq!(registry.slot(&key), Some(&PoolSlot::NotLoaded));
        assert_eq!(registry.get(&key), None);

        registry.mark_missing(&key);
        assert_eq!(registry.slot(&key), Some(&PoolSlot::Missing));
        assert_eq!(registry.get(&key), None);

        registry.insert(full_range_pool());
        assert!(registry.get(&key).is_some());

        // tracking again does not demote the ready slot
        registry.track(&key);
        assert!(registry.get(&key).is_some());
    }

    #[test]
    fn pool_ids_for_pair_ignores_token_order() {
        let mut registry = PoolRegistry::new();
        registry.insert(full_range_pool());
        registry.insert(base_pool());

        let forward = registry.pool_ids_for_pair(Address::ZERO, token(1));
        let reverse = registry.pool_ids_for_pair(token(1), Address::ZERO);
        assert_eq!(forward.len(), 2);
        assert_eq!(
            {
                let mut ids = forward;
                ids.sort();
                ids
            },
            {
                let mut ids = reverse;
                ids.sort();
                ids
            }
        );

        assert!(registry.pool_ids_for_pair(token(1), token(2)).is_empty());
    }

    #[test]
    fn quote_drops_sizes_a_pool_cannot_serve() {
        let mut registry = PoolRegistry::new();
        registry.insert(full_range_pool());
        registry.insert(base_pool());

        let results = registry.quote(token(1), Address::ZERO, &[100, 10_000_000], 1);
        assert_eq!(results.len(), 2);

        let full_range_id = full_range_pool().key().string_id().to_string();
        let base_id = base_pool().key().string_id().to_string();

        for result in &results {
            if result.pool_id == full_range_id {
                // deep pool serves both sizes
                assert!(result.quotes.iter().all(Option::is_some));
            } else if result.pool_id == base_id {
                // the second size runs off the tracked tick window
                assert!(result.quotes[0].is_some());
                assert!(result.quotes[1].is_none());
            } else {
                panic!("unexpected pool id {}", result.pool_id);
            }
        }
    }

    #[test]
    fn liquidity_for_pair_reports_both_sides() {
        let mut registry = PoolRegistry::new();
        registry.insert(full_range_pool());

        let tvl = registry.liquidity_for_pair(Address::ZERO, token(1));
        assert_eq!(tvl.len(), 1);
        let (_, (amount0, amount1)) = &tvl[0];
        assert!(*amount0 > 0);
        assert!(*amount1 > 0);
    }
}
