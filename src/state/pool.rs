use crate::math::delta::{amount0_delta, amount1_delta, AmountDeltaError};
use crate::math::tick::{to_sqrt_ratio, MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use crate::math::uint::U256;
use crate::quoting::base_pool::{
    BasePool, BasePoolConstructionError, BasePoolQuoteError, BasePoolResources,
};
use crate::quoting::full_range_pool::{
    FullRangePool, FullRangePoolConstructionError, FullRangePoolQuoteError, FullRangePoolState,
};
use crate::quoting::mev_resist_pool::{MevResistPool, MevResistPoolConstructionError};
use crate::quoting::oracle_pool::OraclePool;
use crate::quoting::twamm_pool::{
    TwammPool, TwammPoolConstructionError, TwammPoolQuoteError, TwammSaleRateDelta,
};
use crate::quoting::types::{Pool, PoolKey, QuoteParams, Tick, TokenAmount};
use crate::quoting::util::find_nearest_initialized_tick_index;
use crate::state::events::{PoolEvent, PositionUpdatedEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Gas estimates per pool variant, used only to rank candidate routes.
const BASE_SWAP_GAS: u64 = 24_000;
const INITIALIZED_TICK_CROSS_GAS: u64 = 20_000;
const TICK_SPACING_CROSS_GAS: u64 = 4_000;
const ORACLE_SNAPSHOT_GAS: u64 = 15_000;
const MEV_RESIST_UPDATE_GAS: u64 = 20_000;
const VIRTUAL_ORDER_EXECUTION_GAS: u64 = 30_000;
const VIRTUAL_ORDER_DELTA_CROSS_GAS: u64 = 15_000;

/// A base pool snapshot together with the bookkeeping the event handlers
/// need: the current tick and the tick window that was actually fetched.
/// Events never widen the window; updates outside it fold into the
/// sentinel ticks at its bounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedBasePool {
    pub pool: BasePool,
    pub active_tick: i32,
    pub checked_ticks_bounds: (i32, i32),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedMevResistPool {
    pub pool: MevResistPool,
    pub checked_ticks_bounds: (i32, i32),
}

/// A pool snapshot of any variant, paired with the pure state transitions
/// driven by chain log events. Applying an event never mutates in place;
/// it builds a fresh snapshot through the variant's validating constructor
/// so a corrupt transition surfaces as an error instead of bad state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackedPool {
    Base(TrackedBasePool),
    FullRange(FullRangePool),
    Oracle(OraclePool),
    MevResist(TrackedMevResistPool),
    Twamm(TwammPool),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum ApplyEventError {
    /// The event type is never emitted for this pool variant; receiving it
    /// means logs were routed to the wrong pool.
    #[error("event does not apply to this pool variant")]
    UnsupportedEvent,
    #[error("order sell token is not one of the pool tokens")]
    UnknownOrderToken,
    #[error("liquidity delta moves pool liquidity out of range")]
    LiquidityOutOfRange,
    #[error("sale rate delta moves sale rates out of range")]
    SaleRateOutOfRange,
    #[error("rebuilding base pool")]
    Base(#[from] BasePoolConstructionError),
    #[error("rebuilding full range pool")]
    FullRange(#[from] FullRangePoolConstructionError),
    #[error("rebuilding mev-resist pool")]
    MevResist(#[from] MevResistPoolConstructionError),
    #[error("rebuilding twamm pool")]
    Twamm(#[from] TwammPoolConstructionError),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum TrackedQuoteError {
    #[error(transparent)]
    Base(#[from] BasePoolQuoteError),
    #[error(transparent)]
    FullRange(#[from] FullRangePoolQuoteError),
    #[error(transparent)]
    Twamm(#[from] TwammPoolQuoteError),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum ComputeTvlError {
    #[error("tick {0} has no valid price")]
    InvalidTick(i32),
    #[error("token amount overflows")]
    AmountOverflow,
    #[error(transparent)]
    Delta(#[from] AmountDeltaError),
}

/// The shape of a single quote as consumed by the aggregator: amounts plus
/// a gas estimate and the tick-search width hint for calldata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PoolSwapQuote {
    pub consumed_amount: i128,
    pub calculated_amount: u128,
    pub gas_consumed: u64,
    pub skip_ahead: u32,
}

impl TrackedPool {
    pub fn key(&self) -> &PoolKey {
        match self {
            TrackedPool::Base(t) => t.pool.key(),
            TrackedPool::FullRange(p) => p.key(),
            TrackedPool::Oracle(p) => p.key(),
            TrackedPool::MevResist(t) => t.pool.key(),
            TrackedPool::Twamm(p) => p.key(),
        }
    }

    pub fn has_liquidity(&self) -> bool {
        match self {
            TrackedPool::Base(t) => t.pool.has_liquidity(),
            TrackedPool::FullRange(p) => p.has_liquidity(),
            TrackedPool::Oracle(p) => p.has_liquidity(),
            TrackedPool::MevResist(t) => t.pool.has_liquidity(),
            TrackedPool::Twamm(p) => p.has_liquidity(),
        }
    }

    /// Derives the next snapshot from `event`. `block_time` is the
    /// timestamp of the block the event was emitted in; the oracle,
    /// MEV-resist and TWAMM variants fold it into their time bookkeeping.
    pub fn apply(&self, event: &PoolEvent, block_time: u64) -> Result<Self, ApplyEventError> {
        match (self, event) {
            (TrackedPool::Base(t), PoolEvent::Swapped(ev)) => {
                let ticks = t.pool.ticks().to_vec();
                let active_tick_index = find_nearest_initialized_tick_index(&ticks, ev.tick_after);
                let mut state = t.pool.state();
                state.sqrt_ratio = ev.sqrt_ratio_after;
                state.liquidity = ev.liquidity_after;
                state.active_tick_index = active_tick_index;

                Ok(TrackedPool::Base(TrackedBasePool {
                    pool: BasePool::new(t.pool.key().clone(), state, ticks)?,
                    active_tick: ev.tick_after,
                    checked_ticks_bounds: t.checked_ticks_bounds,
                }))
            }
            (TrackedPool::Base(t), PoolEvent::PositionUpdated(ev)) => {
                Ok(TrackedPool::Base(TrackedBasePool {
                    pool: base_pool_after_position_update(
                        &t.pool,
                        t.active_tick,
                        t.checked_ticks_bounds,
                        ev,
                    )?,
                    active_tick: t.active_tick,
                    checked_ticks_bounds: t.checked_ticks_bounds,
                }))
            }
            (TrackedPool::FullRange(p), PoolEvent::Swapped(ev)) => {
                Ok(TrackedPool::FullRange(FullRangePool::new(
                    p.key().clone(),
                    FullRangePoolState {
                        sqrt_ratio: ev.sqrt_ratio_after,
                        liquidity: ev.liquidity_after,
                    },
                )?))
            }
            (TrackedPool::FullRange(p), PoolEvent::PositionUpdated(ev)) => {
                if ev.liquidity_delta == 0 {
                    return Ok(self.clone());
                }
                let mut state = p.state();
                state.liquidity = apply_liquidity_delta(state.liquidity, ev.liquidity_delta)
                    .ok_or(ApplyEventError::LiquidityOutOfRange)?;
                Ok(TrackedPool::FullRange(FullRangePool::new(
                    p.key().clone(),
                    state,
                )?))
            }
            (TrackedPool::Oracle(p), PoolEvent::Swapped(ev)) => {
                let key = p.key();
                Ok(TrackedPool::Oracle(OraclePool::new(
                    key.token0,
                    key.token1,
                    key.config.extension,
                    ev.sqrt_ratio_after,
                    ev.liquidity_after,
                    block_time,
                )?))
            }
            (TrackedPool::Oracle(p), PoolEvent::PositionUpdated(ev)) => {
                if ev.liquidity_delta == 0 {
                    return Ok(self.clone());
                }
                let key = p.key();
                let state = p.state();
                let liquidity =
                    apply_liquidity_delta(state.full_range_pool_state.liquidity, ev.liquidity_delta)
                        .ok_or(ApplyEventError::LiquidityOutOfRange)?;
                Ok(TrackedPool::Oracle(OraclePool::new(
                    key.token0,
                    key.token1,
                    key.config.extension,
                    state.full_range_pool_state.sqrt_ratio,
                    liquidity,
                    state.last_snapshot_time,
                )?))
            }
            (TrackedPool::MevResist(t), PoolEvent::Swapped(ev)) => {
                let base = t.pool.base_pool();
                let ticks = base.ticks().to_vec();
                let mut state = base.state();
                state.sqrt_ratio = ev.sqrt_ratio_after;
                state.liquidity = ev.liquidity_after;
                state.active_tick_index =
                    find_nearest_initialized_tick_index(&ticks, ev.tick_after);

                Ok(TrackedPool::MevResist(TrackedMevResistPool {
                    pool: MevResistPool::new(
                        BasePool::new(base.key().clone(), state, ticks)?,
                        block_time,
                        ev.tick_after,
                    )?,
                    checked_ticks_bounds: t.checked_ticks_bounds,
                }))
            }
            (TrackedPool::MevResist(t), PoolEvent::PositionUpdated(ev)) => {
                let tick = t.pool.tick();
                Ok(TrackedPool::MevResist(TrackedMevResistPool {
                    pool: MevResistPool::new(
                        base_pool_after_position_update(
                            t.pool.base_pool(),
                            tick,
                            t.checked_ticks_bounds,
                            ev,
                        )?,
                        t.pool.state().last_update_time,
                        tick,
                    )?,
                    checked_ticks_bounds: t.checked_ticks_bounds,
                }))
            }
            (TrackedPool::Twamm(p), PoolEvent::Swapped(ev)) => {
                let state = p.state();
                Ok(TrackedPool::Twamm(rebuild_twamm(
                    p.key(),
                    ev.sqrt_ratio_after,
                    ev.liquidity_after,
                    state.last_execution_time,
                    state.token0_sale_rate,
                    state.token1_sale_rate,
                    p.sale_rate_deltas().to_vec(),
                )?))
            }
            (TrackedPool::Twamm(p), PoolEvent::PositionUpdated(ev)) => {
                if ev.liquidity_delta == 0 {
                    return Ok(self.clone());
                }
                let state = p.state();
                let liquidity =
                    apply_liquidity_delta(state.full_range_pool_state.liquidity, ev.liquidity_delta)
                        .ok_or(ApplyEventError::LiquidityOutOfRange)?;
                Ok(TrackedPool::Twamm(rebuild_twamm(
                    p.key(),
                    state.full_range_pool_state.sqrt_ratio,
                    liquidity,
                    state.last_execution_time,
                    state.token0_sale_rate,
                    state.token1_sale_rate,
                    p.sale_rate_deltas().to_vec(),
                )?))
            }
            (TrackedPool::Twamm(p), PoolEvent::VirtualOrdersExecuted(ev)) => {
                // the reported rates are authoritative; deltas at or before
                // the execution time are already folded into them
                let state = p.state();
                let deltas = p
                    .sale_rate_deltas()
                    .iter()
                    .copied()
                    .filter(|d| d.time > block_time)
                    .collect();
                Ok(TrackedPool::Twamm(rebuild_twamm(
                    p.key(),
                    state.full_range_pool_state.sqrt_ratio,
                    state.full_range_pool_state.liquidity,
                    block_time,
                    ev.token0_sale_rate,
                    ev.token1_sale_rate,
                    deltas,
                )?))
            }
            (TrackedPool::Twamm(p), PoolEvent::OrderUpdated(ev)) => {
                let key = p.key();
                let is_token1 = if ev.sell_token == key.token1 {
                    true
                } else if ev.sell_token == key.token0 {
                    false
                } else {
                    return Err(ApplyEventError::UnknownOrderToken);
                };

                let state = p.state();
                let (mut sr0, mut sr1) = (state.token0_sale_rate, state.token1_sale_rate);
                let mut deltas = p.sale_rate_deltas().to_vec();

                let negated = ev
                    .sale_rate_delta
                    .checked_neg()
                    .ok_or(ApplyEventError::SaleRateOutOfRange)?;

                if ev.start_time <= state.last_execution_time {
                    // already selling; the live rate changes immediately
                    let rate = if is_token1 { &mut sr1 } else { &mut sr0 };
                    *rate = apply_signed_to_rate(*rate, ev.sale_rate_delta)
                        .ok_or(ApplyEventError::SaleRateOutOfRange)?;
                } else {
                    add_sale_rate_delta(&mut deltas, ev.start_time, ev.sale_rate_delta, is_token1)?;
                }
                add_sale_rate_delta(&mut deltas, ev.end_time, negated, is_token1)?;

                Ok(TrackedPool::Twamm(rebuild_twamm(
                    key,
                    state.full_range_pool_state.sqrt_ratio,
                    state.full_range_pool_state.liquidity,
                    state.last_execution_time,
                    sr0,
                    sr1,
                    deltas,
                )?))
            }
            _ => Err(ApplyEventError::UnsupportedEvent),
        }
    }

    /// Quotes `token_amount` against this snapshot and shapes the result
    /// for the aggregator. A partial fill (`consumed_amount` short of the
    /// requested amount) means the tracked liquidity cannot serve the size
    /// and the caller should exclude the pool, not an error.
    pub fn quote(
        &self,
        token_amount: TokenAmount,
        block_time: u64,
    ) -> Result<PoolSwapQuote, TrackedQuoteError> {
        Ok(match self {
            TrackedPool::Base(t) => {
                let quote = t.pool.quote(QuoteParams {
                    token_amount,
                    sqrt_ratio_limit: None,
                    override_state: None,
                    meta: (),
                })?;
                let resources = quote.execution_resources;
                PoolSwapQuote {
                    consumed_amount: quote.consumed_amount,
                    calculated_amount: quote.calculated_amount,
                    gas_consumed: base_gas(&resources),
                    skip_ahead: skip_ahead(&resources),
                }
            }
            TrackedPool::FullRange(p) => {
                let quote = p.quote(QuoteParams {
                    token_amount,
                    sqrt_ratio_limit: None,
                    override_state: None,
                    meta: (),
                })?;
                PoolSwapQuote {
                    consumed_amount: quote.consumed_amount,
                    calculated_amount: quote.calculated_amount,
                    gas_consumed: BASE_SWAP_GAS,
                    skip_ahead: 0,
                }
            }
            TrackedPool::Oracle(p) => {
                let quote = p.quote(QuoteParams {
                    token_amount,
                    sqrt_ratio_limit: None,
                    override_state: None,
                    meta: block_time,
                })?;
                PoolSwapQuote {
                    consumed_amount: quote.consumed_amount,
                    calculated_amount: quote.calculated_amount,
                    gas_consumed: BASE_SWAP_GAS
                        + u64::from(quote.execution_resources.snapshots_written)
                            * ORACLE_SNAPSHOT_GAS,
                    skip_ahead: 0,
                }
            }
            TrackedPool::MevResist(t) => {
                let quote = t.pool.quote(QuoteParams {
                    token_amount,
                    sqrt_ratio_limit: None,
                    override_state: None,
                    meta: block_time,
                })?;
                let resources = quote.execution_resources;
                PoolSwapQuote {
                    consumed_amount: quote.consumed_amount,
                    calculated_amount: quote.calculated_amount,
                    gas_consumed: base_gas(&resources.base)
                        + u64::from(resources.mev_resist.state_update_count)
                            * MEV_RESIST_UPDATE_GAS,
                    skip_ahead: skip_ahead(&resources.base),
                }
            }
            TrackedPool::Twamm(p) => {
                let quote = p.quote(QuoteParams {
                    token_amount,
                    sqrt_ratio_limit: None,
                    override_state: None,
                    meta: block_time,
                })?;
                let resources = quote.execution_resources;
                PoolSwapQuote {
                    consumed_amount: quote.consumed_amount,
                    calculated_amount: quote.calculated_amount,
                    gas_consumed: BASE_SWAP_GAS
                        + u64::from(resources.virtual_orders_executed)
                            * VIRTUAL_ORDER_EXECUTION_GAS
                        + u64::from(resources.virtual_order_delta_times_crossed)
                            * VIRTUAL_ORDER_DELTA_CROSS_GAS,
                    skip_ahead: 0,
                }
            }
        })
    }

    /// Total amounts of token0 and token1 deposited in the pool, for
    /// liquidity ranking. Pure function of the snapshot.
    pub fn compute_tvl(&self) -> Result<(u128, u128), ComputeTvlError> {
        match self {
            TrackedPool::Base(t) => base_tvl(&t.pool),
            TrackedPool::MevResist(t) => base_tvl(t.pool.base_pool()),
            TrackedPool::FullRange(p) => {
                let state = p.state();
                full_range_tvl(state.sqrt_ratio, state.liquidity)
            }
            TrackedPool::Oracle(p) => {
                let state = p.state().full_range_pool_state;
                full_range_tvl(state.sqrt_ratio, state.liquidity)
            }
            TrackedPool::Twamm(p) => {
                let state = p.state().full_range_pool_state;
                full_range_tvl(state.sqrt_ratio, state.liquidity)
            }
        }
    }
}

fn base_gas(resources: &BasePoolResources) -> u64 {
    BASE_SWAP_GAS
        + u64::from(resources.initialized_ticks_crossed) * INITIALIZED_TICK_CROSS_GAS
        + u64::from(resources.tick_spacings_crossed) * TICK_SPACING_CROSS_GAS
}

fn skip_ahead(resources: &BasePoolResources) -> u32 {
    resources.tick_spacings_crossed / resources.initialized_ticks_crossed.max(1)
}

fn apply_liquidity_delta(liquidity: u128, delta: i128) -> Option<u128> {
    if delta < 0 {
        liquidity.checked_sub(delta.unsigned_abs())
    } else {
        liquidity.checked_add(delta.unsigned_abs())
    }
}

fn apply_signed_to_rate(rate: u128, delta: i128) -> Option<u128> {
    apply_liquidity_delta(rate, delta)
}

/// Folds `delta` into the tick at `index`, clamped into the checked
/// window. A tick whose delta nets to zero is dropped unless it is one of
/// the window sentinels.
fn update_tick(
    ticks: &mut Vec<Tick>,
    index: i32,
    delta: i128,
    (low, high): (i32, i32),
) -> Result<(), ApplyEventError> {
    let index = index.clamp(low, high);
    match ticks.binary_search_by_key(&index, |t| t.index) {
        Ok(i) => {
            ticks[i].liquidity_delta = ticks[i]
                .liquidity_delta
                .checked_add(delta)
                .ok_or(ApplyEventError::LiquidityOutOfRange)?;
            if ticks[i].liquidity_delta == 0 && index != low && index != high {
                ticks.remove(i);
            }
        }
        Err(i) => {
            if delta != 0 {
                ticks.insert(
                    i,
                    Tick {
                        index,
                        liquidity_delta: delta,
                    },
                );
            }
        }
    }
    Ok(())
}

fn base_pool_after_position_update(
    pool: &BasePool,
    active_tick: i32,
    bounds: (i32, i32),
    ev: &PositionUpdatedEvent,
) -> Result<BasePool, ApplyEventError> {
    if ev.liquidity_delta == 0 {
        return Ok(pool.clone());
    }

    let negated = ev
        .liquidity_delta
        .checked_neg()
        .ok_or(ApplyEventError::LiquidityOutOfRange)?;

    let mut ticks = pool.ticks().to_vec();
    update_tick(&mut ticks, ev.lower_tick, ev.liquidity_delta, bounds)?;
    update_tick(&mut ticks, ev.upper_tick, negated, bounds)?;

    let mut state = pool.state();
    if (ev.lower_tick..ev.upper_tick).contains(&active_tick) {
        state.liquidity = apply_liquidity_delta(state.liquidity, ev.liquidity_delta)
            .ok_or(ApplyEventError::LiquidityOutOfRange)?;
    }
    state.active_tick_index = find_nearest_initialized_tick_index(&ticks, active_tick);

    Ok(BasePool::new(pool.key().clone(), state, ticks)?)
}

#[allow(clippy::too_many_arguments)]
fn rebuild_twamm(
    key: &PoolKey,
    sqrt_ratio: U256,
    liquidity: u128,
    last_execution_time: u64,
    token0_sale_rate: u128,
    token1_sale_rate: u128,
    deltas: Vec<TwammSaleRateDelta>,
) -> Result<TwammPool, TwammPoolConstructionError> {
    TwammPool::new(
        key.token0,
        key.token1,
        key.config.fee,
        key.config.extension,
        sqrt_ratio,
        liquidity,
        last_execution_time,
        token0_sale_rate,
        token1_sale_rate,
        deltas,
    )
}

fn add_sale_rate_delta(
    deltas: &mut Vec<TwammSaleRateDelta>,
    time: u64,
    delta: i128,
    is_token1: bool,
) -> Result<(), ApplyEventError> {
    let (delta0, delta1) = if is_token1 { (0, delta) } else { (delta, 0) };
    match deltas.binary_search_by_key(&time, |d| d.time) {
        Ok(i) => {
            let entry = &mut deltas[i];
            entry.sale_rate_delta0 = entry
                .sale_rate_delta0
                .checked_add(delta0)
                .ok_or(ApplyEventError::SaleRateOutOfRange)?;
            entry.sale_rate_delta1 = entry
                .sale_rate_delta1
                .checked_add(delta1)
                .ok_or(ApplyEventError::SaleRateOutOfRange)?;
            if entry.sale_rate_delta0 == 0 && entry.sale_rate_delta1 == 0 {
                deltas.remove(i);
            }
        }
        Err(i) => deltas.insert(
            i,
            TwammSaleRateDelta {
                time,
                sale_rate_delta0: delta0,
                sale_rate_delta1: delta1,
            },
        ),
    }
    Ok(())
}

fn full_range_tvl(sqrt_ratio: U256, liquidity: u128) -> Result<(u128, u128), ComputeTvlError> {
    let sqrt_ratio = sqrt_ratio.clamp(MIN_SQRT_RATIO, MAX_SQRT_RATIO);
    Ok((
        amount0_delta(sqrt_ratio, MAX_SQRT_RATIO, liquidity, false)?,
        amount1_delta(MIN_SQRT_RATIO, sqrt_ratio, liquidity, false)?,
    ))
}

fn base_tvl(pool: &BasePool) -> Result<(u128, u128), ComputeTvlError> {
    let sqrt_ratio = pool.state().sqrt_ratio;
    let mut liquidity: u128 = 0;
    let (mut total0, mut total1) = (0u128, 0u128);

    for segment in pool.ticks().windows(2) {
        liquidity = apply_liquidity_delta(liquidity, segment[0].liquidity_delta)
            .ok_or(ComputeTvlError::AmountOverflow)?;

        let lower = to_sqrt_ratio(segment[0].index)
            .ok_or(ComputeTvlError::InvalidTick(segment[0].index))?;
        let upper = to_sqrt_ratio(segment[1].index)
            .ok_or(ComputeTvlError::InvalidTick(segment[1].index))?;

        let (amount0, amount1) = if sqrt_ratio <= lower {
            (amount0_delta(lower, upper, liquidity, false)?, 0)
        } else if sqrt_ratio >= upper {
            (0, amount1_delta(lower, upper, liquidity, false)?)
        } else {
            (
                amount0_delta(sqrt_ratio, upper, liquidity, false)?,
                amount1_delta(lower, sqrt_ratio, liquidity, false)?,
            )
        };

        total0 = total0
            .checked_add(amount0)
            .ok_or(ComputeTvlError::AmountOverflow)?;
        total1 = total1
            .checked_add(amount1)
            .ok_or(ComputeTvlError::AmountOverflow)?;
    }

    Ok((total0, total1))
}
