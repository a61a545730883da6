use crate::math::tick::{MAX_TICK, MIN_TICK};
use crate::math::uint::{u256_to_float_base_x128, U256};
use crate::quoting::types::Tick;
use thiserror::Error;

/// Binary search for the greatest initialized tick at or below `tick`.
/// Returns `None` if `tick` is below every entry.
pub fn find_nearest_initialized_tick_index(sorted_ticks: &[Tick], tick: i32) -> Option<usize> {
    let mut l = 0usize;
    let mut r = sorted_ticks.len();

    while l < r {
        let mid = (l + r) / 2;
        let mid_tick = sorted_ticks[mid].index;
        if mid_tick <= tick {
            if mid == sorted_ticks.len() - 1 || sorted_ticks[mid + 1].index > tick {
                return Some(mid);
            } else {
                l = mid;
            }
        } else {
            r = mid;
        }
    }

    None
}

const LOG_BASE_SQRT_TICK_SIZE: f64 = 4.9999975000016666654166676666658333340476184226196031741031750577196410537756684185262518589393595459766211405607685305832e-7;

/// Estimates how many tick spacings lie between two prices. Used to bound
/// skip-ahead search width and for gas estimation, never for exact indexing.
pub fn approximate_number_of_tick_spacings_crossed(
    starting_sqrt_ratio: U256,
    ending_sqrt_ratio: U256,
    tick_spacing: u32,
) -> u32 {
    let start: f64 = u256_to_float_base_x128(starting_sqrt_ratio);
    let end: f64 = u256_to_float_base_x128(ending_sqrt_ratio);
    let ticks_crossed = ((start.ln() - end.ln()).abs() / LOG_BASE_SQRT_TICK_SIZE) as u32;
    ticks_crossed / tick_spacing
}

/// Normalizes a tick array in place so tick-crossing walks can never run off
/// the tracked range:
/// - sentinel entries exist at both checked bounds (zero delta allowed),
/// - the cumulative liquidity at `active_tick` equals `liquidity`,
/// - all deltas sum to zero,
/// - zero-delta entries strictly inside the bounds are dropped.
///
/// Calling this twice on an already-normalized array is a no-op.
pub fn add_liquidity_cutoffs(
    sorted_ticks: &mut Vec<Tick>,
    liquidity: u128,
    active_tick: i32,
    checked_ticks_bounds: (i32, i32),
) {
    let (low, high) = checked_ticks_bounds;

    if sorted_ticks.first().map_or(true, |t| t.index > low) {
        sorted_ticks.insert(
            0,
            Tick {
                index: low,
                liquidity_delta: 0,
            },
        );
    }
    if sorted_ticks.last().map_or(true, |t| t.index < high) {
        sorted_ticks.push(Tick {
            index: high,
            liquidity_delta: 0,
        });
    }

    let mut cumulative: i128 = 0;
    let mut active_entry: Option<usize> = None;
    for (i, tick) in sorted_ticks.iter().enumerate() {
        if tick.index > active_tick {
            break;
        }
        active_entry = Some(i);
        cumulative += tick.liquidity_delta;
    }

    // fold any mismatch between the reported liquidity and the partial tick
    // data into the low sentinel, which sits at or below the active tick
    let diff = liquidity as i128 - cumulative;
    if diff != 0 && active_entry.is_some() {
        sorted_ticks[0].liquidity_delta += diff;
    }

    let total: i128 = sorted_ticks.iter().map(|t| t.liquidity_delta).sum();
    if total != 0 {
        let last = sorted_ticks.len() - 1;
        sorted_ticks[last].liquidity_delta -= total;
    }

    sorted_ticks.retain(|t| t.liquidity_delta != 0 || t.index == low || t.index == high);
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum ConstructSortedTicksError {
    #[error("tick spacing must be non-zero")]
    ZeroTickSpacing,
}

fn floor_to_spacing(tick: i32, spacing: i32) -> i32 {
    tick.div_euclid(spacing) * spacing
}

fn ceil_to_spacing(tick: i32, spacing: i32) -> i32 {
    let floored = tick.div_euclid(spacing) * spacing;
    if floored == tick {
        tick
    } else {
        floored + spacing
    }
}

/// Converts a partial view of tick data fetched from a quote data lens into
/// a valid sentinel-bounded tick array: sorted, deduplicated, aligned to
/// `tick_spacing` and balanced so the pool constructor's liquidity
/// conservation checks hold.
pub fn construct_sorted_ticks(
    partial_ticks: Vec<Tick>,
    min_tick_searched: i32,
    max_tick_searched: i32,
    tick_spacing: u32,
    liquidity: u128,
    current_tick: i32,
) -> Result<Vec<Tick>, ConstructSortedTicksError> {
    if tick_spacing == 0 {
        return Err(ConstructSortedTicksError::ZeroTickSpacing);
    }
    let spacing = tick_spacing as i32;

    // bounds of spacing-aligned ticks representable on this pool
    let min_aligned = ceil_to_spacing(MIN_TICK, spacing);
    let max_aligned = floor_to_spacing(MAX_TICK, spacing);

    let low = floor_to_spacing(min_tick_searched, spacing).clamp(min_aligned, max_aligned);
    let high = ceil_to_spacing(max_tick_searched, spacing).clamp(min_aligned, max_aligned);

    let mut ticks = partial_ticks;
    ticks.sort_by_key(|t| t.index);

    let mut i = 0;
    while i + 1 < ticks.len() {
        if ticks[i].index == ticks[i + 1].index {
            ticks[i].liquidity_delta += ticks[i + 1].liquidity_delta;
            ticks.remove(i + 1);
        } else {
            i += 1;
        }
    }

    add_liquidity_cutoffs(&mut ticks, liquidity, current_tick, (low, high));

    Ok(ticks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};

    fn ticks(entries: &[(i32, i128)]) -> Vec<Tick> {
        entries
            .iter()
            .map(|&(index, liquidity_delta)| Tick {
                index,
                liquidity_delta,
            })
            .collect()
    }

    mod find_nearest {
        use super::*;

        #[test]
        fn no_ticks() {
            assert_eq!(find_nearest_initialized_tick_index(&[], 0), None);
        }

        #[test]
        fn one_tick_less_than() {
            assert_eq!(
                find_nearest_initialized_tick_index(&ticks(&[(-1, 1)]), 0),
                Some(0)
            );
        }

        #[test]
        fn one_tick_equal_to() {
            assert_eq!(
                find_nearest_initialized_tick_index(&ticks(&[(0, 1)]), 0),
                Some(0)
            );
        }

        #[test]
        fn one_tick_greater_than() {
            assert_eq!(
                find_nearest_initialized_tick_index(&ticks(&[(1, 1)]), 0),
                None
            );
        }

        #[test]
        fn many_ticks() {
            let sorted_ticks = ticks(&[(-100, 0), (-5, 0), (-4, 0), (18, 0), (23, 0), (50, 0)]);

            for (tick, expected) in [
                (-101, None),
                (-100, Some(0)),
                (-99, Some(0)),
                (-6, Some(0)),
                (-5, Some(1)),
                (-4, Some(2)),
                (-3, Some(2)),
                (0, Some(2)),
                (17, Some(2)),
                (18, Some(3)),
                (19, Some(3)),
                (22, Some(3)),
                (23, Some(4)),
                (24, Some(4)),
                (49, Some(4)),
                (50, Some(5)),
                (51, Some(5)),
            ] {
                assert_eq!(
                    find_nearest_initialized_tick_index(&sorted_ticks, tick),
                    expected
                );
            }
        }
    }

    mod tick_spacings_crossed {
        use super::*;

        #[test]
        fn doubling() {
            // 2x sqrt ratio increase ~= 4x price increase
            assert_eq!(
                approximate_number_of_tick_spacings_crossed(
                    U256::from_limbs([0, 0, 1, 0]),
                    U256::from_limbs([0, 0, 2, 0]),
                    1
                ),
                1386295
            );
            assert_eq!(
                approximate_number_of_tick_spacings_crossed(
                    MIN_SQRT_RATIO,
                    MIN_SQRT_RATIO * U256::from(2u8),
                    1
                ),
                1386295
            );
            assert_eq!(
                approximate_number_of_tick_spacings_crossed(
                    MAX_SQRT_RATIO,
                    MAX_SQRT_RATIO / U256::from(2u8),
                    1
                ),
                1386295
            );
        }

        #[test]
        fn doubling_big_tick_spacing() {
            assert_eq!(
                approximate_number_of_tick_spacings_crossed(
                    U256::from_limbs([0, 0, 1, 0]),
                    U256::from_limbs([0, 0, 2, 0]),
                    5
                ),
                277259
            );
            assert_eq!(
                approximate_number_of_tick_spacings_crossed(
                    MIN_SQRT_RATIO,
                    MIN_SQRT_RATIO * U256::from(2u8),
                    3
                ),
                462098
            );
            assert_eq!(
                approximate_number_of_tick_spacings_crossed(
                    MAX_SQRT_RATIO,
                    MAX_SQRT_RATIO / U256::from(2u8),
                    200
                ),
                6931
            );
        }
    }

    mod liquidity_cutoffs {
        use super::*;

        #[test]
        fn empty_ticks_get_sentinels() {
            let mut sorted_ticks = Vec::new();
            add_liquidity_cutoffs(&mut sorted_ticks, 1_000, 0, (-100, 100));
            assert_eq!(sorted_ticks, ticks(&[(-100, 1_000), (100, -1_000)]));
        }

        #[test]
        fn zero_liquidity_keeps_zero_sentinels() {
            let mut sorted_ticks = Vec::new();
            add_liquidity_cutoffs(&mut sorted_ticks, 0, 0, (-100, 100));
            assert_eq!(sorted_ticks, ticks(&[(-100, 0), (100, 0)]));
        }

        #[test]
        fn balances_partial_data_to_reported_liquidity() {
            let mut sorted_ticks = ticks(&[(-50, 500), (50, -500)]);
            add_liquidity_cutoffs(&mut sorted_ticks, 800, 0, (-100, 100));
            assert_eq!(
                sorted_ticks,
                ticks(&[(-100, 300), (-50, 500), (50, -500), (100, -300)])
            );
        }

        #[test]
        fn idempotent_on_normalized_array() {
            let mut sorted_ticks = ticks(&[(-50, 500), (50, -500)]);
            add_liquidity_cutoffs(&mut sorted_ticks, 800, 0, (-100, 100));
            let normalized = sorted_ticks.clone();
            add_liquidity_cutoffs(&mut sorted_ticks, 800, 0, (-100, 100));
            assert_eq!(sorted_ticks, normalized);
        }

        #[test]
        fn drops_zeroed_interior_ticks() {
            let mut sorted_ticks = ticks(&[(-50, 0), (0, 1_000), (50, -1_000)]);
            add_liquidity_cutoffs(&mut sorted_ticks, 1_000, 25, (-100, 100));
            assert_eq!(
                sorted_ticks,
                ticks(&[(-100, 0), (0, 1_000), (50, -1_000), (100, 0)])
            );
        }
    }

    mod construct {
        use super::*;

        #[test]
        fn rejects_zero_spacing() {
            assert_eq!(
                construct_sorted_ticks(vec![], 0, 0, 0, 0, 0),
                Err(ConstructSortedTicksError::ZeroTickSpacing)
            );
        }

        #[test]
        fn bounds_are_rounded_to_spacing() {
            let result = construct_sorted_ticks(vec![], -151, 149, 100, 777, 0).unwrap();
            assert_eq!(result, ticks(&[(-200, 777), (200, -777)]));
        }

        #[test]
        fn merges_duplicates_and_sorts() {
            let result = construct_sorted_ticks(
                ticks(&[(100, -300), (-100, 500), (100, -200)]),
                -100,
                100,
                100,
                500,
                0,
            )
            .unwrap();
            assert_eq!(result, ticks(&[(-100, 500), (100, -500)]));
        }

        #[test]
        fn output_passes_through_unchanged_when_already_valid() {
            let input = ticks(&[(-200, 1_000), (200, -1_000)]);
            let result =
                construct_sorted_ticks(input.clone(), -200, 200, 100, 1_000, 0).unwrap();
            assert_eq!(result, input);
        }
    }
}
