use crate::math::muldiv::muldiv;
use crate::math::swap::FEE_DENOMINATOR;
use crate::math::twamm::exp2::exp2;
use crate::math::uint::U256;
use num_traits::Zero;
use ruint::uint;

// 2 * log2(e) as a 32-bit fixed point scalar, folded together with the
// conversion of per-second sale rates out of their 32-bit fixed point.
const EXPONENT_SCALE: U256 = uint!(12392656037_U256);

// 64.0 in 64.64 fixed point; beyond this the exponential saturates and the
// price has converged onto the sale ratio.
const EXPONENT_LIMIT: U256 = uint!(0x400000000000000000_U256);

/// Closed form evolution of the pool price under two continuous sale flows
/// over `time_elapsed` seconds. The result always converges toward (and
/// never crosses) the sqrt of the sale ratio, and rounds in the direction of
/// price movement so repeated small steps cannot manufacture value.
pub fn calculate_next_sqrt_ratio(
    sqrt_ratio: U256,
    liquidity: u128,
    sale_rate_token0: u128,
    sale_rate_token1: u128,
    time_elapsed: u32,
    fee: u64,
) -> U256 {
    let sqrt_sale_ratio = compute_sqrt_sale_ratio_x128(sale_rate_token0, sale_rate_token1);

    let c = compute_c(sqrt_ratio, sqrt_sale_ratio);
    let c_sign_negative = sqrt_ratio > sqrt_sale_ratio;

    if c.is_zero() || liquidity.is_zero() {
        return sqrt_sale_ratio;
    }

    let sale_rate = ((U256::from(sale_rate_token1) * U256::from(sale_rate_token0)).root(2)
        * (FEE_DENOMINATOR - U256::from(fee)))
        / FEE_DENOMINATOR;

    let round_up = c_sign_negative;

    let exponent: U256 =
        (sale_rate * U256::from(time_elapsed) * EXPONENT_SCALE) / U256::from(liquidity);

    if exponent >= EXPONENT_LIMIT {
        return sqrt_sale_ratio;
    }

    let e_pow_exponent_x128 = U256::from(exp2(exponent.to::<u128>())) << 64;

    let mut sqrt_ratio_next = if c_sign_negative {
        muldiv(
            sqrt_sale_ratio,
            e_pow_exponent_x128 + c,
            e_pow_exponent_x128 - c,
            false,
        )
        .unwrap_or(sqrt_sale_ratio)
    } else {
        muldiv(
            sqrt_sale_ratio,
            e_pow_exponent_x128 - c,
            e_pow_exponent_x128 + c,
            false,
        )
        .unwrap_or(sqrt_sale_ratio)
    };

    // we should never exceed the sale ratio
    if round_up {
        sqrt_ratio_next = sqrt_ratio_next.max(sqrt_sale_ratio);
    } else {
        sqrt_ratio_next = sqrt_ratio_next.min(sqrt_sale_ratio);
    }

    sqrt_ratio_next
}

fn compute_sqrt_sale_ratio_x128(sale_rate_token0: u128, sale_rate_token1: u128) -> U256 {
    let sale_ratio: U256 = (U256::from(sale_rate_token1) << 128) / U256::from(sale_rate_token0);

    if sale_ratio < (U256::ONE << 128) {
        // full precision
        (sale_ratio << 128usize).root(2)
    } else if sale_ratio < (U256::ONE << 192) {
        // we know it only has 192 bits, so we can shift it 64 before rooting
        // to get more precision
        ((sale_ratio << 64usize).root(2)) << 32
    } else {
        ((sale_ratio << 16usize).root(2)) << 56
    }
}

fn compute_c(sqrt_ratio: U256, sqrt_sale_ratio: U256) -> U256 {
    muldiv(
        sqrt_sale_ratio.abs_diff(sqrt_ratio),
        U256::ONE << 128,
        sqrt_sale_ratio + sqrt_ratio,
        false,
    )
    .unwrap_or(U256::ZERO)
}
