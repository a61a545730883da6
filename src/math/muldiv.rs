use crate::math::uint::U256;
use ruint::{aliases::U512, UintTryFrom};
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum MuldivError {
    #[error("muldiv result does not fit in 256 bits")]
    Overflow,
    #[error("division by zero")]
    DenominatorZero,
}

/// Computes `x * y / d` at full 512-bit intermediate precision, optionally
/// rounding the quotient up.
pub fn muldiv(x: U256, y: U256, d: U256, round_up: bool) -> Result<U256, MuldivError> {
    if d.is_zero() {
        return Err(MuldivError::DenominatorZero);
    }

    let intermediate: U512 = U512::from(x) * U512::from(y);
    let (quotient, remainder) = intermediate.div_rem(U512::from(d));

    let result = if round_up && !remainder.is_zero() {
        quotient + U512::ONE
    } else {
        quotient
    };

    U256::uint_try_from(result).map_err(|_| MuldivError::Overflow)
}
