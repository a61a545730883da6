pub mod base_pool;
pub mod full_range_pool;
pub mod mev_resist_pool;
pub mod oracle_pool;
pub mod twamm_pool;
pub mod types;
pub mod util;

use alloy_primitives::Address;
use thiserror::Error;
use types::PoolKey;

/// Errors shared by pool constructors.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum CommonPoolConstructionError {
    /// Token0 must be less than token1.
    #[error("token0 must be less than token1")]
    TokenOrderInvalid,
}

/// Errors shared by pool quote implementations.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum CommonPoolQuoteError {
    #[error("specified token not part of the pool")]
    InvalidToken,
}

/// Validates the `token0 < token1` invariant across pool types.
pub(crate) fn ensure_valid_token_order(key: &PoolKey) -> Result<(), CommonPoolConstructionError> {
    if key.token0 < key.token1 {
        Ok(())
    } else {
        Err(CommonPoolConstructionError::TokenOrderInvalid)
    }
}

/// Returns whether `token` is token1 of the pool, or an error if it is not
/// part of the pool at all.
pub(crate) fn is_token1(key: &PoolKey, token: Address) -> Result<bool, CommonPoolQuoteError> {
    if token == key.token1 {
        Ok(true)
    } else if token == key.token0 {
        Ok(false)
    } else {
        Err(CommonPoolQuoteError::InvalidToken)
    }
}
