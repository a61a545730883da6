use crate::math::uint::U256;
use crate::private;
use alloy_primitives::{keccak256, Address, B256};
use core::fmt::Debug;
use core::hash::{Hash, Hasher};
use core::ops::Add;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Timestamp of the block a quote is evaluated against, in seconds.
pub type BlockTimestamp = u64;

/// Fee and strategy configuration of a pool. `tick_spacing` is zero for
/// full-range pools; `extension` is the zero address for vanilla pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Swap fee as a 64-bit fixed point fraction of 2^64.
    pub fee: u64,
    pub tick_spacing: u32,
    /// Address of the extension contract governing the pool's quoting
    /// strategy, or zero for a vanilla pool.
    pub extension: Address,
}

/// Unique identifier for a pool: the ordered token pair plus its config.
///
/// The derived string and numeric ids are computed on first use and cached,
/// so a key that is used repeatedly as a lookup key pays the formatting and
/// hashing cost once.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolKey {
    pub token0: Address,
    pub token1: Address,
    pub config: PoolConfig,
    #[serde(skip)]
    string_id: OnceLock<String>,
    #[serde(skip)]
    numeric_id: OnceLock<B256>,
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, Error)]
pub enum PoolKeyParseError {
    #[error("expected 5 underscore-separated fields")]
    WrongFieldCount,
    #[error("invalid address field")]
    InvalidAddress,
    #[error("invalid fee field")]
    InvalidFee,
    #[error("invalid tick spacing field")]
    InvalidTickSpacing,
    #[error("token0 must be less than token1")]
    TokenOrderInvalid,
}

impl PoolKey {
    /// Builds a key from an unordered token pair, canonicalizing so that
    /// `token0 < token1`.
    pub fn new(token_a: Address, token_b: Address, config: PoolConfig) -> Self {
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        PoolKey {
            token0,
            token1,
            config,
            string_id: OnceLock::new(),
            numeric_id: OnceLock::new(),
        }
    }

    /// Compact human-readable id, used as the cache/lookup key for this pool.
    pub fn string_id(&self) -> &str {
        self.string_id.get_or_init(|| {
            format!(
                "{:#x}_{:#x}_{:#x}_{}_{:#x}",
                self.token0,
                self.token1,
                self.config.fee,
                self.config.tick_spacing,
                self.config.extension
            )
        })
    }

    /// The pool id as reported by on-chain events: the keccak256 hash of the
    /// ABI encoding of `(token0, token1, compressed_config)`.
    pub fn numeric_id(&self) -> B256 {
        *self.numeric_id.get_or_init(|| {
            let mut buf = [0u8; 96];
            buf[12..32].copy_from_slice(self.token0.as_slice());
            buf[44..64].copy_from_slice(self.token1.as_slice());
            buf[64..96].copy_from_slice(&self.compressed_config().to_be_bytes::<32>());
            keccak256(buf)
        })
    }

    /// The config packed into a single 32-byte word the way the core
    /// contract stores it: `tick_spacing | fee << 32 | extension << 96`.
    pub fn compressed_config(&self) -> U256 {
        (U256::from_be_slice(self.config.extension.as_slice()) << 96)
            | (U256::from(self.config.fee) << 32)
            | U256::from(self.config.tick_spacing)
    }

    /// Parses a key back out of its [`string_id`](Self::string_id) form.
    pub fn from_string_id(id: &str) -> Result<Self, PoolKeyParseError> {
        let mut fields = id.split('_');
        let token0 = parse_address(fields.next())?;
        let token1 = parse_address(fields.next())?;
        let fee = fields
            .next()
            .and_then(|s| s.strip_prefix("0x"))
            .and_then(|s| u64::from_str_radix(s, 16).ok())
            .ok_or(PoolKeyParseError::InvalidFee)?;
        let tick_spacing = fields
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or(PoolKeyParseError::InvalidTickSpacing)?;
        let extension = parse_address(fields.next())?;

        if fields.next().is_some() {
            return Err(PoolKeyParseError::WrongFieldCount);
        }
        if token0 >= token1 {
            return Err(PoolKeyParseError::TokenOrderInvalid);
        }

        Ok(PoolKey::new(
            token0,
            token1,
            PoolConfig {
                fee,
                tick_spacing,
                extension,
            },
        ))
    }
}

fn parse_address(field: Option<&str>) -> Result<Address, PoolKeyParseError> {
    field
        .ok_or(PoolKeyParseError::WrongFieldCount)?
        .parse()
        .map_err(|_| PoolKeyParseError::InvalidAddress)
}

// The id caches are derived state and must not affect equality or hashing.
impl PartialEq for PoolKey {
    fn eq(&self, other: &Self) -> bool {
        self.token0 == other.token0
            && self.token1 == other.token1
            && self.config == other.config
    }
}

impl Eq for PoolKey {}

impl Hash for PoolKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token0.hash(state);
        self.token1.hash(state);
        self.config.hash(state);
    }
}

/// The aggregate effect of all positions bounded by a specific tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tick {
    pub index: i32,
    pub liquidity_delta: i128,
}

/// Amount and token of one side of a swap. Positive amounts are exact
/// input, negative amounts are exact output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAmount {
    pub amount: i128,
    pub token: Address,
}

/// Parameters for a quote operation against a pool.
#[derive(Clone, Copy, Debug)]
pub struct QuoteParams<S, M> {
    pub token_amount: TokenAmount,
    pub sqrt_ratio_limit: Option<U256>,
    pub override_state: Option<S>,
    pub meta: M,
}

/// The result of a swap simulation. `consumed_amount` is the portion of the
/// specified amount that was swapped; `calculated_amount` is the magnitude of
/// the other side of the trade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote<R, S> {
    pub is_price_increasing: bool,
    pub consumed_amount: i128,
    pub calculated_amount: u128,
    pub execution_resources: R,
    pub state_after: S,
    pub fees_paid: u128,
}

/// Common view of a pool state snapshot, independent of the pool variant.
pub trait PoolState: private::Sealed {
    fn sqrt_ratio(&self) -> U256;
    fn liquidity(&self) -> u128;
}

/// A pool that can simulate swaps against an in-memory state snapshot.
pub trait Pool: private::Sealed {
    type Resources: Add<Output = Self::Resources> + Default + Clone + Copy;
    type State: PoolState + Clone + Copy;
    type QuoteError: Debug;
    /// Extra per-quote inputs beyond the pool state, e.g. the block
    /// timestamp for time-dependent pools.
    type Meta: Clone + Copy;

    fn key(&self) -> &PoolKey;

    fn state(&self) -> Self::State;

    fn quote(
        &self,
        params: QuoteParams<Self::State, Self::Meta>,
    ) -> Result<Quote<Self::Resources, Self::State>, Self::QuoteError>;

    fn has_liquidity(&self) -> bool;

    /// Greatest tick with any tracked liquidity above it, if any.
    fn max_tick_with_liquidity(&self) -> Option<i32>;

    /// Smallest tick with any tracked liquidity below it, if any.
    fn min_tick_with_liquidity(&self) -> Option<i32>;

    /// Whether quoting the same amounts in separate steps can give a
    /// different result than a single quote (e.g. time-dependent fees).
    fn is_path_dependent(&self) -> bool;
}
