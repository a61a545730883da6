use crate::math::sqrt_ratio::float_sqrt_ratio_to_fixed;
use crate::math::uint::U256;
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Quantities wider than 53 bits arrive as decimal strings in the decoded
/// log records so they survive the JSON number type.
fn decimal_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Emitted after every swap with the authoritative post-swap pool state.
/// `sqrt_ratio_after` is carried on the wire in the compact 96-bit float
/// form; [`decode_pool_event`] expands it to the full fixed point value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwappedEvent {
    pub pool_id: B256,
    #[serde(deserialize_with = "decimal_string")]
    pub sqrt_ratio_after: U256,
    #[serde(deserialize_with = "decimal_string")]
    pub liquidity_after: u128,
    pub tick_after: i32,
}

/// Liquidity added to or removed from the range `[lower_tick, upper_tick)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdatedEvent {
    pub pool_id: B256,
    pub lower_tick: i32,
    pub upper_tick: i32,
    #[serde(deserialize_with = "decimal_string")]
    pub liquidity_delta: i128,
}

/// A virtual order placed or modified: sells `sell_token` at a rate changed
/// by `sale_rate_delta` between `start_time` and `end_time`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdatedEvent {
    pub pool_id: B256,
    pub sell_token: Address,
    pub start_time: u64,
    pub end_time: u64,
    #[serde(deserialize_with = "decimal_string")]
    pub sale_rate_delta: i128,
}

/// Virtual orders were executed on chain up to the emitting block. The
/// reported sale rates are authoritative for the pool from that point on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualOrdersExecutedEvent {
    pub pool_id: B256,
    #[serde(deserialize_with = "decimal_string")]
    pub token0_sale_rate: u128,
    #[serde(deserialize_with = "decimal_string")]
    pub token1_sale_rate: u128,
}

/// A decoded pool log, ready to be applied to a tracked pool snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolEvent {
    Swapped(SwappedEvent),
    PositionUpdated(PositionUpdatedEvent),
    OrderUpdated(OrderUpdatedEvent),
    VirtualOrdersExecuted(VirtualOrdersExecutedEvent),
}

impl PoolEvent {
    pub fn pool_id(&self) -> B256 {
        match self {
            PoolEvent::Swapped(ev) => ev.pool_id,
            PoolEvent::PositionUpdated(ev) => ev.pool_id,
            PoolEvent::OrderUpdated(ev) => ev.pool_id,
            PoolEvent::VirtualOrdersExecuted(ev) => ev.pool_id,
        }
    }
}

#[derive(Debug, Error)]
#[error("malformed `{event}` log payload")]
pub struct EventDecodeError {
    pub event: String,
    #[source]
    source: serde_json::Error,
}

/// Decodes one chain log into a [`PoolEvent`]. Logs with names the engine
/// does not track decode to `Ok(None)`; a recognized name with a payload
/// that does not match its schema is an error the caller should log and
/// treat as a no-op.
pub fn decode_pool_event(
    name: &str,
    data: &serde_json::Value,
) -> Result<Option<PoolEvent>, EventDecodeError> {
    let wrap = |source| EventDecodeError {
        event: name.to_string(),
        source,
    };

    Ok(Some(match name {
        "Swapped" => {
            let mut event = SwappedEvent::deserialize(data).map_err(wrap)?;
            event.sqrt_ratio_after = float_sqrt_ratio_to_fixed(event.sqrt_ratio_after);
            PoolEvent::Swapped(event)
        }
        "PositionUpdated" => {
            PoolEvent::PositionUpdated(PositionUpdatedEvent::deserialize(data).map_err(wrap)?)
        }
        "OrderUpdated" => {
            PoolEvent::OrderUpdated(OrderUpdatedEvent::deserialize(data).map_err(wrap)?)
        }
        "VirtualOrdersExecuted" => PoolEvent::VirtualOrdersExecuted(
            VirtualOrdersExecutedEvent::deserialize(data).map_err(wrap)?,
        ),
        _ => return Ok(None),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::sqrt_ratio::{to_float_sqrt_ratio, SQRT_RATIO_ONE};
    use serde_json::json;

    #[test]
    fn swapped_expands_float_sqrt_ratio() {
        let float = to_float_sqrt_ratio(SQRT_RATIO_ONE);
        let data = json!({
            "poolId": B256::ZERO,
            "sqrtRatioAfter": float.to_string(),
            "liquidityAfter": "123456789012345678901234567890",
            "tickAfter": -12345,
        });

        let event = decode_pool_event("Swapped", &data).unwrap().unwrap();
        assert_eq!(
            event,
            PoolEvent::Swapped(SwappedEvent {
                pool_id: B256::ZERO,
                sqrt_ratio_after: SQRT_RATIO_ONE,
                liquidity_after: 123456789012345678901234567890,
                tick_after: -12345,
            })
        );
    }

    #[test]
    fn position_updated_decodes_signed_delta() {
        let data = json!({
            "poolId": B256::with_last_byte(7),
            "lowerTick": -200,
            "upperTick": 200,
            "liquidityDelta": "-170141183460469231731687303715884105728",
        });

        let event = decode_pool_event("PositionUpdated", &data).unwrap().unwrap();
        assert_eq!(
            event,
            PoolEvent::PositionUpdated(PositionUpdatedEvent {
                pool_id: B256::with_last_byte(7),
                lower_tick: -200,
                upper_tick: 200,
                liquidity_delta: i128::MIN,
            })
        );
    }

    #[test]
    fn order_updated_decodes() {
        let data = json!({
            "poolId": B256::ZERO,
            "sellToken": Address::with_last_byte(1),
            "startTime": 1_743_726_720u64,
            "endTime": 1_743_729_408u64,
            "saleRateDelta": "1597830095238095",
        });

        let event = decode_pool_event("OrderUpdated", &data).unwrap().unwrap();
        assert_eq!(
            event,
            PoolEvent::OrderUpdated(OrderUpdatedEvent {
                pool_id: B256::ZERO,
                sell_token: Address::with_last_byte(1),
                start_time: 1_743_726_720,
                end_time: 1_743_729_408,
                sale_rate_delta: 1_597_830_095_238_095,
            })
        );
    }

    #[test]
    fn unknown_event_name_is_ignored() {
        assert_eq!(
            decode_pool_event("ProtocolFeesPaid", &json!({})).unwrap(),
            None
        );
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let data = json!({
            "poolId": B256::ZERO,
            "sqrtRatioAfter": "not a number",
            "liquidityAfter": "0",
            "tickAfter": 0,
        });

        let error = decode_pool_event("Swapped", &data).unwrap_err();
        assert_eq!(error.event, "Swapped");
    }

    #[test]
    fn missing_field_is_an_error() {
        let data = json!({
            "poolId": B256::ZERO,
            "lowerTick": -200,
            "upperTick": 200,
        });

        assert!(decode_pool_event("PositionUpdated", &data).is_err());
    }
}
