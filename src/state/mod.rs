//! Event-sourced pool state maintenance: typed log decoding, per-variant
//! state transitions, a block-keyed subscriber with snapshot regeneration,
//! and the registry that fans quote requests out across tracked pools.

pub mod events;
pub mod pool;
pub mod registry;
pub mod subscriber;
