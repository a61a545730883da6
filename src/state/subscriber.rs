use crate::quoting::types::PoolKey;
use crate::state::events::decode_pool_event;
use crate::state::pool::TrackedPool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// One decoded chain log: the event name plus its typed argument record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolLog {
    pub name: String,
    pub data: serde_json::Value,
}

/// A contiguous batch of logs emitted for one pool in one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockLogs {
    pub block_number: u64,
    pub timestamp: u64,
    pub logs: Vec<PoolLog>,
}

/// Issues the batched on-chain snapshot call that rebuilds a complete pool
/// state as of a historical block. The single suspending operation in the
/// state layer.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch(&self, key: &PoolKey, block_number: u64)
        -> Result<TrackedPool, Self::Error>;
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum StateError<E: std::error::Error> {
    /// Nothing committed at or before the requested block. Callers must
    /// exclude the pool from candidate results, never treat this as zero
    /// liquidity.
    #[error("no committed state at or before block {0}")]
    NotAvailable(u64),
    #[error("snapshot regeneration failed")]
    Regeneration(#[source] E),
}

/// Maintains one pool's state keyed by block number. Logs are applied
/// incrementally in block order; a handler failure poisons the incremental
/// history, forcing the next read to regenerate from a fresh snapshot.
pub struct PoolSubscriber<F: SnapshotFetcher> {
    fetcher: F,
    key: PoolKey,
    committed: BTreeMap<u64, TrackedPool>,
    poisoned: bool,
}

impl<F: SnapshotFetcher> PoolSubscriber<F> {
    /// Initializes the subscriber with a snapshot at `block_number`.
    pub async fn new(fetcher: F, key: PoolKey, block_number: u64) -> Result<Self, F::Error> {
        let pool = fetcher.fetch(&key, block_number).await?;
        let mut committed = BTreeMap::new();
        committed.insert(block_number, pool);
        Ok(Self {
            fetcher,
            key,
            committed,
            poisoned: false,
        })
    }

    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    /// Applies one block's logs on top of the latest committed state and
    /// commits the result at that block. Undecodable logs are skipped;
    /// unknown event names are ignored; a failing handler poisons the
    /// subscriber instead of committing partial state.
    pub fn apply_logs(&mut self, batch: &BlockLogs) {
        if self.poisoned {
            return;
        }

        let Some(latest) = self.committed.values().next_back() else {
            self.poisoned = true;
            return;
        };

        let mut next = latest.clone();
        for log in &batch.logs {
            match decode_pool_event(&log.name, &log.data) {
                // events correlate to pools by the keccak-derived numeric
                // id; a log for another pool must not touch this snapshot
                Ok(Some(event)) if event.pool_id() != self.key.numeric_id() => {
                    warn!(
                        pool = %self.key.string_id(),
                        event_pool_id = %event.pool_id(),
                        block_number = batch.block_number,
                        "skipping event routed to the wrong pool",
                    );
                }
                Ok(Some(event)) => match next.apply(&event, batch.timestamp) {
                    Ok(pool) => next = pool,
                    Err(error) => {
                        warn!(
                            pool = %self.key.string_id(),
                            event = log.name.as_str(),
                            block_number = batch.block_number,
                            %error,
                            "event handler failed, state will be regenerated",
                        );
                        self.poisoned = true;
                        return;
                    }
                },
                Ok(None) => {}
                Err(error) => {
                    warn!(
                        pool = %self.key.string_id(),
                        block_number = batch.block_number,
                        %error,
                        "skipping undecodable log",
                    );
                }
            }
        }

        self.committed.insert(batch.block_number, next);
    }

    /// The latest committed state at or before `block_number`. When the
    /// incremental history is poisoned, regenerates from a fresh snapshot
    /// first, discarding the history.
    pub async fn state_at(
        &mut self,
        block_number: u64,
    ) -> Result<&TrackedPool, StateError<F::Error>> {
        if self.poisoned {
            debug!(
                pool = %self.key.string_id(),
                block_number,
                "regenerating pool state from snapshot",
            );
            let pool = self
                .fetcher
                .fetch(&self.key, block_number)
                .await
                .map_err(StateError::Regeneration)?;
            self.committed.clear();
            self.committed.insert(block_number, pool);
            self.poisoned = false;
        }

        self.committed
            .range(..=block_number)
            .next_back()
            .map(|(_, pool)| pool)
            .ok_or(StateError::NotAvailable(block_number))
    }

    /// Drops committed states strictly older than `block_number`, keeping
    /// the newest one at or before it so reads at `block_number` still
    /// resolve.
    pub fn prune_before(&mut self, block_number: u64) {
        if let Some(&keep) = self
            .committed
            .range(..=block_number)
            .next_back()
            .map(|(block, _)| block)
        {
            self.committed.retain(|&block, _| block >= keep);
        }
    }
}
