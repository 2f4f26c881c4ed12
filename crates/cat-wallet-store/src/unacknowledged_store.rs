use std::sync::Arc;

use chia_protocol::{Bytes32, CoinState};
use tokio::sync::Mutex;
use tracing::debug;

/// A coin state received for a CAT the wallet has not accepted yet, keyed by
/// the asset id it was hinted with. Heights are stored as `0` when the peer
/// did not provide one, so such entries survive every rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnacknowledgedCoin {
    pub asset_id: Bytes32,
    pub coin_state: CoinState,
    pub observed_height: u32,
}

/// Buffers coin states for unknown asset ids until the wallet either creates
/// a wallet for the asset or the user dismisses it. Insertion order is
/// preserved so replay happens in the order states arrived.
#[derive(Debug, Default, Clone)]
pub struct UnacknowledgedCatStore {
    entries: Arc<Mutex<Vec<UnacknowledgedCoin>>>,
}

impl UnacknowledgedCatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a coin state for an unknown asset id. Re-adding an identical
    /// `(asset_id, coin_state)` pair is a no-op, even at a different height.
    pub async fn add(&self, asset_id: Bytes32, coin_state: CoinState, height: Option<u32>) {
        let mut entries = self.entries.lock().await;
        if entries
            .iter()
            .any(|entry| entry.asset_id == asset_id && entry.coin_state == coin_state)
        {
            return;
        }
        entries.push(UnacknowledgedCoin {
            asset_id,
            coin_state,
            observed_height: height.unwrap_or(0),
        });
    }

    /// Returns the buffered coin states for an asset id in insertion order.
    pub async fn get(&self, asset_id: Bytes32) -> Vec<(CoinState, u32)> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|entry| entry.asset_id == asset_id)
            .map(|entry| (entry.coin_state, entry.observed_height))
            .collect()
    }

    pub async fn delete(&self, asset_id: Bytes32) {
        self.entries
            .lock()
            .await
            .retain(|entry| entry.asset_id != asset_id);
    }

    /// Discards entries observed above the fork height. Entries stored
    /// without a height are kept.
    pub async fn rollback_to_height(&self, height: u32) {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|entry| entry.observed_height <= height);
        if entries.len() != before {
            debug!(
                "discarded {} unacknowledged coin states above height {height}",
                before - entries.len()
            );
        }
    }
}
