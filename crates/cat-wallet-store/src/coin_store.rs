use std::future::Future;
use std::sync::Arc;

use chia_protocol::{Bytes32, Coin, CoinState};
use indexmap::IndexMap;
use tokio::sync::Mutex;

/// Keeps track of the state of coins in a wallet.
pub trait CoinStore {
    /// Applies coin state updates, inserting new coins and replacing the
    /// state of known ones.
    fn apply_coin_states(&self, coin_states: Vec<CoinState>) -> impl Future<Output = ()> + Send;

    /// Gets a list of unspent coins.
    fn unspent_coins(&self) -> impl Future<Output = Vec<Coin>> + Send;

    /// Gets every coin state currently tracked.
    fn coin_states(&self) -> impl Future<Output = Vec<CoinState>> + Send;

    /// Gets the current state of a coin.
    fn coin_state(&self, coin_id: Bytes32) -> impl Future<Output = Option<CoinState>> + Send;

    /// Reverts the store to the given block height. Coins created above it
    /// are forgotten and coins spent above it become unspent again.
    fn rollback_to_height(&self, height: u32) -> impl Future<Output = ()> + Send;
}

/// An in-memory [`CoinStore`] implementation.
#[derive(Debug, Default, Clone)]
pub struct MemoryCoinStore {
    coin_states: Arc<Mutex<IndexMap<Bytes32, CoinState>>>,
}

impl MemoryCoinStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CoinStore for MemoryCoinStore {
    async fn apply_coin_states(&self, coin_states: Vec<CoinState>) {
        let mut states = self.coin_states.lock().await;
        for coin_state in coin_states {
            states.insert(coin_state.coin.coin_id(), coin_state);
        }
    }

    async fn unspent_coins(&self) -> Vec<Coin> {
        self.coin_states
            .lock()
            .await
            .values()
            .filter(|coin_state| coin_state.spent_height.is_none())
            .map(|coin_state| coin_state.coin)
            .collect()
    }

    async fn coin_states(&self) -> Vec<CoinState> {
        self.coin_states.lock().await.values().copied().collect()
    }

    async fn coin_state(&self, coin_id: Bytes32) -> Option<CoinState> {
        self.coin_states.lock().await.get(&coin_id).copied()
    }

    async fn rollback_to_height(&self, height: u32) {
        let mut states = self.coin_states.lock().await;
        states.retain(|_, coin_state| {
            coin_state.created_height.is_none_or(|created| created <= height)
        });
        for coin_state in states.values_mut() {
            if coin_state
                .spent_height
                .is_some_and(|spent| spent > height)
            {
                coin_state.spent_height = None;
            }
        }
    }
}
