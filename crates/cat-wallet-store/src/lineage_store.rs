use std::collections::HashMap;
use std::sync::Arc;

use chia_protocol::Bytes32;
use chia_puzzle_types::LineageProof;
use tokio::sync::Mutex;

use crate::StoreError;

/// Tracks the lineage proof of every CAT coin a wallet knows about, keyed by
/// coin id. A coin's proof is immutable once recorded, so re-inserting the
/// same proof is a no-op while a differing proof is rejected.
#[derive(Debug, Default, Clone)]
pub struct LineageStore {
    proofs: Arc<Mutex<HashMap<Bytes32, LineageProof>>>,
}

impl LineageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, coin_id: Bytes32, proof: LineageProof) -> Result<(), StoreError> {
        let mut proofs = self.proofs.lock().await;
        if let Some(existing) = proofs.get(&coin_id) {
            if existing != &proof {
                return Err(StoreError::LineageConflict(coin_id));
            }
            return Ok(());
        }
        proofs.insert(coin_id, proof);
        Ok(())
    }

    pub async fn get(&self, coin_id: Bytes32) -> Option<LineageProof> {
        self.proofs.lock().await.get(&coin_id).copied()
    }

    pub async fn len(&self) -> usize {
        self.proofs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.proofs.lock().await.is_empty()
    }

    pub async fn proofs(&self) -> Vec<(Bytes32, LineageProof)> {
        self.proofs
            .lock()
            .await
            .iter()
            .map(|(coin_id, proof)| (*coin_id, *proof))
            .collect()
    }
}
