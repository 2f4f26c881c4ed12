use std::collections::HashMap;

use chia_bls::PublicKey;
use chia_protocol::Bytes32;
use chia_puzzle_types::standard::StandardArgs;

/// Maps between synthetic keys and the standard p2 puzzle hashes they lock.
/// Derivations are ordered, and the first one doubles as the default change
/// target.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    keys: Vec<PublicKey>,
    by_puzzle_hash: HashMap<Bytes32, PublicKey>,
}

impl KeyStore {
    pub fn new(keys: Vec<PublicKey>) -> Self {
        let by_puzzle_hash = keys
            .iter()
            .map(|key| (StandardArgs::curry_tree_hash(*key).into(), *key))
            .collect();
        Self {
            keys,
            by_puzzle_hash,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn puzzle_hashes(&self) -> Vec<Bytes32> {
        self.keys
            .iter()
            .map(|key| StandardArgs::curry_tree_hash(*key).into())
            .collect()
    }

    pub fn synthetic_key(&self, p2_puzzle_hash: Bytes32) -> Option<PublicKey> {
        self.by_puzzle_hash.get(&p2_puzzle_hash).copied()
    }

    pub fn contains(&self, p2_puzzle_hash: Bytes32) -> bool {
        self.by_puzzle_hash.contains_key(&p2_puzzle_hash)
    }

    /// The puzzle hash change is sent to when address reuse is disabled.
    pub fn change_puzzle_hash(&self) -> Option<Bytes32> {
        self.keys
            .first()
            .map(|key| StandardArgs::curry_tree_hash(*key).into())
    }
}

#[cfg(test)]
mod tests {
    use chia_bls::SecretKey;

    use super::*;

    fn key(byte: u8) -> PublicKey {
        SecretKey::from_seed(&[byte; 32]).public_key()
    }

    #[test]
    fn test_round_trips_puzzle_hashes() {
        let keys = vec![key(1), key(2), key(3)];
        let store = KeyStore::new(keys.clone());

        let puzzle_hashes = store.puzzle_hashes();
        assert_eq!(puzzle_hashes.len(), 3);

        for (key, puzzle_hash) in keys.iter().zip(&puzzle_hashes) {
            assert!(store.contains(*puzzle_hash));
            assert_eq!(store.synthetic_key(*puzzle_hash), Some(*key));
        }

        assert_eq!(store.change_puzzle_hash(), Some(puzzle_hashes[0]));
        assert!(!store.contains(Bytes32::default()));
    }

    #[test]
    fn test_empty_store() {
        let store = KeyStore::default();
        assert!(store.is_empty());
        assert_eq!(store.change_puzzle_hash(), None);
    }
}
