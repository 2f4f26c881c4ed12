use cat_wallet_driver::{CoinSelectionError, DriverError};
use cat_wallet_store::StoreError;
use chia_protocol::Bytes32;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("coin selection error: {0}")]
    Selection(#[from] CoinSelectionError),

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("amount {requested} exceeds the maximum spendable amount {max}")]
    AmountExceedsSendLimit { requested: u64, max: u64 },

    #[error("expected {expected} memo lists, found {actual}")]
    InvalidMemoCount { expected: usize, actual: usize },

    #[error("missing lineage proof for coin {0}")]
    MissingLineageProof(Bytes32),

    #[error("no wallet tracks asset id {0}")]
    UnknownAsset(Bytes32),

    #[error("no key derivation matches puzzle hash {0}")]
    UnknownPuzzleHash(Bytes32),

    #[error("the key store has no derivations")]
    NoDerivations,

    #[error("try from int error")]
    TryFromInt(#[from] std::num::TryFromIntError),
}
