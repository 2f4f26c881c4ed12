use chia_protocol::Bytes32;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("conflicting lineage proof recorded for coin {0}")]
    LineageConflict(Bytes32),
}
