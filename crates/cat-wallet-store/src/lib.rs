mod coin_store;
mod error;
mod lineage_store;
mod unacknowledged_store;

pub use coin_store::*;
pub use error::*;
pub use lineage_store::*;
pub use unacknowledged_store::*;
