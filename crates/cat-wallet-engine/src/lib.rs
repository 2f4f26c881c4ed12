mod asset_wallet;
mod config;
mod derivation;
mod error;
mod plan;
mod wallet_state_manager;

pub use asset_wallet::*;
pub use config::*;
pub use derivation::*;
pub use error::*;
pub use plan::*;
pub use wallet_state_manager::*;
