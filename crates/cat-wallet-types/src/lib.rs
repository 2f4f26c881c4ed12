mod conditions;
mod run_puzzle;

pub use conditions::*;
pub use run_puzzle::*;
