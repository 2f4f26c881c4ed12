mod cat;
mod cat_spend;
mod coin_selection;
mod error;
mod issuance;
mod puzzle;
mod spend;
mod spend_context;
mod standard;

pub use cat::*;
pub use cat_spend::*;
pub use coin_selection::*;
pub use error::*;
pub use issuance::*;
pub use puzzle::*;
pub use spend::*;
pub use spend_context::*;
pub use standard::*;
