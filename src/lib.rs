pub use cat_wallet_driver as driver;
pub use cat_wallet_engine as engine;
pub use cat_wallet_store as store;
pub use cat_wallet_types as types;

pub mod prelude {
    pub use crate::driver::*;
    pub use crate::engine::*;
    pub use crate::store::*;
    pub use crate::types::*;
}
