/// Settings that shape how the wallet behaves, beyond what individual spend
/// plans specify.
#[derive(Debug, Clone, Copy)]
pub struct WalletConfig {
    /// Whether repeated sightings of an unknown asset id should create a
    /// wallet for it automatically.
    pub automatically_add_unknown_cats: bool,
    /// The maximum number of coins a single spend may consume. This also
    /// bounds the maximum amount that can be sent at once.
    pub max_coins_per_spend: usize,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            automatically_add_unknown_cats: false,
            max_coins_per_spend: 500,
        }
    }
}
