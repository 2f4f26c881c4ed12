use std::sync::Arc;

use cat_wallet_driver::{issue_cat_from_coin, Cat, DriverError, SpendContext};
use cat_wallet_store::{CoinStore, UnacknowledgedCatStore};
use cat_wallet_types::{Condition, CreateCoin};
use chia_protocol::{Bytes32, CoinSpend, CoinState};
use indexmap::IndexMap;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{Balances, CatWallet, KeyStore, SpendPlan, WalletConfig, WalletError};

/// Coordinates the per-asset wallets, the discovery of new assets, and the
/// bookkeeping shared between them. Wallet creation and spend generation are
/// serialized behind one lock so that two spends can never select the same
/// coins and the registry is never observed half-initialized.
#[derive(Debug)]
pub struct WalletStateManager<C> {
    config: WalletConfig,
    keys: Arc<KeyStore>,
    wallets: RwLock<IndexMap<Bytes32, Arc<CatWallet<C>>>>,
    unacknowledged: UnacknowledgedCatStore,
    lock: Mutex<()>,
}

impl<C> WalletStateManager<C> {
    pub fn new(config: WalletConfig, keys: KeyStore) -> Self {
        Self {
            config,
            keys: Arc::new(keys),
            wallets: RwLock::new(IndexMap::new()),
            unacknowledged: UnacknowledgedCatStore::new(),
            lock: Mutex::new(()),
        }
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    pub fn unacknowledged(&self) -> &UnacknowledgedCatStore {
        &self.unacknowledged
    }

    pub fn wallet(&self, asset_id: Bytes32) -> Option<Arc<CatWallet<C>>> {
        self.wallets.read().get(&asset_id).cloned()
    }

    pub fn asset_ids(&self) -> Vec<Bytes32> {
        self.wallets.read().keys().copied().collect()
    }
}

impl<C: CoinStore + Default + Send + Sync> WalletStateManager<C> {
    /// Creates a wallet for an asset id and replays any coin states that
    /// were buffered for it. Replayed states don't carry parent spends, so
    /// their lineage proofs are recorded when the states are seen again with
    /// their parents attached.
    pub async fn create_wallet(&self, asset_id: Bytes32) -> Result<Arc<CatWallet<C>>, WalletError> {
        let _guard = self.lock.lock().await;

        if let Some(wallet) = self.wallet(asset_id) {
            return Ok(wallet);
        }

        let wallet = Arc::new(CatWallet::new(asset_id, C::default(), self.config));
        self.wallets.write().insert(asset_id, wallet.clone());

        let buffered = self.unacknowledged.get(asset_id).await;
        if !buffered.is_empty() {
            info!(
                "replaying {} buffered coin states for asset {asset_id}",
                buffered.len()
            );
            for (coin_state, _height) in buffered {
                wallet.apply_coin_state(coin_state, None).await?;
            }
            self.unacknowledged.delete(asset_id).await;
        }

        Ok(wallet)
    }

    /// Issues a new single-issuance CAT funded by the given coin and creates
    /// a wallet for it in one step. The eve coin pays the full amount to the
    /// default derivation, and its lineage proof is recorded up front so the
    /// minted coin is spendable as soon as it confirms. Returns the condition
    /// the funding coin must output alongside the new wallet.
    pub async fn create_issuance_wallet(
        &self,
        ctx: &mut SpendContext,
        parent_coin_id: Bytes32,
        amount: u64,
    ) -> Result<(CreateCoin, Arc<CatWallet<C>>), WalletError> {
        let p2_puzzle_hash = self
            .keys
            .change_puzzle_hash()
            .ok_or(WalletError::NoDerivations)?;

        let conditions = vec![Condition::CreateCoin(
            CreateCoin::hinted(&mut ctx.allocator, p2_puzzle_hash, amount, p2_puzzle_hash, &[])
                .map_err(DriverError::from)?,
        )];

        let (parent_condition, issuance) =
            issue_cat_from_coin(ctx, parent_coin_id, amount, conditions)?;

        info!(
            "issuing {amount} of new asset {} from coin {parent_coin_id}",
            issuance.asset_id
        );

        let wallet = self.create_wallet(issuance.asset_id).await?;
        wallet.set_tail_program(issuance.tail.clone()).await;

        let minted = issuance.child(issuance.asset_id, p2_puzzle_hash, amount);
        wallet
            .lineage_store()
            .insert(minted.coin.coin_id(), issuance.lineage_proof)
            .await?;

        Ok((parent_condition, wallet))
    }

    /// Handles a hinted coin state for the given asset id. Coins for known
    /// assets go straight to their wallet. With
    /// `automatically_add_unknown_cats` set, a wallet is created the first
    /// time an unknown asset is seen. Otherwise the first sighting is
    /// buffered, and a second sighting of the same asset id establishes it
    /// and creates the wallet.
    ///
    /// Coins whose puzzle hash doesn't match any derivation wrapped for the
    /// asset id are ignored outright, since the hint can't be trusted.
    pub async fn ingest_coin_state(
        &self,
        asset_id: Bytes32,
        coin_state: CoinState,
        parent_spend: Option<&CoinSpend>,
    ) -> Result<(), WalletError> {
        if !self.is_wrapped_for_us(asset_id, coin_state.coin.puzzle_hash) {
            debug!(
                "ignoring coin {} hinted for asset {asset_id} with a foreign puzzle hash",
                coin_state.coin.coin_id()
            );
            return Ok(());
        }

        if let Some(wallet) = self.wallet(asset_id) {
            wallet.apply_coin_state(coin_state, parent_spend).await?;
            return Ok(());
        }

        if self.config.automatically_add_unknown_cats {
            info!("automatically creating a wallet for asset {asset_id}");
            let wallet = self.create_wallet(asset_id).await?;
            wallet.apply_coin_state(coin_state, parent_spend).await?;
            return Ok(());
        }

        if self.unacknowledged.get(asset_id).await.is_empty() {
            debug!("buffering first sighting of unknown asset {asset_id}");
            self.unacknowledged
                .add(asset_id, coin_state, coin_state.created_height)
                .await;
            return Ok(());
        }

        // A second sighting establishes the asset.
        info!("asset {asset_id} seen again, creating a wallet for it");
        let wallet = self.create_wallet(asset_id).await?;
        wallet.apply_coin_state(coin_state, parent_spend).await?;

        Ok(())
    }

    /// Constructs the coin spends for a plan against the wallet tracking the
    /// given asset id.
    pub async fn generate_spend(
        &self,
        ctx: &mut SpendContext,
        asset_id: Bytes32,
        plan: &SpendPlan,
    ) -> Result<Vec<CoinSpend>, WalletError> {
        let wallet = self
            .wallet(asset_id)
            .ok_or(WalletError::UnknownAsset(asset_id))?;

        let _guard = self.lock.lock().await;
        wallet.generate_spend(ctx, &self.keys, plan).await?;
        Ok(ctx.take())
    }

    pub async fn balances(&self, asset_id: Bytes32) -> Result<Balances, WalletError> {
        let wallet = self
            .wallet(asset_id)
            .ok_or(WalletError::UnknownAsset(asset_id))?;
        Ok(wallet.balances().await)
    }

    /// Reverts every wallet and the unacknowledged buffer to the given
    /// height after a reorg.
    pub async fn rollback_to_height(&self, height: u32) {
        info!("rolling back wallet state to height {height}");
        let wallets: Vec<Arc<CatWallet<C>>> = self.wallets.read().values().cloned().collect();
        for wallet in wallets {
            wallet.rollback_to_height(height).await;
        }
        self.unacknowledged.rollback_to_height(height).await;
    }

    fn is_wrapped_for_us(&self, asset_id: Bytes32, puzzle_hash: Bytes32) -> bool {
        self.keys.puzzle_hashes().into_iter().any(|p2_puzzle_hash| {
            Bytes32::from(Cat::puzzle_hash(asset_id, p2_puzzle_hash)) == puzzle_hash
        })
    }
}
