use std::collections::HashSet;

use cat_wallet_driver::{
    select_coins, Cat, CatSpend, CoinSelectionConfig, CoinSelectionError, DriverError,
    SpendContext, StandardP2,
};
use cat_wallet_store::{CoinStore, LineageStore};
use cat_wallet_types::{Condition, CreateCoin, ReserveFee};
use chia_protocol::{Bytes32, Coin, CoinSpend, CoinState, Program};
use clvmr::Allocator;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{Balances, KeyStore, SpendPlan, WalletConfig, WalletError};

/// A spend that has been constructed but not yet confirmed. Its input coins
/// are locked, and its change counts toward the unconfirmed balance.
#[derive(Debug, Clone)]
struct PendingSpend {
    removed_coin_ids: Vec<Bytes32>,
    removed_amount: u128,
    change: u64,
}

/// The sub-ledger for a single asset id. Tracks the asset's coins, their
/// lineage proofs, and the spends that are still in flight.
#[derive(Debug)]
pub struct CatWallet<C> {
    asset_id: Bytes32,
    config: WalletConfig,
    coin_store: C,
    lineage_store: LineageStore,
    tail_program: Mutex<Option<Program>>,
    pending: Mutex<Vec<PendingSpend>>,
}

impl<C> CatWallet<C> {
    pub fn new(asset_id: Bytes32, coin_store: C, config: WalletConfig) -> Self {
        Self {
            asset_id,
            config,
            coin_store,
            lineage_store: LineageStore::new(),
            tail_program: Mutex::new(None),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn asset_id(&self) -> Bytes32 {
        self.asset_id
    }

    pub fn coin_store(&self) -> &C {
        &self.coin_store
    }

    pub fn lineage_store(&self) -> &LineageStore {
        &self.lineage_store
    }

    /// The asset's TAIL program, if it has been observed. Wallets created by
    /// discovery don't know their TAIL until issuance reveals it.
    pub async fn tail_program(&self) -> Option<Program> {
        self.tail_program.lock().await.clone()
    }

    pub async fn set_tail_program(&self, program: Program) {
        *self.tail_program.lock().await = Some(program);
    }
}

impl<C: CoinStore> CatWallet<C> {
    /// Applies a coin state belonging to this wallet's asset. When the
    /// parent spend is available, the coin's lineage proof is derived from it
    /// and recorded. A coin whose parent turns out not to be a CAT is
    /// rejected, which also keeps eve coins out of the wallet.
    ///
    /// Returns whether the coin state was accepted.
    pub async fn apply_coin_state(
        &self,
        coin_state: CoinState,
        parent_spend: Option<&CoinSpend>,
    ) -> Result<bool, WalletError> {
        if let Some(parent_spend) = parent_spend {
            let mut allocator = Allocator::new();

            let Some(children) = Cat::parse_children(&mut allocator, parent_spend)? else {
                return Ok(false);
            };

            let Some(child) = children
                .iter()
                .find(|child| child.coin == coin_state.coin && child.asset_id == self.asset_id)
            else {
                return Ok(false);
            };

            if let Some(lineage_proof) = child.lineage_proof {
                self.lineage_store
                    .insert(child.coin.coin_id(), lineage_proof)
                    .await?;
            }
        }

        self.coin_store.apply_coin_states(vec![coin_state]).await;
        self.prune_pending().await;

        Ok(true)
    }

    /// Unspent confirmed coins that aren't locked by a pending spend.
    pub async fn spendable_coins(&self) -> Vec<Coin> {
        let locked = self.locked_coin_ids().await;
        self.coin_store
            .coin_states()
            .await
            .into_iter()
            .filter(|coin_state| {
                coin_state.spent_height.is_none()
                    && coin_state.created_height.is_some()
                    && !locked.contains(&coin_state.coin.coin_id())
            })
            .map(|coin_state| coin_state.coin)
            .collect()
    }

    pub async fn balances(&self) -> Balances {
        let pending = self.pending.lock().await;
        let coin_states = self.coin_store.coin_states().await;

        let locked: HashSet<Bytes32> = pending
            .iter()
            .flat_map(|entry| entry.removed_coin_ids.iter().copied())
            .collect();

        let mut confirmed = 0u128;
        let mut locked_amount = 0u128;

        for coin_state in &coin_states {
            if coin_state.spent_height.is_some() || coin_state.created_height.is_none() {
                continue;
            }
            confirmed += u128::from(coin_state.coin.amount);
            if locked.contains(&coin_state.coin.coin_id()) {
                locked_amount += u128::from(coin_state.coin.amount);
            }
        }

        let pending_change: u128 = pending.iter().map(|entry| u128::from(entry.change)).sum();
        let removed: u128 = pending.iter().map(|entry| entry.removed_amount).sum();

        Balances {
            confirmed,
            unconfirmed: (confirmed + pending_change).saturating_sub(removed),
            spendable: confirmed - locked_amount,
            pending_change,
        }
    }

    /// The largest amount a single spend can move, which is the sum of the
    /// biggest spendable coins up to the per-spend coin limit.
    pub async fn max_send_amount(&self) -> u64 {
        let mut amounts: Vec<u64> = self
            .spendable_coins()
            .await
            .into_iter()
            .map(|coin| coin.amount)
            .collect();
        amounts.sort_unstable_by(|a, b| b.cmp(a));

        let total: u128 = amounts
            .into_iter()
            .take(self.config.max_coins_per_spend)
            .map(u128::from)
            .sum();
        u64::try_from(total).unwrap_or(u64::MAX)
    }

    /// Constructs the coin spends for a plan, adding them to the context.
    /// The selected coins are locked until the spend confirms, and the change
    /// coin's lineage proof is recorded up front so it is immediately
    /// spendable.
    ///
    /// Returns the coins that were selected.
    pub async fn generate_spend(
        &self,
        ctx: &mut SpendContext,
        keys: &KeyStore,
        plan: &SpendPlan,
    ) -> Result<Vec<Coin>, WalletError> {
        if let Some(memos) = &plan.memos {
            if memos.len() != plan.payments.len() {
                return Err(WalletError::InvalidMemoCount {
                    expected: plan.payments.len(),
                    actual: memos.len(),
                });
            }
            // At most one memo per payment, on top of the hint.
            if let Some(list) = memos.iter().find(|list| list.len() > 1) {
                return Err(WalletError::InvalidMemoCount {
                    expected: 1,
                    actual: list.len(),
                });
            }
        }

        let max = self.max_send_amount().await;
        let requested = plan.payment_total() + u128::from(plan.fee);
        let total = u64::try_from(requested)
            .ok()
            .filter(|&total| total <= max)
            .ok_or(WalletError::AmountExceedsSendLimit {
                requested: u64::try_from(requested).unwrap_or(u64::MAX),
                max,
            })?;

        let coins = if let Some(coins) = &plan.coins {
            coins.clone()
        } else {
            select_coins(
                self.spendable_coins().await,
                total,
                &CoinSelectionConfig {
                    excluded_coin_ids: plan.excluded_coin_ids.clone(),
                    max_coin_count: self.config.max_coins_per_spend,
                },
            )?
        };

        let selected_total: u128 = coins.iter().map(|coin| u128::from(coin.amount)).sum();
        let change = u64::try_from(
            selected_total
                .checked_sub(u128::from(total))
                .ok_or(CoinSelectionError::InsufficientBalance(
                    u64::try_from(selected_total).unwrap_or(u64::MAX),
                ))?,
        )?;

        let mut cats = Vec::with_capacity(coins.len());
        for coin in &coins {
            let p2_puzzle_hash = self.resolve_p2_puzzle_hash(keys, coin)?;
            let lineage_proof = self
                .lineage_store
                .get(coin.coin_id())
                .await
                .ok_or_else(|| WalletError::MissingLineageProof(coin.coin_id()))?;
            cats.push(Cat::new(
                *coin,
                Some(lineage_proof),
                self.asset_id,
                p2_puzzle_hash,
            ));
        }

        let change_puzzle_hash = if plan.reuse_change_address {
            cats[0].p2_puzzle_hash
        } else {
            keys.change_puzzle_hash()
                .unwrap_or(cats[0].p2_puzzle_hash)
        };

        // The first coin carries all of the payments, the fee, and change.
        let mut conditions = Vec::new();

        for (index, payment) in plan.payments.iter().enumerate() {
            let extra_memos = plan
                .memos
                .as_ref()
                .map_or(&[][..], |memos| memos[index].as_slice());
            conditions.push(Condition::CreateCoin(
                CreateCoin::hinted(
                    &mut ctx.allocator,
                    payment.puzzle_hash,
                    payment.amount,
                    payment.puzzle_hash,
                    extra_memos,
                )
                .map_err(DriverError::from)?,
            ));
        }

        if plan.fee > 0 {
            conditions.push(Condition::ReserveFee(ReserveFee::new(plan.fee)));
        }

        if change > 0 {
            conditions.push(Condition::CreateCoin(
                CreateCoin::hinted(
                    &mut ctx.allocator,
                    change_puzzle_hash,
                    change,
                    change_puzzle_hash,
                    &[],
                )
                .map_err(DriverError::from)?,
            ));
        }

        let mut cat_spends = Vec::with_capacity(cats.len());
        for (index, cat) in cats.iter().enumerate() {
            let synthetic_key = keys
                .synthetic_key(cat.p2_puzzle_hash)
                .ok_or(WalletError::UnknownPuzzleHash(cat.p2_puzzle_hash))?;
            let inner_conditions = if index == 0 {
                conditions.clone()
            } else {
                Vec::new()
            };
            let inner_spend = StandardP2::new(synthetic_key).spend(ctx, inner_conditions)?;
            cat_spends.push(CatSpend::new(*cat, inner_spend));
        }

        Cat::spend_all(ctx, &cat_spends)?;

        if change > 0 {
            let change_cat = cats[0].wrapped_child(change_puzzle_hash, change);
            self.lineage_store
                .insert(change_cat.coin.coin_id(), cats[0].child_lineage_proof())
                .await?;
        }

        self.pending.lock().await.push(PendingSpend {
            removed_coin_ids: coins.iter().map(Coin::coin_id).collect(),
            removed_amount: selected_total,
            change,
        });

        debug!(
            "spending {} coins of asset {} for a total of {total} with change {change}",
            coins.len(),
            self.asset_id
        );

        Ok(coins)
    }

    /// Reverts the wallet to the given height. Balances are re-derived from
    /// the remaining coin set rather than adjusted incrementally.
    pub async fn rollback_to_height(&self, height: u32) {
        self.coin_store.rollback_to_height(height).await;
    }

    fn resolve_p2_puzzle_hash(&self, keys: &KeyStore, coin: &Coin) -> Result<Bytes32, WalletError> {
        keys.puzzle_hashes()
            .into_iter()
            .find(|&p2_puzzle_hash| {
                Bytes32::from(Cat::puzzle_hash(self.asset_id, p2_puzzle_hash)) == coin.puzzle_hash
            })
            .ok_or(WalletError::UnknownPuzzleHash(coin.puzzle_hash))
    }

    async fn locked_coin_ids(&self) -> HashSet<Bytes32> {
        self.pending
            .lock()
            .await
            .iter()
            .flat_map(|entry| entry.removed_coin_ids.iter().copied())
            .collect()
    }

    /// Drops pending spends whose input coins have all been confirmed spent.
    async fn prune_pending(&self) {
        let mut pending = self.pending.lock().await;
        let mut kept = Vec::new();

        for entry in pending.drain(..) {
            let mut all_spent = true;
            for coin_id in &entry.removed_coin_ids {
                let spent = self
                    .coin_store
                    .coin_state(*coin_id)
                    .await
                    .is_some_and(|coin_state| coin_state.spent_height.is_some());
                if !spent {
                    all_spent = false;
                    break;
                }
            }
            if !all_spent {
                kept.push(entry);
            }
        }

        *pending = kept;
    }
}
