use chia_protocol::{Bytes, Bytes32, Coin};

/// A single recipient of a spend. The puzzle hash is the recipient's inner
/// puzzle hash, not the wrapped CAT puzzle hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    pub puzzle_hash: Bytes32,
    pub amount: u64,
}

impl Payment {
    pub fn new(puzzle_hash: Bytes32, amount: u64) -> Self {
        Self {
            puzzle_hash,
            amount,
        }
    }
}

/// Describes a spend to be constructed. Coins are selected automatically
/// unless an explicit coin set is provided.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct SpendPlan {
    pub payments: Vec<Payment>,
    pub fee: u64,
    /// One memo list per payment. When present, the number of lists must
    /// match the number of payments, and each list holds at most one memo.
    pub memos: Option<Vec<Vec<Bytes>>>,
    /// Coins that must not be selected, in addition to coins already locked
    /// by pending spends.
    pub excluded_coin_ids: Vec<Bytes32>,
    /// Send change back to the inner puzzle hash of one of the spent coins
    /// instead of a fresh derivation.
    pub reuse_change_address: bool,
    /// Spend exactly these coins instead of running coin selection.
    pub coins: Option<Vec<Coin>>,
}

impl SpendPlan {
    pub fn new(payments: Vec<Payment>) -> Self {
        Self {
            payments,
            ..Self::default()
        }
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn memos(mut self, memos: Vec<Vec<Bytes>>) -> Self {
        self.memos = Some(memos);
        self
    }

    pub fn exclude(mut self, coin_ids: Vec<Bytes32>) -> Self {
        self.excluded_coin_ids = coin_ids;
        self
    }

    pub fn reuse_change_address(mut self) -> Self {
        self.reuse_change_address = true;
        self
    }

    pub fn coins(mut self, coins: Vec<Coin>) -> Self {
        self.coins = Some(coins);
        self
    }

    /// The total amount paid to recipients, not including the fee. The sum
    /// is widened since nothing stops a plan's payments exceeding `u64::MAX`.
    pub fn payment_total(&self) -> u128 {
        self.payments
            .iter()
            .map(|payment| u128::from(payment.amount))
            .sum()
    }
}

/// The balance of a wallet, bucketed by how settled the value is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balances {
    /// The total value of unspent coins that have been confirmed on chain.
    pub confirmed: u128,
    /// The confirmed balance adjusted for pending spends and their change.
    pub unconfirmed: u128,
    /// The confirmed value not locked by pending spends.
    pub spendable: u128,
    /// Change from pending spends that has not confirmed yet.
    pub pending_change: u128,
}
