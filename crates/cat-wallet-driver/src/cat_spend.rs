use cat_wallet_types::Condition;
use chia_protocol::CoinSpend;
use chia_puzzle_types::{
    cat::{CatArgs, CatSolution},
    CoinProof,
};
use clvm_utils::CurriedProgram;

use crate::{Cat, DriverError, Spend, SpendContext};

/// A single CAT coin in a ring spend, paired with the spend of its inner
/// puzzle. The extra delta is nonzero only when the TAIL permits minting or
/// melting in this spend.
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct CatSpend {
    pub cat: Cat,
    pub inner_spend: Spend,
    pub extra_delta: i64,
}

impl CatSpend {
    pub fn new(cat: Cat, inner_spend: Spend) -> Self {
        Self {
            cat,
            inner_spend,
            extra_delta: 0,
        }
    }

    pub fn with_extra_delta(cat: Cat, inner_spend: Spend, extra_delta: i64) -> Self {
        Self {
            cat,
            inner_spend,
            extra_delta,
        }
    }
}

impl Cat {
    /// Spends a group of CATs of the same asset id together, arranging them
    /// in the ring the CAT puzzle requires. Each coin announces its neighbor
    /// and the running subtotal, which is how the puzzle proves that no value
    /// was created or destroyed overall.
    ///
    /// The coin spends are added to the context only once the whole ring has
    /// been built, so an error partway through leaves the context untouched.
    pub fn spend_all(ctx: &mut SpendContext, cat_spends: &[CatSpend]) -> Result<(), DriverError> {
        let cat_puzzle = ctx.cat_puzzle()?;
        let len = cat_spends.len();

        let mut coin_spends = Vec::with_capacity(len);
        let mut total_delta = 0i128;

        for (index, item) in cat_spends.iter().enumerate() {
            let CatSpend {
                cat,
                inner_spend,
                extra_delta,
            } = item;

            // The delta is the input amount minus the output amounts.
            let output = ctx.run(inner_spend.puzzle, inner_spend.solution)?;
            let conditions: Vec<Condition> = ctx.extract(output)?;

            let delta = conditions
                .iter()
                .filter_map(Condition::as_create_coin)
                .fold(
                    i128::from(cat.coin.amount) - i128::from(*extra_delta),
                    |delta, create_coin| delta - i128::from(create_coin.amount),
                );

            let prev_subtotal = total_delta;
            total_delta += delta;

            // Find the neighboring coins on the ring.
            let prev = &cat_spends[if index == 0 { len - 1 } else { index - 1 }];
            let next = &cat_spends[if index == len - 1 { 0 } else { index + 1 }];

            let puzzle = ctx.alloc(&CurriedProgram {
                program: cat_puzzle,
                args: CatArgs::new(cat.asset_id, inner_spend.puzzle),
            })?;

            let solution = ctx.alloc(&CatSolution {
                inner_puzzle_solution: inner_spend.solution,
                lineage_proof: cat.lineage_proof,
                prev_coin_id: prev.cat.coin.coin_id(),
                this_coin_info: cat.coin,
                next_coin_proof: CoinProof {
                    parent_coin_info: next.cat.coin.parent_coin_info,
                    inner_puzzle_hash: next.cat.p2_puzzle_hash,
                    amount: next.cat.coin.amount,
                },
                prev_subtotal: prev_subtotal.try_into()?,
                extra_delta: *extra_delta,
            })?;

            coin_spends.push(CoinSpend::new(
                cat.coin,
                ctx.serialize(&puzzle)?,
                ctx.serialize(&solution)?,
            ));
        }

        for coin_spend in coin_spends {
            ctx.insert(coin_spend);
        }

        Ok(())
    }
}
