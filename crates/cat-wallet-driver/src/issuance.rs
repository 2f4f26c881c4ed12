use cat_wallet_types::{Condition, CreateCoin, RunCatTail};
use chia_bls::PublicKey;
use chia_protocol::{Bytes32, Coin, Program};
use chia_puzzle_types::{
    cat::{CatArgs, CatSolution, EverythingWithSignatureTailArgs, GenesisByCoinIdTailArgs},
    CoinProof, LineageProof, Memos,
};
use clvm_traits::{clvm_quote, ToClvm};
use clvm_utils::CurriedProgram;
use clvmr::NodePtr;

use crate::{Cat, DriverError, Spend, SpendContext};

/// The information needed to track a freshly issued CAT.
#[derive(Debug, Clone)]
pub struct CatIssuance {
    pub asset_id: Bytes32,
    pub eve_coin: Coin,
    /// The serialized TAIL program whose tree hash is the asset id.
    pub tail: Program,
    /// The proof children of the eve coin will use. The eve itself has none.
    pub lineage_proof: LineageProof,
}

/// Issues a CAT with the single-issuance TAIL, which commits to the coin id
/// of the XCH coin funding the issuance. Returns the condition the funding
/// coin must output along with the issuance info.
pub fn issue_cat_from_coin(
    ctx: &mut SpendContext,
    parent_coin_id: Bytes32,
    amount: u64,
    conditions: Vec<Condition>,
) -> Result<(CreateCoin, CatIssuance), DriverError> {
    let tail_puzzle = ctx.genesis_by_coin_id_tail_puzzle()?;
    let tail = ctx.alloc(&CurriedProgram {
        program: tail_puzzle,
        args: GenesisByCoinIdTailArgs::new(parent_coin_id),
    })?;
    issue_cat(ctx, parent_coin_id, tail, amount, conditions)
}

/// Issues a CAT with the multi-issuance TAIL, which allows further supply
/// changes signed by the given key.
pub fn issue_cat_from_key(
    ctx: &mut SpendContext,
    parent_coin_id: Bytes32,
    public_key: PublicKey,
    amount: u64,
    conditions: Vec<Condition>,
) -> Result<(CreateCoin, CatIssuance), DriverError> {
    let tail_puzzle = ctx.everything_with_signature_tail_puzzle()?;
    let tail = ctx.alloc(&CurriedProgram {
        program: tail_puzzle,
        args: EverythingWithSignatureTailArgs::new(public_key),
    })?;
    issue_cat(ctx, parent_coin_id, tail, amount, conditions)
}

fn issue_cat(
    ctx: &mut SpendContext,
    parent_coin_id: Bytes32,
    tail: NodePtr,
    amount: u64,
    mut conditions: Vec<Condition>,
) -> Result<(CreateCoin, CatIssuance), DriverError> {
    let asset_id = Bytes32::from(ctx.tree_hash(tail));

    conditions.push(Condition::RunCatTail(RunCatTail::new(tail, NodePtr::NIL)));

    let inner_puzzle = ctx.alloc(&clvm_quote!(conditions))?;
    let inner_puzzle_hash = Bytes32::from(ctx.tree_hash(inner_puzzle));

    let cat_puzzle = ctx.cat_puzzle()?;
    let puzzle = ctx.alloc(&CurriedProgram {
        program: cat_puzzle,
        args: CatArgs::new(asset_id, inner_puzzle),
    })?;

    let puzzle_hash = Bytes32::from(ctx.tree_hash(puzzle));
    let eve_coin = Coin::new(parent_coin_id, puzzle_hash, amount);

    let solution = ctx.alloc(&CatSolution {
        inner_puzzle_solution: (),
        lineage_proof: None,
        prev_coin_id: eve_coin.coin_id(),
        this_coin_info: eve_coin,
        next_coin_proof: CoinProof {
            parent_coin_info: parent_coin_id,
            inner_puzzle_hash,
            amount,
        },
        prev_subtotal: 0,
        extra_delta: 0,
    })?;

    ctx.spend(eve_coin, Spend::new(puzzle, solution))?;

    let hint = [puzzle_hash].to_clvm(&mut ctx.allocator)?;
    let parent_condition = CreateCoin::new(puzzle_hash, amount, Memos::Some(hint));

    let issuance = CatIssuance {
        asset_id,
        eve_coin,
        tail: ctx.serialize(&tail)?,
        lineage_proof: LineageProof {
            parent_parent_coin_info: eve_coin.parent_coin_info,
            parent_inner_puzzle_hash: inner_puzzle_hash,
            parent_amount: eve_coin.amount,
        },
    };

    Ok((parent_condition, issuance))
}

impl CatIssuance {
    /// The CAT coin created by the eve spend for the given payment, ready to
    /// be spent with its lineage proof in place.
    pub fn child(&self, asset_id: Bytes32, p2_puzzle_hash: Bytes32, amount: u64) -> Cat {
        Cat::new(
            Coin::new(
                self.eve_coin.coin_id(),
                Cat::puzzle_hash(asset_id, p2_puzzle_hash).into(),
                amount,
            ),
            Some(self.lineage_proof),
            asset_id,
            p2_puzzle_hash,
        )
    }

}
