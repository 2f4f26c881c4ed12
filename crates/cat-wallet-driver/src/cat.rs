use cat_wallet_types::{parse_conditions, run_puzzle, Condition};
use chia_protocol::{Bytes32, Coin, CoinSpend};
use chia_puzzle_types::{
    cat::{CatArgs, CatSolution},
    LineageProof,
};
use chia_puzzles::CAT_PUZZLE_HASH;
use clvm_traits::{FromClvm, ToClvm};
use clvm_utils::{tree_hash, TreeHash};
use clvmr::{Allocator, NodePtr};

use crate::{DriverError, Puzzle};

/// A CAT coin along with the information needed to spend it. The asset id is
/// the tree hash of the TAIL program and the p2 puzzle hash is the hash of
/// the inner puzzle the CAT layer wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cat {
    pub coin: Coin,
    pub lineage_proof: Option<LineageProof>,
    pub asset_id: Bytes32,
    pub p2_puzzle_hash: Bytes32,
}

impl Cat {
    pub fn new(
        coin: Coin,
        lineage_proof: Option<LineageProof>,
        asset_id: Bytes32,
        p2_puzzle_hash: Bytes32,
    ) -> Self {
        Self {
            coin,
            lineage_proof,
            asset_id,
            p2_puzzle_hash,
        }
    }

    /// The full puzzle hash of a CAT coin wrapping the given inner puzzle hash.
    pub fn puzzle_hash(asset_id: Bytes32, p2_puzzle_hash: Bytes32) -> TreeHash {
        CatArgs::curry_tree_hash(asset_id, p2_puzzle_hash.into())
    }

    /// The lineage proof that children of this coin will use to prove that
    /// their parent was a CAT of the same asset id.
    pub fn child_lineage_proof(&self) -> LineageProof {
        LineageProof {
            parent_parent_coin_info: self.coin.parent_coin_info,
            parent_inner_puzzle_hash: self.p2_puzzle_hash,
            parent_amount: self.coin.amount,
        }
    }

    /// Creates a child CAT with the given inner puzzle hash and amount.
    pub fn wrapped_child(&self, p2_puzzle_hash: Bytes32, amount: u64) -> Self {
        Self {
            coin: Coin::new(
                self.coin.coin_id(),
                Self::puzzle_hash(self.asset_id, p2_puzzle_hash).into(),
                amount,
            ),
            lineage_proof: Some(self.child_lineage_proof()),
            asset_id: self.asset_id,
            p2_puzzle_hash,
        }
    }

    /// Parses the children of a coin spend, if the spent coin was a CAT.
    /// Returns `None` for parents that aren't CATs, including the coin a CAT
    /// was issued from.
    pub fn parse_children(
        allocator: &mut Allocator,
        coin_spend: &CoinSpend,
    ) -> Result<Option<Vec<Self>>, DriverError> {
        let parent_puzzle = coin_spend.puzzle_reveal.to_clvm(allocator)?;
        let parent_solution = coin_spend.solution.to_clvm(allocator)?;
        let parent_puzzle = Puzzle::parse(allocator, parent_puzzle);

        let Some(parent_puzzle) = parent_puzzle.as_curried() else {
            return Ok(None);
        };

        if parent_puzzle.mod_hash != TreeHash::new(CAT_PUZZLE_HASH) {
            return Ok(None);
        }

        let args = CatArgs::<NodePtr>::from_clvm(allocator, parent_puzzle.args)?;

        if args.mod_hash != Bytes32::from(CAT_PUZZLE_HASH) {
            return Err(DriverError::InvalidModHash);
        }

        let solution = CatSolution::<NodePtr>::from_clvm(allocator, parent_solution)?;

        let parent_inner_puzzle_hash = tree_hash(allocator, args.inner_puzzle);
        let lineage_proof = LineageProof {
            parent_parent_coin_info: coin_spend.coin.parent_coin_info,
            parent_inner_puzzle_hash: parent_inner_puzzle_hash.into(),
            parent_amount: coin_spend.coin.amount,
        };

        let output = run_puzzle(allocator, args.inner_puzzle, solution.inner_puzzle_solution)?;

        let children = parse_conditions(allocator, output)?
            .into_iter()
            .filter_map(Condition::into_create_coin)
            .map(|create_coin| Self {
                coin: Coin::new(
                    coin_spend.coin.coin_id(),
                    Self::puzzle_hash(args.asset_id, create_coin.puzzle_hash).into(),
                    create_coin.amount,
                ),
                lineage_proof: Some(lineage_proof),
                asset_id: args.asset_id,
                p2_puzzle_hash: create_coin.puzzle_hash,
            })
            .collect();

        Ok(Some(children))
    }
}

#[cfg(test)]
mod tests {
    use chia_puzzle_types::Memos;
    use clvm_traits::clvm_quote;
    use clvm_utils::CurriedProgram;

    use crate::SpendContext;

    use super::*;
    use cat_wallet_types::CreateCoin;

    #[test]
    fn test_wrapped_child() {
        let asset_id = Bytes32::from([1; 32]);
        let inner = Bytes32::from([2; 32]);

        let parent = Cat::new(
            Coin::new(
                Bytes32::from([3; 32]),
                Cat::puzzle_hash(asset_id, inner).into(),
                100,
            ),
            None,
            asset_id,
            inner,
        );

        let child_inner = Bytes32::from([4; 32]);
        let child = parent.wrapped_child(child_inner, 60);

        assert_eq!(child.coin.parent_coin_info, parent.coin.coin_id());
        assert_eq!(
            child.coin.puzzle_hash,
            Bytes32::from(Cat::puzzle_hash(asset_id, child_inner))
        );
        assert_eq!(child.lineage_proof, Some(parent.child_lineage_proof()));
        assert_eq!(
            child.lineage_proof.unwrap().parent_inner_puzzle_hash,
            inner
        );
    }

    #[test]
    fn test_parse_children() -> anyhow::Result<()> {
        let mut ctx = SpendContext::new();
        let asset_id = Bytes32::from([1; 32]);

        let child_inner = Bytes32::from([4; 32]);
        let inner_puzzle = ctx.alloc(&clvm_quote!([Condition::CreateCoin(CreateCoin::new(
            child_inner,
            75,
            Memos::<NodePtr>::None,
        ))]))?;
        let inner_puzzle_hash = ctx.tree_hash(inner_puzzle);

        let cat_puzzle = ctx.cat_puzzle()?;
        let puzzle = ctx.alloc(&CurriedProgram {
            program: cat_puzzle,
            args: CatArgs::new(asset_id, inner_puzzle),
        })?;

        let coin = Coin::new(Bytes32::from([3; 32]), ctx.tree_hash(puzzle).into(), 75);
        let solution = ctx.alloc(&CatSolution {
            inner_puzzle_solution: NodePtr::NIL,
            lineage_proof: None,
            prev_coin_id: coin.coin_id(),
            this_coin_info: coin,
            next_coin_proof: chia_puzzle_types::CoinProof {
                parent_coin_info: coin.parent_coin_info,
                inner_puzzle_hash: inner_puzzle_hash.into(),
                amount: coin.amount,
            },
            prev_subtotal: 0,
            extra_delta: 0,
        })?;

        let puzzle_reveal = ctx.serialize(&puzzle)?;
        let solution = ctx.serialize(&solution)?;
        let coin_spend = CoinSpend::new(coin, puzzle_reveal, solution);

        let children = Cat::parse_children(&mut ctx.allocator, &coin_spend)?
            .expect("parent should be a cat");

        assert_eq!(children.len(), 1);
        assert_eq!(children[0].asset_id, asset_id);
        assert_eq!(children[0].p2_puzzle_hash, child_inner);
        assert_eq!(children[0].coin.amount, 75);
        assert_eq!(
            children[0].lineage_proof,
            Some(LineageProof {
                parent_parent_coin_info: coin.parent_coin_info,
                parent_inner_puzzle_hash: inner_puzzle_hash.into(),
                parent_amount: 75,
            })
        );

        Ok(())
    }

    #[test]
    fn test_non_cat_parent_is_ignored() -> anyhow::Result<()> {
        let mut ctx = SpendContext::new();

        let puzzle = ctx.alloc(&clvm_quote!([Condition::CreateCoin(CreateCoin::new(
            Bytes32::from([4; 32]),
            75,
            Memos::<NodePtr>::None,
        ))]))?;

        let coin = Coin::new(Bytes32::from([3; 32]), ctx.tree_hash(puzzle).into(), 75);
        let puzzle_reveal = ctx.serialize(&puzzle)?;
        let solution = ctx.serialize(&NodePtr::NIL)?;
        let coin_spend = CoinSpend::new(coin, puzzle_reveal, solution);

        assert!(Cat::parse_children(&mut ctx.allocator, &coin_spend)?.is_none());

        Ok(())
    }
}
