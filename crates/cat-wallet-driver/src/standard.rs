use cat_wallet_types::Condition;
use chia_bls::PublicKey;
use chia_protocol::Bytes32;
use chia_puzzle_types::standard::{StandardArgs, StandardSolution};
use clvm_utils::CurriedProgram;

use crate::{DriverError, Spend, SpendContext};

/// The standard p2 puzzle, locked to a synthetic key. Used as the inner
/// puzzle of the CAT coins a wallet controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardP2 {
    pub synthetic_key: PublicKey,
}

impl StandardP2 {
    pub fn new(synthetic_key: PublicKey) -> Self {
        Self { synthetic_key }
    }

    pub fn puzzle_hash(&self) -> Bytes32 {
        StandardArgs::curry_tree_hash(self.synthetic_key).into()
    }

    /// Spends the puzzle with a quoted delegated puzzle that outputs the
    /// given conditions directly.
    pub fn spend(
        &self,
        ctx: &mut SpendContext,
        conditions: Vec<Condition>,
    ) -> Result<Spend, DriverError> {
        let standard_puzzle = ctx.standard_puzzle()?;
        let puzzle = ctx.alloc(&CurriedProgram {
            program: standard_puzzle,
            args: StandardArgs::new(self.synthetic_key),
        })?;
        let solution = ctx.alloc(&StandardSolution::from_conditions(conditions))?;
        Ok(Spend::new(puzzle, solution))
    }
}
