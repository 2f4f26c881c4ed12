use chia_protocol::{Bytes, Bytes32};
use chia_puzzle_types::Memos;
use clvm_traits::{apply_constants, FromClvm, FromClvmError, ToClvm, ToClvmError};
use clvmr::{reduction::EvalErr, Allocator, NodePtr};
use thiserror::Error;

use crate::run_puzzle;

#[derive(Debug, Error)]
pub enum ConditionError {
    #[error("eval error: {0}")]
    Eval(#[from] EvalErr),

    #[error("failed to serialize clvm value: {0}")]
    ToClvm(#[from] ToClvmError),

    #[error("failed to deserialize clvm value: {0}")]
    FromClvm(#[from] FromClvmError),
}

#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[clvm(list)]
pub struct CreateCoin<T = NodePtr> {
    #[clvm(constant = 51)]
    pub opcode: u8,
    pub puzzle_hash: Bytes32,
    pub amount: u64,
    #[clvm(rest)]
    pub memos: Memos<T>,
}

impl<T> CreateCoin<T> {
    pub fn new(puzzle_hash: Bytes32, amount: u64, memos: Memos<T>) -> Self {
        Self {
            puzzle_hash,
            amount,
            memos,
        }
    }
}

impl CreateCoin<NodePtr> {
    /// Creates the coin with a hint memo so that the receiving wallet can
    /// recognize the wrapped puzzle hash, followed by any caller memos.
    pub fn hinted(
        allocator: &mut Allocator,
        puzzle_hash: Bytes32,
        amount: u64,
        hint: Bytes32,
        extra_memos: &[Bytes],
    ) -> Result<Self, ToClvmError> {
        let mut memos = vec![Bytes::from(hint.to_vec())];
        memos.extend_from_slice(extra_memos);
        Ok(Self::new(
            puzzle_hash,
            amount,
            Memos::Some(memos.to_clvm(allocator)?),
        ))
    }
}

#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[clvm(list)]
pub struct ReserveFee {
    #[clvm(constant = 52)]
    pub opcode: u8,
    pub amount: u64,
}

impl ReserveFee {
    pub fn new(amount: u64) -> Self {
        Self { amount }
    }
}

/// The magic condition that reveals and runs a CAT's TAIL program, permitting
/// supply changes. Only valid inside a CAT inner puzzle's output.
#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[clvm(list)]
pub struct RunCatTail<P = NodePtr, S = NodePtr> {
    #[clvm(constant = 51)]
    pub opcode: u8,
    #[clvm(constant = ())]
    pub blank_puzzle_hash: (),
    #[clvm(constant = -113)]
    pub magic_amount: i8,
    pub program: P,
    pub solution: S,
}

impl<P, S> RunCatTail<P, S> {
    pub fn new(program: P, solution: S) -> Self {
        Self { program, solution }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToClvm, FromClvm)]
#[clvm(transparent)]
pub enum Condition<T = NodePtr> {
    RunCatTail(RunCatTail<T, T>),
    CreateCoin(CreateCoin<T>),
    ReserveFee(ReserveFee),
    Other(T),
}

impl<T> Condition<T> {
    pub fn into_create_coin(self) -> Option<CreateCoin<T>> {
        match self {
            Self::CreateCoin(create_coin) => Some(create_coin),
            _ => None,
        }
    }

    pub fn as_create_coin(&self) -> Option<&CreateCoin<T>> {
        match self {
            Self::CreateCoin(create_coin) => Some(create_coin),
            _ => None,
        }
    }
}

impl<T> From<CreateCoin<T>> for Condition<T> {
    fn from(value: CreateCoin<T>) -> Self {
        Self::CreateCoin(value)
    }
}

impl<T> From<ReserveFee> for Condition<T> {
    fn from(value: ReserveFee) -> Self {
        Self::ReserveFee(value)
    }
}

impl<T> From<RunCatTail<T, T>> for Condition<T> {
    fn from(value: RunCatTail<T, T>) -> Self {
        Self::RunCatTail(value)
    }
}

pub fn parse_conditions(
    allocator: &Allocator,
    conditions: NodePtr,
) -> Result<Vec<Condition>, ConditionError> {
    Vec::<NodePtr>::from_clvm(allocator, conditions)?
        .into_iter()
        .map(|condition| Ok(Condition::from_clvm(allocator, condition)?))
        .collect()
}

pub fn puzzle_conditions(
    allocator: &mut Allocator,
    puzzle: NodePtr,
    solution: NodePtr,
) -> Result<Vec<Condition>, ConditionError> {
    let output = run_puzzle(allocator, puzzle, solution)?;
    parse_conditions(allocator, output)
}

#[cfg(test)]
mod tests {
    use clvm_traits::clvm_quote;

    use super::*;

    fn roundtrip(allocator: &mut Allocator, condition: Condition) -> Condition {
        let ptr = condition.to_clvm(allocator).unwrap();
        Condition::from_clvm(allocator, ptr).unwrap()
    }

    #[test]
    fn test_create_coin_roundtrip() {
        let mut allocator = Allocator::new();

        let condition = Condition::CreateCoin(CreateCoin::new(
            Bytes32::from([1; 32]),
            1000,
            Memos::None,
        ));
        assert_eq!(roundtrip(&mut allocator, condition), condition);

        let hinted = CreateCoin::hinted(
            &mut allocator,
            Bytes32::from([2; 32]),
            42,
            Bytes32::from([3; 32]),
            &[],
        )
        .unwrap();
        let condition = Condition::CreateCoin(hinted);
        assert_eq!(roundtrip(&mut allocator, condition), condition);
    }

    #[test]
    fn test_reserve_fee_roundtrip() {
        let mut allocator = Allocator::new();
        let condition = Condition::ReserveFee(ReserveFee::new(1));
        assert_eq!(roundtrip(&mut allocator, condition), condition);
    }

    #[test]
    fn test_run_tail_is_not_create_coin() {
        let mut allocator = Allocator::new();

        let program = allocator.one();
        let condition = Condition::RunCatTail(RunCatTail::new(program, NodePtr::NIL));
        let parsed = roundtrip(&mut allocator, condition);
        assert!(matches!(parsed, Condition::RunCatTail(..)));
        assert!(parsed.into_create_coin().is_none());
    }

    #[test]
    fn test_quoted_conditions_output() {
        let mut allocator = Allocator::new();

        let create_coin = CreateCoin::new(Bytes32::from([7; 32]), 70, Memos::None);
        let puzzle = clvm_quote!([Condition::CreateCoin(create_coin)])
            .to_clvm(&mut allocator)
            .unwrap();

        let conditions =
            puzzle_conditions(&mut allocator, puzzle, NodePtr::NIL).unwrap();
        assert_eq!(conditions, vec![Condition::CreateCoin(create_coin)]);
    }
}
