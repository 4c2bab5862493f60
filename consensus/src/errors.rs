use crate::processes::{ghostdag::GhostdagError, reachability::ReachabilityError};
use blockdag_consensus_core::{config::constants::consensus::BLOCK_VERSION, errors::config::ConfigError};
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;
use thiserror::Error;

/// The semantic kind of a consensus failure. Only `InvariantViolation` is fatal;
/// all other kinds are recoverable by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    UnknownParent,
    ChainDisjoint,
    BadHeader,
    InvalidPoW,
    BadQuery,
    BadConfig,
    InvariantViolation,
}

/// A block admission failure
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("block {0} already exists")]
    AlreadyExists(Hash),

    #[error("block {0} references unknown parents {1:?}")]
    UnknownParents(Hash, Vec<Hash>),

    #[error("block {0} has no parents")]
    NoParents(Hash),

    #[error("block {0} has too many parents: got {1} when the limit is {2}")]
    TooManyParents(Hash, usize, u8),

    #[error("block {0} references parent {1} more than once")]
    DuplicateParent(Hash, Hash),

    #[error("block {0} parent {1} is an ancestor of its other parent {2}")]
    InvalidParentsRelation(Hash, Hash, Hash),

    #[error("block {0} has wrong version: got {1} but expected {}", BLOCK_VERSION)]
    WrongBlockVersion(Hash, u16),

    #[error("block {0} timestamp {1} is older than the past median time {2}")]
    TimeTooOld(Hash, i64, i64),

    #[error("block {0} timestamp {1} is too far into the future, the maximum allowed is {2}")]
    TimeTooFarIntoTheFuture(Hash, i64, i64),

    #[error("block {0} has bits {1:#010x} while {2:#010x} is required")]
    UnexpectedDifficulty(Hash, u32, u32),

    #[error("block {0} target of bits {1:#010x} is out of range")]
    TargetOutOfRange(Hash, u32),

    #[error("block {0} hash is higher than its target")]
    InvalidPoW(Hash),

    #[error("coloring failed: {0}")]
    Ghostdag(#[from] GhostdagError),

    #[error("reachability failed: {0}")]
    Reachability(#[from] ReachabilityError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),
}

impl RuleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuleError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            RuleError::UnknownParents(..) => ErrorKind::UnknownParent,
            RuleError::NoParents(_)
            | RuleError::TooManyParents(..)
            | RuleError::DuplicateParent(..)
            | RuleError::InvalidParentsRelation(..)
            | RuleError::WrongBlockVersion(..)
            | RuleError::TimeTooOld(..)
            | RuleError::TimeTooFarIntoTheFuture(..)
            | RuleError::UnexpectedDifficulty(..)
            | RuleError::TargetOutOfRange(..) => ErrorKind::BadHeader,
            RuleError::InvalidPoW(_) => ErrorKind::InvalidPoW,
            // All parents are known at this point, so a failing lookup means broken internal state
            RuleError::Ghostdag(_) | RuleError::Reachability(_) | RuleError::Store(_) => ErrorKind::InvariantViolation,
        }
    }
}

pub type BlockProcessResult<T> = std::result::Result<T, RuleError>;

/// A query failure
#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("block {0} was not found")]
    BlockNotFound(Hash),

    #[error("blocks {0} and {1} are not on a common selected parent chain")]
    ChainDisjoint(Hash, Hash),

    #[error("low block {0} does not have a lower blue score than high block {1}")]
    InvalidRange(Hash, Hash),

    #[error("genesis block {0} cannot be marked invalid")]
    GenesisInvalidation(Hash),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),

    #[error("reachability failed: {0}")]
    Reachability(#[from] ReachabilityError),

    #[error("coloring failed: {0}")]
    Ghostdag(#[from] GhostdagError),
}

impl ConsensusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsensusError::BlockNotFound(_) => ErrorKind::NotFound,
            ConsensusError::ChainDisjoint(..) => ErrorKind::ChainDisjoint,
            ConsensusError::InvalidRange(..) | ConsensusError::GenesisInvalidation(_) => ErrorKind::BadQuery,
            ConsensusError::Config(_) => ErrorKind::BadConfig,
            ConsensusError::Store(_) | ConsensusError::Reachability(_) | ConsensusError::Ghostdag(_) => ErrorKind::InvariantViolation,
        }
    }
}

pub type ConsensusResult<T> = std::result::Result<T, ConsensusError>;
