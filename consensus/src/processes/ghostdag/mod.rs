pub mod mergeset;
pub mod ordering;
pub mod protocol;

use crate::processes::reachability::ReachabilityError;
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GhostdagError {
    #[error("reachability error: {0}")]
    Reachability(#[from] ReachabilityError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("blue anticone size of {0} is {1}, exceeding k = {2}")]
    AnticoneOverflow(Hash, u8, u8),

    #[error("blue anticone size of {0} is missing from the selected chain of the new block")]
    MissingAnticoneSize(Hash),

    #[error("cannot color a block without parents")]
    NoParents,
}

impl GhostdagError {
    /// Whether the error reflects broken internal state rather than bad input
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, GhostdagError::AnticoneOverflow(..) | GhostdagError::MissingAnticoneSize(_))
    }
}

pub type GhostdagResult<T> = std::result::Result<T, GhostdagError>;
