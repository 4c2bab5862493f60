mod extensions;
pub mod inquirer;
pub mod interval;
mod reindex;
mod tree;

use blockdag_database::prelude::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReachabilityError {
    #[error("data store error")]
    StoreError(#[from] StoreError),

    #[error("data overflow error: {0}")]
    DataOverflow(String),

    #[error("data inconsistency error")]
    DataInconsistency,

    #[error("query is inconsistent")]
    BadQuery,
}

impl ReachabilityError {
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, ReachabilityError::StoreError(e) if matches!(e, StoreError::KeyNotFound(_) | StoreError::HashNotFound(_)))
    }
}

pub type Result<T> = std::result::Result<T, ReachabilityError>;
