//! Consensus ordering over a block DAG.
//!
//! Admitted blocks are colored with GHOSTDAG, indexed for reachability queries and tracked
//! in an in-memory block index which is flushed to a [`BlockNodesStore`] on demand. The
//! [`Consensus`] facade serializes admissions and serves ordering, difficulty and sync queries.
//!
//! Every admitted block satisfies:
//!
//! - all of its parents were admitted before it, so the index is closed under parents
//! - its blue set (including its selected parent chain blues) is a k-cluster
//! - the reachability interval of a tree child is contained in the interval of its tree parent
//!
//! [`BlockNodesStore`]: model::stores::block_nodes::BlockNodesStore
//! [`Consensus`]: consensus::Consensus

pub mod consensus;
pub mod errors;
pub mod model;
pub mod processes;

#[cfg(test)]
pub mod test_helpers;
