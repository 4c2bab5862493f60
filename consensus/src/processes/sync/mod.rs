use crate::{
    errors::{ConsensusError, ConsensusResult},
    model::{
        block_heap::BlockHeap,
        block_node::BlockNode,
        block_set::BlockSet,
        services::reachability::ReachabilityService,
        stores::block_index::BlockNodeStoreReader,
    },
};
use blockdag_consensus_core::BlueScore;
use blockdag_database::prelude::StoreResultExtensions;
use blockdag_hashes::Hash;
use std::sync::Arc;

/// Locator entries are consecutive until this many have been collected, after which the
/// distance between entries doubles with each step
const LOCATOR_DENSE_ENTRIES: usize = 10;

/// Serves the queries peers need in order to sync: block locators and the blocks
/// between locator boundaries
#[derive(Clone)]
pub struct SyncManager<T: BlockNodeStoreReader, U: ReachabilityService> {
    genesis_hash: Hash,
    store: Arc<T>,
    reachability_service: U,
}

impl<T: BlockNodeStoreReader, U: ReachabilityService> SyncManager<T, U> {
    pub fn new(genesis_hash: Hash, store: Arc<T>, reachability_service: U) -> Self {
        Self { genesis_hash, store, reachability_service }
    }

    /// Builds a locator of selected chain hashes from `start` down to `stop`. The locator starts
    /// at `start`, is dense near it and gets exponentially sparser toward `stop`, which is
    /// always the last entry.
    pub fn block_locator(&self, start: &Arc<BlockNode>, stop: &Arc<BlockNode>) -> ConsensusResult<Vec<Hash>> {
        let distance = start.blue_score().saturating_sub(stop.blue_score());
        let mut locator = Vec::with_capacity(LOCATOR_DENSE_ENTRIES + 2 + distance.checked_ilog2().unwrap_or(0) as usize);
        let mut step: BlueScore = 1;
        let mut current = start.clone();
        loop {
            locator.push(current.hash);
            if current.blue_score() <= stop.blue_score() {
                if current.hash != stop.hash {
                    return Err(ConsensusError::ChainDisjoint(start.hash, stop.hash));
                }
                break;
            }

            let next_blue_score = current.blue_score().saturating_sub(step).max(stop.blue_score());
            current = self.selected_ancestor_at_blue_score(current, next_blue_score)?;

            if locator.len() > LOCATOR_DENSE_ENTRIES {
                step *= 2;
            }
        }
        Ok(locator)
    }

    /// Returns the highest selected chain ancestor of `node` (inclusive) with a blue score not above `blue_score`
    fn selected_ancestor_at_blue_score(&self, node: Arc<BlockNode>, blue_score: BlueScore) -> ConsensusResult<Arc<BlockNode>> {
        let mut current = node;
        while current.blue_score() > blue_score {
            match current.selected_parent() {
                Some(selected_parent) => current = self.store.get_node(selected_parent)?,
                None => break,
            }
        }
        Ok(current)
    }

    /// Finds the boundaries of the next batch of blocks a peer holding `locator` is missing.
    /// The low boundary is the first locator entry known locally (genesis if none is), and the
    /// high boundary is the entry preceding it, if any.
    pub fn find_next_locator_boundaries(&self, locator: &[Hash]) -> ConsensusResult<(Option<Hash>, Hash)> {
        let mut low = self.genesis_hash;
        let mut next_index = locator.len() as i64 - 1;
        for (i, hash) in locator.iter().copied().enumerate() {
            if self.store.get_node(hash).optional()?.is_some() {
                low = hash;
                next_index = i as i64 - 1;
                break;
            }
        }
        if next_index < 0 {
            return Ok((None, low));
        }
        Ok((Some(locator[next_index as usize]), low))
    }

    /// Returns the blocks in the past of `high` (inclusive) and not in the past of `low` (inclusive),
    /// ordered by (blue score, hash) and bounded by `max_entries`. When the range is too large,
    /// `high` is first lowered along its selected chain so the result stays close to `low`, but
    /// never to a block whose blue score is not above `low`'s.
    pub fn antipast_hashes_between(&self, low: &Arc<BlockNode>, high: &Arc<BlockNode>, max_entries: usize) -> ConsensusResult<Vec<Hash>> {
        if low.blue_score() >= high.blue_score() {
            return Err(ConsensusError::InvalidRange(low.hash, high.hash));
        }

        // High stays above low's blue score, even when low is off its selected chain
        let mut high = high.clone();
        while high.blue_score() - low.blue_score() + 1 > max_entries as u64 {
            let Some(selected_parent) = high.selected_parent() else { break };
            let selected_parent = self.store.get_node(selected_parent)?;
            if selected_parent.blue_score() <= low.blue_score() {
                break;
            }
            high = selected_parent;
        }

        let mut visited = BlockSet::new();
        let mut candidates = BlockHeap::new_up();
        let mut queue = BlockHeap::new_down();
        queue.push(high);
        while let Some(current) = queue.pop() {
            if visited.contains(&current.hash) {
                continue;
            }
            visited.add(current.clone());
            if self.reachability_service.is_dag_ancestor_of(current.hash, low.hash)? {
                continue;
            }
            for parent in current.parents.iter().copied() {
                queue.push(self.store.get_node(parent)?);
            }
            candidates.push(current);
        }

        Ok(std::iter::from_fn(|| candidates.pop()).take(max_entries).map(|node| node.hash).collect())
    }
}
