use super::{GhostdagResult, ordering::SortableBlock, protocol::GhostdagManager};
use crate::model::{
    services::reachability::ReachabilityService,
    stores::{ghostdag::GhostdagStoreReader, relations::RelationsStoreReader},
};
use blockdag_consensus_core::{BlockHashSet, HashMapCustomHasher};
use blockdag_hashes::Hash;
use std::collections::VecDeque;

impl<T: GhostdagStoreReader, S: RelationsStoreReader, U: ReachabilityService> GhostdagManager<T, S, U> {
    /// Returns the blocks in the past of `parents` which are not in the past of `selected_parent`,
    /// excluding the selected parent itself, sorted by (blue score, hash)
    pub fn ordered_mergeset_without_selected_parent(&self, selected_parent: Hash, parents: &[Hash]) -> GhostdagResult<Vec<Hash>> {
        let mut queue: VecDeque<_> = parents.iter().copied().filter(|p| p != &selected_parent).collect();
        let mut mergeset: BlockHashSet = queue.iter().copied().collect();
        let mut selected_parent_past = BlockHashSet::new();

        while let Some(current) = queue.pop_front() {
            let current_parents = self.relations_store.get_parents(current)?;

            // For each parent of the current block we check whether it is in the past of the selected parent. If not,
            // we add it to the resulting merge-set and queue it for further processing.
            for parent in current_parents.iter() {
                if mergeset.contains(parent) {
                    continue;
                }

                if selected_parent_past.contains(parent) {
                    continue;
                }

                if self.reachability_service.is_dag_ancestor_of(*parent, selected_parent)? {
                    selected_parent_past.insert(*parent);
                    continue;
                }

                mergeset.insert(*parent);
                queue.push_back(*parent);
            }
        }

        self.sort_blocks(mergeset)
    }

    /// Sorts `blocks` by (blue score, hash) ascending
    pub fn sort_blocks(&self, blocks: impl IntoIterator<Item = Hash>) -> GhostdagResult<Vec<Hash>> {
        let mut sorted_blocks = blocks
            .into_iter()
            .map(|block| Ok(SortableBlock::new(block, self.ghostdag_store.get_blue_score(block)?)))
            .collect::<GhostdagResult<Vec<_>>>()?;
        sorted_blocks.sort();
        Ok(sorted_blocks.into_iter().map(|block| block.hash).collect())
    }
}
