use super::{GhostdagError, GhostdagResult, ordering::bluest_key};
use crate::model::{
    services::reachability::ReachabilityService,
    stores::{ghostdag::GhostdagData, ghostdag::GhostdagStoreReader, relations::RelationsStoreReader},
};
use blockdag_consensus_core::{BlockHashMap, BlueScore, HashMapCustomHasher, KType};
use blockdag_hashes::Hash;
use std::sync::Arc;

/// The GHOSTDAG coloring protocol: for a new block it selects the bluest parent, and colors
/// the mergeset blue or red such that the blue set remains a k-cluster
#[derive(Clone)]
pub struct GhostdagManager<T: GhostdagStoreReader, S: RelationsStoreReader, U: ReachabilityService> {
    genesis_hash: Hash,
    pub(super) k: KType,
    pub(super) ghostdag_store: Arc<T>,
    pub(super) relations_store: Arc<S>,
    pub(super) reachability_service: U,
}

/// The state of a blue candidate as seen from a specific chain block
enum ColoringState {
    Blue,
    Red,
    Pending,
}

/// The final decision for a blue candidate
enum ColoringOutput {
    /// Blue, with the candidate's blue anticone size and the sizes of the blues in its anticone
    Blue(KType, BlockHashMap<KType>),
    Red,
}

/// A block on the tentative selected chain of the new block. The new block itself
/// has no hash since it is not yet known to the reachability index
struct ChainBlock<'a> {
    hash: Option<Hash>,
    data: ChainBlockData<'a>,
}

enum ChainBlockData<'a> {
    New(&'a GhostdagData),
    Stored(Arc<GhostdagData>),
}

impl ChainBlockData<'_> {
    fn get(&self) -> &GhostdagData {
        match self {
            ChainBlockData::New(data) => data,
            ChainBlockData::Stored(data) => data,
        }
    }
}

impl<T: GhostdagStoreReader, S: RelationsStoreReader, U: ReachabilityService> GhostdagManager<T, S, U> {
    pub fn new(genesis_hash: Hash, k: KType, ghostdag_store: Arc<T>, relations_store: Arc<S>, reachability_service: U) -> Self {
        Self { genesis_hash, k, ghostdag_store, relations_store, reachability_service }
    }

    pub fn k(&self) -> KType {
        self.k
    }

    pub fn genesis_ghostdag_data(&self) -> GhostdagData {
        GhostdagData::genesis(self.genesis_hash)
    }

    /// Returns the parent with the highest blue score, ties broken in favor of the smaller hash
    pub fn find_selected_parent(&self, parents: impl IntoIterator<Item = Hash>) -> GhostdagResult<Hash> {
        let mut best: Option<(Hash, BlueScore)> = None;
        for parent in parents {
            let blue_score = self.ghostdag_store.get_blue_score(parent)?;
            if best.is_none_or(|(hash, score)| bluest_key(parent, blue_score) > bluest_key(hash, score)) {
                best = Some((parent, blue_score));
            }
        }
        best.map(|(hash, _)| hash).ok_or(GhostdagError::NoParents)
    }

    /// Runs the GHOSTDAG protocol and calculates the block coloring data of a new block
    /// `block` with the given `parents`. The parents must all be known, while `block` itself
    /// is never queried from the stores, so the virtual block may be colored the same way.
    ///
    /// The protocol works as follows:
    ///
    /// 1. The selected parent is the bluest parent.
    /// 2. The mergeset of the block (the blocks in its past which are not in the past of its
    ///    selected parent) is traversed in (blue score, hash) order.
    /// 3. Each candidate is colored blue if adding it keeps the blue set a k-cluster, that is,
    ///    neither its blue anticone nor the blue anticone of any blue in its anticone grows
    ///    beyond k. The check walks the tentative selected chain of the new block and stops
    ///    at the first chain block in the past of the candidate.
    /// 4. The blue score is the selected parent score plus the number of mergeset blues.
    pub fn ghostdag(&self, block: Hash, parents: &[Hash]) -> GhostdagResult<GhostdagData> {
        let selected_parent = self.find_selected_parent(parents.iter().copied())?;
        let mut new_block_data = Arc::new(GhostdagData::new_with_selected_parent(block, selected_parent, self.k));

        let ordered_mergeset = self.ordered_mergeset_without_selected_parent(selected_parent, parents)?;

        for blue_candidate in ordered_mergeset.iter().cloned() {
            match self.check_blue_candidate(&new_block_data, blue_candidate)? {
                ColoringOutput::Blue(blue_anticone_size, blues_anticone_sizes) => {
                    // No need to check for the k-cluster bound here since `check_blue_candidate`
                    // rejects all candidates once there are k + 1 blues
                    new_block_data.add_blue(blue_candidate, blue_anticone_size, &blues_anticone_sizes);
                }
                ColoringOutput::Red => {
                    new_block_data.add_red(blue_candidate);
                }
            }
        }

        let blue_score = self.ghostdag_store.get_blue_score(selected_parent)? + new_block_data.mergeset_blues.len() as u64;
        new_block_data.finalize_score(blue_score);

        Ok(Arc::try_unwrap(new_block_data).unwrap_or_else(|data| (*data).clone()))
    }

    fn check_blue_candidate_with_chain_block(
        &self,
        new_block_data: &GhostdagData,
        chain_block: &ChainBlock,
        blue_candidate: Hash,
        candidate_blues_anticone_sizes: &mut BlockHashMap<KType>,
        candidate_blue_anticone_size: &mut KType,
    ) -> GhostdagResult<ColoringState> {
        // If blue_candidate is in the future of chain_block, it means
        // that all remaining blues are in the past of chain_block and thus
        // in the past of blue_candidate. In this case we know for sure that
        // the anticone of blue_candidate will not exceed K, and we can mark
        // it as blue.
        //
        // The new block is always in the future of blue_candidate, so there's
        // no point in checking it.
        if let Some(hash) = chain_block.hash
            && self.reachability_service.is_dag_ancestor_of(hash, blue_candidate)?
        {
            return Ok(ColoringState::Blue);
        }

        for block in chain_block.data.get().mergeset_blues.iter().copied() {
            // Skip blocks that exist in the past of blue_candidate.
            if self.reachability_service.is_dag_ancestor_of(block, blue_candidate)? {
                continue;
            }

            let block_blue_anticone_size = self.blue_anticone_size(block, new_block_data)?;
            candidate_blues_anticone_sizes.insert(block, block_blue_anticone_size);

            *candidate_blue_anticone_size += 1;
            if *candidate_blue_anticone_size > self.k {
                // k-cluster violation: The candidate's blue anticone exceeded k
                return Ok(ColoringState::Red);
            }

            if block_blue_anticone_size == self.k {
                // k-cluster violation: A block in candidate's blue anticone already
                // has k blue blocks in its own anticone
                return Ok(ColoringState::Red);
            }

            // This is a sanity check that validates that a blue
            // block's blue anticone is not already larger than K.
            if block_blue_anticone_size > self.k {
                return Err(GhostdagError::AnticoneOverflow(block, block_blue_anticone_size, self.k));
            }
        }

        Ok(ColoringState::Pending)
    }

    /// Returns the blue anticone size of `block` from the worldview of `context`.
    /// Expects `block` to be in the blue set of `context`
    fn blue_anticone_size(&self, block: Hash, context: &GhostdagData) -> GhostdagResult<KType> {
        if let Some(size) = context.blues_anticone_sizes.get(&block) {
            return Ok(*size);
        }
        let mut current_selected_parent = context.selected_parent;
        loop {
            let current = self.ghostdag_store.get_data(current_selected_parent)?;
            if let Some(size) = current.blues_anticone_sizes.get(&block) {
                return Ok(*size);
            }
            if !current.has_selected_parent() {
                return Err(GhostdagError::MissingAnticoneSize(block));
            }
            current_selected_parent = current.selected_parent;
        }
    }

    fn check_blue_candidate(&self, new_block_data: &GhostdagData, blue_candidate: Hash) -> GhostdagResult<ColoringOutput> {
        // The maximum length of new_block_data.mergeset_blues can be K+1 because
        // it contains the selected parent.
        if new_block_data.mergeset_blues.len() as u64 == self.k as u64 + 1 {
            return Ok(ColoringOutput::Red);
        }

        let mut candidate_blues_anticone_sizes: BlockHashMap<KType> = BlockHashMap::with_capacity(self.k as usize);

        // Iterate over all blocks in the blue past of the new block that are not in the past
        // of blue_candidate, and check for each one of them if blue_candidate potentially
        // enlarges their blue anticone to be over K, or that they enlarge the blue anticone
        // of blue_candidate to be over K.
        let mut chain_block = ChainBlock { hash: None, data: ChainBlockData::New(new_block_data) };
        let mut candidate_blue_anticone_size: KType = 0;

        loop {
            let state = self.check_blue_candidate_with_chain_block(
                new_block_data,
                &chain_block,
                blue_candidate,
                &mut candidate_blues_anticone_sizes,
                &mut candidate_blue_anticone_size,
            )?;

            match state {
                ColoringState::Blue => return Ok(ColoringOutput::Blue(candidate_blue_anticone_size, candidate_blues_anticone_sizes)),
                ColoringState::Red => return Ok(ColoringOutput::Red),
                ColoringState::Pending => (), // continue looping
            }

            let selected_parent = chain_block.data.get().selected_parent;
            if !chain_block.data.get().has_selected_parent() {
                // Genesis is in the past of every block, so this is only reached on broken data
                return Err(GhostdagError::MissingAnticoneSize(blue_candidate));
            }
            chain_block = ChainBlock { hash: Some(selected_parent), data: ChainBlockData::Stored(self.ghostdag_store.get_data(selected_parent)?) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{
            block_node::BlockNode,
            block_set::BlockSet,
            services::reachability::MTReachabilityService,
            stores::{block_index::BlockIndex, reachability::MemoryReachabilityStore},
        },
        processes::reachability::inquirer,
        test_helpers::header_from_precomputed_hash,
    };
    use blockdag_consensus_core::{
        blockhash::{self, BlockHashExtensions},
        blockstatus::BlockStatus,
        config::constants::perf::{DEFAULT_REINDEX_DEPTH, DEFAULT_REINDEX_SLACK},
    };
    use parking_lot::RwLock;

    type Manager = GhostdagManager<BlockIndex, BlockIndex, MTReachabilityService<MemoryReachabilityStore>>;

    struct Fixture {
        index: Arc<BlockIndex>,
        reachability: Arc<RwLock<MemoryReachabilityStore>>,
        manager: Manager,
    }

    impl Fixture {
        fn new(genesis: u64, k: KType) -> Self {
            let genesis = Hash::from(genesis);
            let index = Arc::new(BlockIndex::new());
            let reachability = Arc::new(RwLock::new(MemoryReachabilityStore::new()));
            inquirer::init(&mut *reachability.write(), genesis).unwrap();
            let manager =
                GhostdagManager::new(genesis, k, index.clone(), index.clone(), MTReachabilityService::new(reachability.clone()));
            let node = BlockNode::new(
                &header_from_precomputed_hash(genesis, vec![], 0),
                &BlockSet::new(),
                Arc::new(manager.genesis_ghostdag_data()),
            )
            .unwrap();
            index.add_node(Arc::new(node), BlockStatus::VALID);
            Self { index, reachability, manager }
        }

        fn add(&self, hash: u64, parents: &[u64]) -> Arc<GhostdagData> {
            let hash = Hash::from(hash);
            let parents: Vec<Hash> = parents.iter().copied().map(Hash::from).collect();
            let data = Arc::new(self.manager.ghostdag(hash, &parents).unwrap());
            let parent_set: BlockSet = parents.iter().map(|p| self.index.lookup(*p).unwrap()).collect();
            let node = BlockNode::new(&header_from_precomputed_hash(hash, parents, 0), &parent_set, data.clone()).unwrap();
            self.index.add_node(Arc::new(node), BlockStatus::VALID);
            let mut mergeset = data.unordered_mergeset_without_selected_parent();
            inquirer::add_block(
                &mut *self.reachability.write(),
                hash,
                data.selected_parent,
                &mut mergeset,
                DEFAULT_REINDEX_DEPTH,
                DEFAULT_REINDEX_SLACK,
            )
            .unwrap();
            data
        }
    }

    fn hashes(list: &[u64]) -> Vec<Hash> {
        list.iter().copied().map(Hash::from).collect()
    }

    #[test]
    fn test_chain_coloring() {
        let fixture = Fixture::new(1, 3);
        let data = fixture.add(2, &[1]);
        assert_eq!(data.blue_score, 1);
        assert_eq!(data.selected_parent, Hash::from(1));
        assert_eq!(data.mergeset_blues.as_slice(), hashes(&[1]).as_slice());
        let data = fixture.add(3, &[2]);
        assert_eq!(data.blue_score, 2);
        assert!(data.mergeset_reds.is_empty());
    }

    #[test]
    fn test_diamond_coloring() {
        let fixture = Fixture::new(1, 3);
        fixture.add(2, &[1]);
        fixture.add(3, &[1]);
        let data = fixture.add(4, &[3, 2]);
        // Equal blue scores: the smaller hash is selected
        assert_eq!(data.selected_parent, Hash::from(2));
        assert_eq!(data.mergeset_blues.as_slice(), hashes(&[2, 3]).as_slice());
        assert_eq!(data.blue_score, 3);
        assert_eq!(data.blues_anticone_sizes[&Hash::from(3)], 1);
        assert_eq!(data.blues_anticone_sizes[&Hash::from(2)], 1);
    }

    #[test]
    fn test_zero_k_colors_side_branch_red() {
        let fixture = Fixture::new(1, 0);
        fixture.add(2, &[1]);
        fixture.add(3, &[1]);
        let data = fixture.add(4, &[2, 3]);
        assert_eq!(data.mergeset_blues.as_slice(), hashes(&[2]).as_slice());
        assert_eq!(data.mergeset_reds.as_slice(), hashes(&[3]).as_slice());
        assert_eq!(data.blue_score, 2);
    }

    #[test]
    fn test_blue_set_bounded_by_k() {
        let fixture = Fixture::new(1, 3);
        for hash in 2..=6 {
            fixture.add(hash, &[1]);
        }
        let data = fixture.add(7, &[2, 3, 4, 5, 6]);
        assert_eq!(data.mergeset_blues.as_slice(), hashes(&[2, 3, 4, 5]).as_slice());
        assert_eq!(data.mergeset_reds.as_slice(), hashes(&[6]).as_slice());
        assert_eq!(data.blue_score, 5);
        for blue in hashes(&[2, 3, 4, 5]) {
            assert_eq!(data.blues_anticone_sizes[&blue], 3);
        }
    }

    #[test]
    fn test_red_ancestors_stay_out_of_later_mergesets() {
        let fixture = Fixture::new(1, 0);
        fixture.add(2, &[1]);
        fixture.add(3, &[1]);
        fixture.add(4, &[2, 3]);
        let data = fixture.add(5, &[4]);
        assert_eq!(data.mergeset_size(), 1);
        assert_eq!(data.blue_score, 3);
    }

    #[test]
    fn test_find_selected_parent() {
        let fixture = Fixture::new(1, 0);
        fixture.add(2, &[1]);
        fixture.add(3, &[1]);
        fixture.add(4, &[3]);
        assert_eq!(fixture.manager.find_selected_parent(hashes(&[2, 4])).unwrap(), Hash::from(4));
        // Equal blue scores go to the smaller hash
        assert_eq!(fixture.manager.find_selected_parent(hashes(&[3, 2])).unwrap(), Hash::from(2));
    }

    #[test]
    fn test_virtual_coloring_and_errors() {
        let fixture = Fixture::new(1, 3);
        fixture.add(2, &[1]);
        fixture.add(3, &[1]);
        let virtual_data = fixture.manager.ghostdag(blockhash::VIRTUAL, &hashes(&[2, 3])).unwrap();
        assert!(!virtual_data.selected_parent.is_virtual());
        assert_eq!(virtual_data.blue_score, 3);

        assert!(matches!(fixture.manager.find_selected_parent(std::iter::empty()), Err(GhostdagError::NoParents)));
        assert!(matches!(fixture.manager.ghostdag(9.into(), &hashes(&[8])), Err(GhostdagError::Store(_))));
    }
}
