pub mod test_consensus;

use crate::{
    errors::{BlockProcessResult, ConsensusError, ConsensusResult, RuleError},
    model::{
        block_heap::DelayedBlocksHeap,
        block_node::BlockNode,
        block_set::BlockSet,
        services::reachability::{MTReachabilityService, ReachabilityService},
        stores::{
            block_index::BlockIndex,
            block_nodes::{BlockNodesStore, MemoryBlockNodesStore},
            ghostdag::GhostdagData,
            reachability::MemoryReachabilityStore,
            virtual_state::VirtualState,
        },
    },
    processes::{
        difficulty::{DifficultyManager, check_proof_of_work},
        ghostdag::{GhostdagError, protocol::GhostdagManager},
        past_median_time::PastMedianTimeManager,
        reachability::{ReachabilityError, inquirer as reachability},
        selected_chain::{ChainPath, SelectedParentChain},
        sync::SyncManager,
        window::BlueWindowManager,
    },
};
use blockdag_consensus_core::{
    BlockHashSet, HashMapCustomHasher,
    blockhash::{BlockHashes, VIRTUAL},
    blockstatus::BlockStatus,
    config::{Config, constants::consensus::BLOCK_VERSION},
    header::Header,
};
use blockdag_core::{debug, info, time::unix_now_secs, trace};
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;
use itertools::Itertools;
use parking_lot::{Mutex, RwLock};
use std::{ops::DerefMut, sync::Arc};

type ReachabilityServiceImpl = MTReachabilityService<MemoryReachabilityStore>;

/// The outcome of a successful admission
#[derive(Clone, Debug)]
pub struct BlockAddition {
    pub node: Arc<BlockNode>,
    /// The change the block caused to the selected parent chain, empty if it did not become the selected tip
    pub chain_path: ChainPath,
}

/// The outcome of [`Consensus::add_block_or_delay`]
#[derive(Clone, Debug)]
pub enum BlockAdmission {
    Added(BlockAddition),
    /// The block timestamp is too far into the future. It is queued until `process_time`
    Delayed { hash: Hash, process_time: i64 },
}

/// DAG-wide state which changes with every admitted block
struct DagState {
    virtual_state: VirtualState,
    chain: SelectedParentChain,
}

pub struct Consensus {
    config: Arc<Config>,
    genesis_hash: Hash,

    // Stores
    block_index: Arc<BlockIndex>,
    reachability_store: Arc<RwLock<MemoryReachabilityStore>>,
    block_nodes_store: Arc<dyn BlockNodesStore>,

    // Services and managers
    reachability_service: ReachabilityServiceImpl,
    pub(super) ghostdag_manager: GhostdagManager<BlockIndex, BlockIndex, ReachabilityServiceImpl>,
    pub(super) window_manager: BlueWindowManager<BlockIndex>,
    pub(super) difficulty_manager: DifficultyManager<BlockIndex>,
    pub(super) past_median_time_manager: PastMedianTimeManager<BlockIndex>,
    sync_manager: SyncManager<BlockIndex, ReachabilityServiceImpl>,

    // Admission is serialized by the write guard over this state
    state: RwLock<DagState>,
    delayed_blocks: Mutex<DelayedBlocksHeap>,
}

impl Consensus {
    /// Creates a DAG holding only the genesis block, backed by an in-memory block node store
    pub fn new(config: Arc<Config>) -> ConsensusResult<Self> {
        Self::from_store(config, Arc::new(MemoryBlockNodesStore::new()))
    }

    /// Loads the DAG persisted in `store`. When the store is empty the DAG starts from genesis,
    /// which is left dirty so the next flush persists it.
    pub fn from_store(config: Arc<Config>, store: Arc<dyn BlockNodesStore>) -> ConsensusResult<Self> {
        config.validate()?;
        let genesis_hash = config.genesis.hash;

        let block_index = Arc::new(BlockIndex::new());
        let reachability_store = Arc::new(RwLock::new(MemoryReachabilityStore::new()));
        let reachability_service = MTReachabilityService::new(reachability_store.clone());

        let ghostdag_manager = GhostdagManager::new(
            genesis_hash,
            config.ghostdag_k(),
            block_index.clone(),
            block_index.clone(),
            reachability_service.clone(),
        );
        let window_manager = BlueWindowManager::new(genesis_hash, block_index.clone());
        let difficulty_manager = DifficultyManager::new(
            window_manager.clone(),
            config.difficulty_window_size,
            config.target_time_per_block,
            config.max_difficulty_target,
            config.max_difficulty_bits,
        );
        let past_median_time_manager = PastMedianTimeManager::new(block_index.clone(), config.past_median_time_window_size);
        let sync_manager = SyncManager::new(genesis_hash, block_index.clone(), reachability_service.clone());

        reachability::init(reachability_store.write().deref_mut(), genesis_hash)?;

        let mut records = store.load_all()?;
        if records.is_empty() {
            let node = BlockNode::new(&config.genesis.build_header(), &BlockSet::new(), Arc::new(GhostdagData::genesis(genesis_hash)))?;
            block_index.add_node(Arc::new(node), BlockStatus::DATA_STORED | BlockStatus::VALID);
        } else {
            // Parents always have a lower blue score than their children
            records.sort_by_key(|record| (record.node.blue_score(), record.hash()));
            if records[0].hash() != genesis_hash {
                return Err(StoreError::DataInconsistency(format!("persisted DAG does not start at genesis {genesis_hash}")).into());
            }

            let count = records.len();
            for record in records {
                let node = Arc::new(record.node);
                if !node.is_genesis() {
                    if let Some(missing) = node.parents.iter().find(|parent| !block_index.has_block(**parent)) {
                        return Err(StoreError::DataInconsistency(format!("block {} has unknown parent {missing}", node.hash)).into());
                    }
                    let mut mergeset = node.ghostdag.unordered_mergeset_without_selected_parent();
                    reachability::add_block(
                        reachability_store.write().deref_mut(),
                        node.hash,
                        node.ghostdag.selected_parent,
                        &mut mergeset,
                        config.perf.reindex_depth,
                        config.perf.reindex_slack,
                    )?;
                }
                block_index.add_node_no_dirty(node, record.status);
            }
            info!("Loaded {} block nodes", count);
        }

        let virtual_parents = Self::valid_tips(&block_index);
        let virtual_ghostdag = Arc::new(ghostdag_manager.ghostdag(VIRTUAL, &virtual_parents)?);
        let chain = SelectedParentChain::from_tip(virtual_ghostdag.selected_parent, block_index.as_ref())?;
        reachability::hint_virtual_selected_parent(
            reachability_store.write().deref_mut(),
            chain.tip(),
            config.perf.reindex_depth,
            config.perf.reindex_slack,
        )?;
        debug!("Selected tip {} at chain length {}, virtual blue score {}", chain.tip(), chain.len(), virtual_ghostdag.blue_score);
        let state = DagState { virtual_state: VirtualState::new(virtual_parents, virtual_ghostdag), chain };

        Ok(Self {
            config,
            genesis_hash,
            block_index,
            reachability_store,
            block_nodes_store: store,
            reachability_service,
            ghostdag_manager,
            window_manager,
            difficulty_manager,
            past_median_time_manager,
            sync_manager,
            state: RwLock::new(state),
            delayed_blocks: Mutex::new(DelayedBlocksHeap::new()),
        })
    }

    /// Valid blocks none of whose children are valid. Invalid tips are walked down to their valid ancestors
    fn valid_tips(block_index: &BlockIndex) -> Vec<Hash> {
        let is_valid = |hash: &Hash| block_index.status(*hash).is_some_and(|status| status.known_valid() && !status.known_invalid());
        let mut stack = block_index.tips();
        let mut visited = BlockHashSet::new();
        let mut tips = BlockHashSet::new();
        while let Some(hash) = stack.pop() {
            if !visited.insert(hash) {
                continue;
            }
            if is_valid(&hash) {
                tips.insert(hash);
            } else if let Some(node) = block_index.lookup(hash) {
                stack.extend(node.parents.iter().copied());
            }
        }
        tips.into_iter()
            .filter(|hash| block_index.children(*hash).is_none_or(|children| !children.iter().any(|child| is_valid(child))))
            .sorted()
            .collect()
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn genesis_hash(&self) -> Hash {
        self.genesis_hash
    }

    /// Validates `header` against the local clock and admits it into the DAG
    pub fn add_block(&self, header: Header) -> BlockProcessResult<BlockAddition> {
        self.add_block_at(header, unix_now_secs())
    }

    /// Validates `header` as of local time `now` and admits it into the DAG
    pub fn add_block_at(&self, header: Header, now: i64) -> BlockProcessResult<BlockAddition> {
        let mut state = self.state.write();
        self.validate_and_insert(&mut state, header, now)
    }

    /// Like [`Self::add_block_at`], except that a block whose only fault is a timestamp too far into
    /// the future is queued until it becomes acceptable
    pub fn add_block_or_delay(&self, header: Header, now: i64) -> BlockProcessResult<BlockAdmission> {
        let max_future_time = now + self.config.max_future_time_offset();
        if header.timestamp <= max_future_time {
            return self.add_block_at(header, now).map(BlockAdmission::Added);
        }

        let mut delayed = self.delayed_blocks.lock();
        if self.block_index.has_block(header.hash) || delayed.contains(&header.hash) {
            return Err(RuleError::AlreadyExists(header.hash));
        }
        let hash = header.hash;
        let process_time = header.timestamp - self.config.max_future_time_offset();
        delayed.push(Arc::new(header), process_time);
        debug!("Delaying block {} until {}", hash, process_time);
        Ok(BlockAdmission::Delayed { hash, process_time })
    }

    /// Admits all delayed blocks whose process time has come, in process time order
    pub fn process_delayed_blocks(&self, now: i64) -> Vec<(Hash, BlockProcessResult<BlockAddition>)> {
        let mut results = Vec::new();
        loop {
            let block = {
                let mut delayed = self.delayed_blocks.lock();
                match delayed.peek() {
                    Some(block) if block.process_time <= now => delayed.pop(),
                    _ => None,
                }
            };
            let Some(block) = block else { break };
            let hash = block.header.hash;
            let header = Arc::unwrap_or_clone(block.header);
            results.push((hash, self.add_block_at(header, now)));
        }
        results
    }

    pub fn delayed_blocks_count(&self) -> usize {
        self.delayed_blocks.lock().len()
    }

    fn validate_and_insert(&self, state: &mut DagState, header: Header, now: i64) -> BlockProcessResult<BlockAddition> {
        let hash = header.hash;
        if self.block_index.has_block(hash) {
            return Err(RuleError::AlreadyExists(hash));
        }
        self.validate_parents_in_isolation(&header)?;

        let unknown = header.parents.iter().copied().filter(|parent| !self.block_index.has_block(*parent)).collect_vec();
        if !unknown.is_empty() {
            return Err(RuleError::UnknownParents(hash, unknown));
        }
        self.check_parents_incest(&header)?;
        if header.version != BLOCK_VERSION {
            return Err(RuleError::WrongBlockVersion(hash, header.version));
        }

        let parents: BlockSet = header.parents.iter().filter_map(|parent| self.block_index.lookup(*parent)).collect();
        let selected_parent = parents.bluest().cloned().ok_or(RuleError::NoParents(hash))?;

        let past_median_time = self.past_median_time_manager.calc_past_median_time(&selected_parent)?;
        if header.timestamp < past_median_time {
            return Err(RuleError::TimeTooOld(hash, header.timestamp, past_median_time));
        }
        let max_future_time = now + self.config.max_future_time_offset();
        if header.timestamp > max_future_time {
            return Err(RuleError::TimeTooFarIntoTheFuture(hash, header.timestamp, max_future_time));
        }

        let required_bits = self.difficulty_manager.required_difficulty(Some(&selected_parent))?;
        if header.bits != required_bits {
            return Err(RuleError::UnexpectedDifficulty(hash, header.bits, required_bits));
        }
        if !self.difficulty_manager.is_target_in_range(header.bits) {
            return Err(RuleError::TargetOutOfRange(hash, header.bits));
        }
        if !self.config.skip_proof_of_work && !check_proof_of_work(hash, header.bits) {
            return Err(RuleError::InvalidPoW(hash));
        }

        let ghostdag_data = Arc::new(self.ghostdag_manager.ghostdag(hash, &header.parents)?);
        let node = Arc::new(BlockNode::new(&header, &parents, ghostdag_data.clone())?);

        let invalid_ancestor =
            header.parents.iter().any(|parent| self.block_index.status(*parent).is_some_and(|status| status.known_invalid()));
        let status = if invalid_ancestor {
            BlockStatus::DATA_STORED | BlockStatus::INVALID_ANCESTOR
        } else {
            BlockStatus::DATA_STORED | BlockStatus::VALID
        };

        // Reachability must know the block before it becomes visible through the index
        let mut mergeset = ghostdag_data.unordered_mergeset_without_selected_parent();
        reachability::add_block(
            self.reachability_store.write().deref_mut(),
            hash,
            ghostdag_data.selected_parent,
            &mut mergeset,
            self.config.perf.reindex_depth,
            self.config.perf.reindex_slack,
        )?;
        self.block_index.add_node(node.clone(), status);

        if invalid_ancestor {
            trace!("Admitted block {} with an invalid ancestor", hash);
            return Ok(BlockAddition { node, chain_path: ChainPath::default() });
        }
        let virtual_parents = state.virtual_state.next_parents(hash, &node.parents);
        match self.update_virtual::<RuleError>(state, virtual_parents) {
            Ok(chain_path) => {
                trace!("Admitted block {} with blue score {}", hash, node.blue_score());
                Ok(BlockAddition { node, chain_path })
            }
            Err(err) => {
                // The virtual was left untouched, so the block is unpublished as well
                self.block_index.remove_node(hash);
                Err(err)
            }
        }
    }

    fn validate_parents_in_isolation(&self, header: &Header) -> BlockProcessResult<()> {
        let hash = header.hash;
        if header.parents.is_empty() {
            return Err(RuleError::NoParents(hash));
        }
        if header.parents.len() > self.config.max_block_parents as usize {
            return Err(RuleError::TooManyParents(hash, header.parents.len(), self.config.max_block_parents));
        }
        if let Some(duplicate) = header.parents.iter().duplicates().next() {
            return Err(RuleError::DuplicateParent(hash, *duplicate));
        }
        Ok(())
    }

    /// Parents must form an antichain: none of them may be in the past of another
    fn check_parents_incest(&self, header: &Header) -> BlockProcessResult<()> {
        for parent_a in header.parents.iter().copied() {
            for parent_b in header.parents.iter().copied() {
                if parent_a != parent_b && self.reachability_service.is_dag_ancestor_of(parent_a, parent_b)? {
                    return Err(RuleError::InvalidParentsRelation(header.hash, parent_a, parent_b));
                }
            }
        }
        Ok(())
    }

    /// Recomputes the virtual over `virtual_parents` and moves the selected chain accordingly.
    /// `state` is only modified once every fallible step succeeded.
    fn update_virtual<E>(&self, state: &mut DagState, virtual_parents: Vec<Hash>) -> Result<ChainPath, E>
    where
        E: From<GhostdagError> + From<ReachabilityError> + From<StoreError>,
    {
        let virtual_ghostdag = Arc::new(self.ghostdag_manager.ghostdag(VIRTUAL, &virtual_parents)?);
        let new_tip = virtual_ghostdag.selected_parent;
        if new_tip != state.chain.tip() {
            reachability::hint_virtual_selected_parent(
                self.reachability_store.write().deref_mut(),
                new_tip,
                self.config.perf.reindex_depth,
                self.config.perf.reindex_slack,
            )?;
        }
        let chain_path = state.chain.apply_new_tip(new_tip, self.block_index.as_ref())?;
        state.virtual_state = VirtualState::new(virtual_parents, virtual_ghostdag);

        if !chain_path.removed.is_empty() {
            debug!(
                "Selected chain reorg: {} blocks removed, {} added, new tip {}",
                chain_path.removed.len(),
                chain_path.added.len(),
                state.chain.tip()
            );
        }
        Ok(chain_path)
    }

    /// Marks `hash` as having failed validation. All of its descendants get `INVALID_ANCESTOR`,
    /// and when any of the affected blocks was a virtual parent the virtual is rebuilt over the
    /// remaining valid tips. Returns the resulting change of the selected chain.
    pub fn mark_block_invalid(&self, hash: Hash) -> ConsensusResult<ChainPath> {
        let mut state = self.state.write();
        self.get_node(hash)?;
        if hash == self.genesis_hash {
            return Err(ConsensusError::GenesisInvalidation(hash));
        }

        self.block_index.set_status_flags(hash, BlockStatus::VALIDATE_FAILED)?;
        let mut affected = BlockHashSet::new();
        affected.insert(hash);
        let mut stack = vec![hash];
        while let Some(current) = stack.pop() {
            for child in self.block_index.children(current).iter().flat_map(|children| children.iter().copied()) {
                if affected.insert(child) {
                    self.block_index.set_status_flags(child, BlockStatus::INVALID_ANCESTOR)?;
                    stack.push(child);
                }
            }
        }
        debug!("Block {} marked invalid along with {} descendants", hash, affected.len() - 1);

        if !state.virtual_state.parents.iter().any(|parent| affected.contains(parent)) {
            return Ok(ChainPath::default());
        }
        let virtual_parents = Self::valid_tips(&self.block_index);
        self.update_virtual(&mut state, virtual_parents)
    }

    /// Persists all dirty block nodes in a single transaction
    pub fn flush(&self) -> ConsensusResult<usize> {
        Ok(self.block_index.flush_dirty(self.block_nodes_store.as_ref())?)
    }

    pub fn has_block(&self, hash: Hash) -> bool {
        self.block_index.has_block(hash)
    }

    pub fn lookup(&self, hash: Hash) -> Option<Arc<BlockNode>> {
        self.block_index.lookup(hash)
    }

    fn get_node(&self, hash: Hash) -> ConsensusResult<Arc<BlockNode>> {
        self.block_index.lookup(hash).ok_or(ConsensusError::BlockNotFound(hash))
    }

    pub fn status(&self, hash: Hash) -> Option<BlockStatus> {
        self.block_index.status(hash)
    }

    pub fn children(&self, hash: Hash) -> Option<BlockHashes> {
        self.block_index.children(hash)
    }

    /// Valid blocks without valid children, sorted by hash. These are the parents of the virtual
    pub fn tips(&self) -> Vec<Hash> {
        let _state = self.state.read();
        Self::valid_tips(&self.block_index)
    }

    pub fn block_count(&self) -> usize {
        self.block_index.len()
    }

    /// The difficulty required of a block built on top of the current virtual
    pub fn next_required_difficulty(&self) -> ConsensusResult<u32> {
        let state = self.state.read();
        let selected_tip = self.get_node(state.virtual_state.selected_parent())?;
        Ok(self.difficulty_manager.required_difficulty(Some(&selected_tip))?)
    }

    pub fn selected_tip(&self) -> Hash {
        self.state.read().chain.tip()
    }

    pub fn virtual_parents(&self) -> Vec<Hash> {
        self.state.read().virtual_state.parents.clone()
    }

    pub fn virtual_blue_score(&self) -> u64 {
        self.state.read().virtual_state.blue_score()
    }

    pub fn virtual_ghostdag_data(&self) -> Arc<GhostdagData> {
        self.state.read().virtual_state.ghostdag_data.clone()
    }

    /// The diff between the selected chain of `hash` and the current selected chain
    pub fn selected_parent_chain(&self, hash: Hash) -> ConsensusResult<ChainPath> {
        let state = self.state.read();
        self.get_node(hash)?;
        Ok(state.chain.selected_parent_chain(hash, self.block_index.as_ref())?)
    }

    pub fn is_in_selected_parent_chain(&self, hash: Hash) -> ConsensusResult<bool> {
        let state = self.state.read();
        self.get_node(hash)?;
        Ok(state.chain.contains(&hash))
    }

    /// The selected chain from genesis up to the selected tip
    pub fn selected_chain(&self) -> Vec<Hash> {
        self.state.read().chain.as_slice().to_vec()
    }

    /// Builds a block locator from `start` (the selected tip by default) down to `stop` (genesis by default)
    pub fn block_locator(&self, start: Option<Hash>, stop: Option<Hash>) -> ConsensusResult<Vec<Hash>> {
        let state = self.state.read();
        let start = self.get_node(start.unwrap_or_else(|| state.chain.tip()))?;
        let stop = self.get_node(stop.unwrap_or(self.genesis_hash))?;
        self.sync_manager.block_locator(&start, &stop)
    }

    pub fn find_next_locator_boundaries(&self, locator: &[Hash]) -> ConsensusResult<(Option<Hash>, Hash)> {
        let _state = self.state.read();
        self.sync_manager.find_next_locator_boundaries(locator)
    }

    pub fn antipast_hashes_between(&self, low: Hash, high: Hash, max_entries: usize) -> ConsensusResult<Vec<Hash>> {
        let _state = self.state.read();
        let (low, high) = (self.get_node(low)?, self.get_node(high)?);
        self.sync_manager.antipast_hashes_between(&low, &high, max_entries)
    }

    pub fn blue_window(&self, hash: Hash, window_size: usize) -> ConsensusResult<Vec<Hash>> {
        let node = self.get_node(hash)?;
        Ok(self.window_manager.blue_window(&node, window_size)?.into_iter().map(|node| node.hash).collect())
    }

    pub fn past_median_time(&self, hash: Hash) -> ConsensusResult<i64> {
        let node = self.get_node(hash)?;
        Ok(self.past_median_time_manager.calc_past_median_time(&node)?)
    }

    pub fn is_dag_ancestor_of(&self, this: Hash, queried: Hash) -> ConsensusResult<bool> {
        let _state = self.state.read();
        self.get_node(this)?;
        self.get_node(queried)?;
        Ok(self.reachability_service.is_dag_ancestor_of(this, queried)?)
    }

    pub fn is_chain_ancestor_of(&self, this: Hash, queried: Hash) -> ConsensusResult<bool> {
        let _state = self.state.read();
        self.get_node(this)?;
        self.get_node(queried)?;
        Ok(self.reachability_service.is_chain_ancestor_of(this, queried)?)
    }
}
