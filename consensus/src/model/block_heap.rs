use super::{block_node::BlockNode, block_set::BlockSet};
use blockdag_consensus_core::{BlueScore, header::Header};
use blockdag_hashes::Hash;
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    sync::Arc,
};

/// The order in which a [`BlockHeap`] pops its nodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapDirection {
    /// Ascending (blue score, hash): the lowest node pops first
    Up,
    /// Descending (blue score, hash): the highest node pops first
    Down,
}

struct HeapEntry {
    key: (BlueScore, Hash),
    direction: HeapDirection,
    node: Arc<BlockNode>,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // `BinaryHeap` is a max-heap, so the up direction reverses the key order
        match self.direction {
            HeapDirection::Down => self.key.cmp(&other.key),
            HeapDirection::Up => other.key.cmp(&self.key),
        }
    }
}

/// A priority queue of block nodes ordered by (blue score, hash)
pub struct BlockHeap {
    heap: BinaryHeap<HeapEntry>,
    direction: HeapDirection,
}

impl BlockHeap {
    pub fn new(direction: HeapDirection) -> Self {
        Self { heap: BinaryHeap::new(), direction }
    }

    /// A heap popping the lowest node first
    pub fn new_up() -> Self {
        Self::new(HeapDirection::Up)
    }

    /// A heap popping the highest node first
    pub fn new_down() -> Self {
        Self::new(HeapDirection::Down)
    }

    pub fn direction(&self) -> HeapDirection {
        self.direction
    }

    pub fn push(&mut self, node: Arc<BlockNode>) {
        self.heap.push(HeapEntry { key: (node.blue_score(), node.hash), direction: self.direction, node });
    }

    pub fn push_set(&mut self, set: &BlockSet) {
        for node in set.iter() {
            self.push(node.clone());
        }
    }

    pub fn pop(&mut self) -> Option<Arc<BlockNode>> {
        self.heap.pop().map(|entry| entry.node)
    }

    pub fn peek(&self) -> Option<&Arc<BlockNode>> {
        self.heap.peek().map(|entry| &entry.node)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Consumes the heap and returns its nodes in pop order
    pub fn into_sorted_vec(self) -> Vec<Arc<BlockNode>> {
        // `BinaryHeap::into_sorted_vec` is ascending by `Ord`, which is the reverse of pop order
        self.heap.into_sorted_vec().into_iter().rev().map(|entry| entry.node).collect()
    }
}

/// A block waiting for its timestamp to become acceptable
#[derive(Clone, Debug)]
pub struct DelayedBlock {
    pub header: Arc<Header>,
    /// The local time (seconds) from which the block may be processed
    pub process_time: i64,
}

/// A min-heap of delayed blocks keyed by process time, ties broken by hash
#[derive(Default)]
pub struct DelayedBlocksHeap {
    heap: BinaryHeap<Reverse<DelayedEntry>>,
}

struct DelayedEntry {
    key: (i64, Hash),
    block: DelayedBlock,
}

impl PartialEq for DelayedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DelayedEntry {}

impl PartialOrd for DelayedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl DelayedBlocksHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: Arc<Header>, process_time: i64) {
        let key = (process_time, header.hash);
        self.heap.push(Reverse(DelayedEntry { key, block: DelayedBlock { header, process_time } }));
    }

    /// The block with the earliest process time
    pub fn peek(&self) -> Option<&DelayedBlock> {
        self.heap.peek().map(|Reverse(entry)| &entry.block)
    }

    pub fn pop(&mut self) -> Option<DelayedBlock> {
        self.heap.pop().map(|Reverse(entry)| entry.block)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.heap.iter().any(|Reverse(entry)| entry.key.1 == *hash)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
