pub mod block_index;
pub mod block_nodes;
pub mod ghostdag;
pub mod reachability;
pub mod relations;
pub mod virtual_state;
