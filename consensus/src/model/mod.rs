pub mod block_heap;
pub mod block_node;
pub mod block_set;
pub mod services;
pub mod stores;
