use crate::model::{block_node::BlockNode, stores::block_index::BlockNodeStoreReader};
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;
use std::sync::Arc;

/// Builds blue windows: the most recent blue blocks in the past of a block, in GHOSTDAG order
#[derive(Clone)]
pub struct BlueWindowManager<T: BlockNodeStoreReader> {
    genesis_hash: Hash,
    store: Arc<T>,
}

impl<T: BlockNodeStoreReader> BlueWindowManager<T> {
    pub fn new(genesis_hash: Hash, store: Arc<T>) -> Self {
        Self { genesis_hash, store }
    }

    /// Returns the `window_size` most recent blues in the past of `node`. The blues of `node`
    /// come first, followed by those of each selected ancestor in turn. When the walk reaches
    /// genesis before the window is full, the window is padded with genesis.
    pub fn blue_window(&self, node: &Arc<BlockNode>, window_size: usize) -> Result<Vec<Arc<BlockNode>>, StoreError> {
        let mut window = Vec::with_capacity(window_size);
        let mut current = node.clone();
        'outer: while window.len() < window_size {
            let Some(selected_parent) = current.selected_parent() else {
                break;
            };
            for blue in current.blues().iter().copied() {
                window.push(self.store.get_node(blue)?);
                if window.len() == window_size {
                    break 'outer;
                }
            }
            current = self.store.get_node(selected_parent)?;
        }

        if window.len() < window_size {
            let genesis = self.store.get_node(self.genesis_hash)?;
            window.resize(window_size, genesis);
        }
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::NodeChain;

    #[test]
    fn test_window_on_chain() {
        let chain = Arc::new(NodeChain::linear(10, 0, 1));
        let manager = BlueWindowManager::new(chain.nodes[0].hash, chain.clone());
        let tip = chain.tip();

        // The window starts below the node itself
        let window = manager.blue_window(&tip, 4).unwrap();
        let expected: Vec<Hash> = [8, 7, 6, 5].iter().map(|i| chain.nodes[*i].hash).collect();
        assert_eq!(window.iter().map(|n| n.hash).collect::<Vec<_>>(), expected);

        // Short pasts are padded with genesis
        let window = manager.blue_window(&chain.nodes[2], 5).unwrap();
        let expected: Vec<Hash> = [1, 0, 0, 0, 0].iter().map(|i| chain.nodes[*i].hash).collect();
        assert_eq!(window.iter().map(|n| n.hash).collect::<Vec<_>>(), expected);

        let window = manager.blue_window(&chain.nodes[0], 3).unwrap();
        assert!(window.iter().all(|n| n.hash == chain.nodes[0].hash));
        assert!(manager.blue_window(&tip, 0).unwrap().is_empty());
    }
}
