use crate::model::{block_node::BlockNode, stores::block_index::BlockNodeStoreReader};
use blockdag_database::prelude::StoreError;
use std::sync::Arc;

#[derive(Clone)]
pub struct PastMedianTimeManager<T: BlockNodeStoreReader> {
    store: Arc<T>,
    past_median_time_window_size: usize,
}

impl<T: BlockNodeStoreReader> PastMedianTimeManager<T> {
    pub fn new(store: Arc<T>, past_median_time_window_size: usize) -> Self {
        Self { store, past_median_time_window_size }
    }

    /// The median timestamp over `node` and its selected ancestors. A new block must not be older
    /// than the past median time of its bluest parent
    pub fn calc_past_median_time(&self, node: &Arc<BlockNode>) -> Result<i64, StoreError> {
        node.past_median_time(self.store.as_ref(), self.past_median_time_window_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::NodeChain;

    #[test]
    fn test_calc_past_median_time() {
        let chain = Arc::new(NodeChain::linear(20, 500, 2));
        let manager = PastMedianTimeManager::new(chain.clone(), 11);
        // The last 11 timestamps are 518..=538, median 528
        assert_eq!(manager.calc_past_median_time(&chain.tip()).unwrap(), 528);
        assert_eq!(manager.calc_past_median_time(&chain.nodes[0]).unwrap(), 500);
    }
}
