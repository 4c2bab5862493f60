use blockdag_consensus_core::blockhash::BlockHashes;
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;

/// Reader API for DAG relations. Parents are fixed at admission while children
/// grow as new blocks reference a block.
pub trait RelationsStoreReader {
    fn get_parents(&self, hash: Hash) -> Result<BlockHashes, StoreError>;
    fn get_children(&self, hash: Hash) -> Result<BlockHashes, StoreError>;
    fn has(&self, hash: Hash) -> Result<bool, StoreError>;
}
