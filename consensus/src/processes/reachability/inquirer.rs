use super::{tree::*, *};
use crate::{
    model::stores::reachability::{ReachabilityStore, ReachabilityStoreReader},
    processes::reachability::interval::Interval,
};
use blockdag_hashes::Hash;
use std::cmp::Ordering;

/// Init the reachability store to match the state required by the algorithmic layer.
/// The function first checks the store for possibly being initialized already.
pub fn init(store: &mut (impl ReachabilityStore + ?Sized), origin: Hash) -> Result<()> {
    init_with_params(store, origin, Interval::genesis())
}

pub(super) fn init_with_params(store: &mut (impl ReachabilityStore + ?Sized), origin: Hash, capacity: Interval) -> Result<()> {
    if store.has(origin)? {
        return Ok(());
    }
    store.init(origin, capacity)?;
    Ok(())
}

type HashIterator<'a> = &'a mut dyn Iterator<Item = Hash>;

/// Add a block to the DAG reachability data structures and persist using the provided `store`.
pub fn add_block(
    store: &mut (impl ReachabilityStore + ?Sized),
    new_block: Hash,
    selected_parent: Hash,
    mergeset_iterator: HashIterator,
    reindex_depth: u64,
    reindex_slack: u64,
) -> Result<()> {
    add_tree_block(store, new_block, selected_parent, reindex_depth, reindex_slack)?;
    add_dag_block(store, new_block, mergeset_iterator)?;
    Ok(())
}

fn add_dag_block(store: &mut (impl ReachabilityStore + ?Sized), new_block: Hash, mergeset_iterator: HashIterator) -> Result<()> {
    // Update the future covering set for blocks in the mergeset
    for merged_block in mergeset_iterator {
        insert_to_future_covering_set(store, merged_block, new_block)?;
    }
    Ok(())
}

/// Inserts `new_block` into the future covering set of `merged_block`, keeping the set
/// ordered by interval and free of items covering one another
pub fn insert_to_future_covering_set(store: &mut (impl ReachabilityStore + ?Sized), merged_block: Hash, new_block: Hash) -> Result<()> {
    let fcs = store.get_future_covering_set(merged_block)?;
    match binary_search_descendant(store, fcs.as_slice(), new_block)? {
        // `new_block` is already covered by an existing item
        SearchOutput::Found(_, _) => Ok(()),
        SearchOutput::NotFound(i) => {
            // Items which `new_block` covers precede the insertion point and are replaced by it
            let new_interval = store.get_interval(new_block)?;
            let mut covered_start = i;
            while covered_start > 0 && new_interval.contains(store.get_interval(fcs[covered_start - 1])?) {
                covered_start -= 1;
            }
            if covered_start < i {
                store.remove_future_covering_items(merged_block, covered_start..i)?;
            }
            store.insert_future_covering_item(merged_block, new_block, covered_start)?;
            Ok(())
        }
    }
}

/// Hint to the reachability algorithm that `hint` is a candidate to become
/// the `virtual selected parent` (`VSP`). This might affect internal reachability heuristics such
/// as moving the reindex point. The consensus runtime is expected to call this function
/// for every new virtual selected parent.
pub fn hint_virtual_selected_parent(
    store: &mut (impl ReachabilityStore + ?Sized),
    hint: Hash,
    reindex_depth: u64,
    reindex_slack: u64,
) -> Result<()> {
    try_advancing_reindex_root(store, hint, reindex_depth, reindex_slack)
}

/// Checks if the `this` block is a strict chain ancestor of the `queried` block (aka `this ∈ chain(queried)`).
/// Note that this results in `false` if `this == queried`
pub fn is_strict_chain_ancestor_of(store: &(impl ReachabilityStoreReader + ?Sized), this: Hash, queried: Hash) -> Result<bool> {
    Ok(store.get_interval(this)?.strictly_contains(store.get_interval(queried)?))
}

/// Checks if `this` block is a chain ancestor of `queried` block (aka `this ∈ chain(queried) ∪ {queried}`).
/// Note that we use the graph theory convention here which defines that a block is also an ancestor of itself.
pub fn is_chain_ancestor_of(store: &(impl ReachabilityStoreReader + ?Sized), this: Hash, queried: Hash) -> Result<bool> {
    Ok(store.get_interval(this)?.contains(store.get_interval(queried)?))
}

/// Returns true if `this` is a DAG ancestor of `queried` (aka `queried ∈ future(this) ∪ {this}`).
/// Note: this method will return true if `this == queried`.
/// The complexity of this method is O(log(|future_covering_set(this)|))
pub fn is_dag_ancestor_of(store: &(impl ReachabilityStoreReader + ?Sized), this: Hash, queried: Hash) -> Result<bool> {
    // First, check if `this` is a chain ancestor of queried
    if is_chain_ancestor_of(store, this, queried)? {
        return Ok(true);
    }
    // Otherwise, use previously registered future blocks to complete the
    // DAG reachability test
    match binary_search_descendant(store, store.get_future_covering_set(this)?.as_slice(), queried)? {
        SearchOutput::Found(_, _) => Ok(true),
        SearchOutput::NotFound(_) => Ok(false),
    }
}

/// Finds the child of `ancestor` which is also a chain ancestor of `descendant`.
pub fn get_next_chain_ancestor(store: &(impl ReachabilityStoreReader + ?Sized), descendant: Hash, ancestor: Hash) -> Result<Hash> {
    if descendant == ancestor {
        // The next ancestor does not exist
        return Err(ReachabilityError::BadQuery);
    }
    if !is_strict_chain_ancestor_of(store, ancestor, descendant)? {
        // `ancestor` isn't actually a chain ancestor of `descendant`, so by def
        // we cannot find the next ancestor as well
        return Err(ReachabilityError::BadQuery);
    }

    get_next_chain_ancestor_unchecked(store, descendant, ancestor)
}

/// Note: it is important to keep the unchecked version for internal module use,
/// since in some scenarios during reindexing `descendant` might have a modified
/// interval which was not propagated yet.
pub(super) fn get_next_chain_ancestor_unchecked(
    store: &(impl ReachabilityStoreReader + ?Sized),
    descendant: Hash,
    ancestor: Hash,
) -> Result<Hash> {
    match binary_search_descendant(store, store.get_children(ancestor)?.as_slice(), descendant)? {
        SearchOutput::Found(hash, _) => Ok(hash),
        SearchOutput::NotFound(_) => Err(ReachabilityError::BadQuery),
    }
}

enum SearchOutput {
    NotFound(usize), // `usize` is the position to insert at
    Found(Hash, usize),
}

fn binary_search_descendant(
    store: &(impl ReachabilityStoreReader + ?Sized),
    ordered_hashes: &[Hash],
    descendant: Hash,
) -> Result<SearchOutput> {
    if cfg!(debug_assertions) {
        // This is a linearly expensive assertion, keep it debug only
        assert_hashes_ordered(store, ordered_hashes)?;
    }

    // `Interval::end` represents the unique number allocated to this block
    let point = store.get_interval(descendant)?.end;

    let (mut low, mut high) = (0usize, ordered_hashes.len());
    while low < high {
        let mid = low + (high - low) / 2;
        match store.get_interval(ordered_hashes[mid])?.start.cmp(&point) {
            Ordering::Equal => return Ok(SearchOutput::Found(ordered_hashes[mid], mid)),
            Ordering::Less => low = mid + 1,
            Ordering::Greater => high = mid,
        }
    }

    // `low` is where `point` was expected (i.e., point < ordered_hashes[low].interval.start),
    // so we expect `ordered_hashes[low - 1].interval` to be the only candidate to contain `point`
    if low > 0 && is_chain_ancestor_of(store, ordered_hashes[low - 1], descendant)? {
        Ok(SearchOutput::Found(ordered_hashes[low - 1], low - 1))
    } else {
        Ok(SearchOutput::NotFound(low))
    }
}

fn assert_hashes_ordered(store: &(impl ReachabilityStoreReader + ?Sized), ordered_hashes: &[Hash]) -> Result<()> {
    let intervals = ordered_hashes.iter().map(|c| Ok(store.get_interval(*c)?)).collect::<Result<Vec<Interval>>>()?;
    debug_assert!(intervals.as_slice().windows(2).all(|w| w[0].end < w[1].start));
    Ok(())
}
