use super::ghostdag::GhostdagData;
use blockdag_hashes::Hash;
use std::sync::Arc;

/// The state of the virtual block: its parents (the valid DAG tips) and the coloring
/// computed over them. The virtual is never persisted and is rebuilt on start up.
#[derive(Clone, Debug)]
pub struct VirtualState {
    pub parents: Vec<Hash>,
    pub ghostdag_data: Arc<GhostdagData>,
}

impl VirtualState {
    /// `parents` are kept sorted so the state is independent of admission order
    pub fn new(mut parents: Vec<Hash>, ghostdag_data: Arc<GhostdagData>) -> Self {
        parents.sort_unstable();
        Self { parents, ghostdag_data }
    }

    pub fn selected_parent(&self) -> Hash {
        self.ghostdag_data.selected_parent
    }

    pub fn blue_score(&self) -> u64 {
        self.ghostdag_data.blue_score
    }

    /// Returns the virtual parents after admitting `new_tip`: the parents of the new tip
    /// are no longer tips
    pub fn next_parents(&self, new_tip: Hash, new_tip_parents: &[Hash]) -> Vec<Hash> {
        let mut parents: Vec<Hash> = self.parents.iter().copied().filter(|p| !new_tip_parents.contains(p)).collect();
        parents.push(new_tip);
        parents.sort_unstable();
        parents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_parents() {
        let state = VirtualState::new(vec![3.into(), 1.into(), 2.into()], Arc::new(GhostdagData::genesis(1.into())));
        assert_eq!(state.parents, vec![Hash::from(1), Hash::from(2), Hash::from(3)]);
        assert_eq!(state.next_parents(4.into(), &[1.into(), 3.into()]), vec![Hash::from(2), Hash::from(4)]);
        assert_eq!(state.next_parents(0x10.into(), &[9.into()]), vec![1.into(), 2.into(), 3.into(), Hash::from(0x10)]);
    }
}
