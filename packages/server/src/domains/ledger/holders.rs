use std::collections::BTreeSet;

use crate::common::HolderId;

/// Append-only set of every holder that has interacted with the relay.
#[derive(Debug, Default)]
pub struct HolderRegistry {
    holders: BTreeSet<HolderId>,
}

impl HolderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a holder is seen.
    pub fn register(&mut self, holder_id: HolderId) -> bool {
        self.holders.insert(holder_id)
    }

    pub fn all(&self) -> Vec<HolderId> {
        self.holders.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}
