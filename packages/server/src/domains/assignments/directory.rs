use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::models::Assignment;
use crate::common::{HolderId, NormalizedNumber};

/// What an `assign` call displaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignOutcome {
    /// The holder's previous assignment, if any.
    pub superseded: Option<Assignment>,
    /// Another holder's assignment for the same number, if any.
    pub overwritten: Option<Assignment>,
}

/// In-process assignment directory with both uniqueness indexes.
#[derive(Debug, Default)]
pub struct AssignmentDirectory {
    by_number: HashMap<NormalizedNumber, Assignment>,
    by_holder: HashMap<HolderId, NormalizedNumber>,
}

impl AssignmentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }

    pub fn assign(
        &mut self,
        number: NormalizedNumber,
        holder_id: HolderId,
        issued_at: DateTime<Utc>,
    ) -> AssignOutcome {
        let superseded = self
            .by_holder
            .remove(&holder_id)
            .and_then(|previous| self.by_number.remove(&previous));

        let overwritten = self.by_number.remove(&number);
        if let Some(stale) = &overwritten {
            self.by_holder.remove(&stale.holder_id);
        }

        self.by_holder.insert(holder_id, number.clone());
        self.by_number.insert(
            number.clone(),
            Assignment {
                normalized_number: number,
                holder_id,
                issued_at,
            },
        );

        AssignOutcome {
            superseded,
            overwritten,
        }
    }

    pub fn resolve(&self, number: &NormalizedNumber) -> Option<HolderId> {
        self.by_number.get(number).map(|a| a.holder_id)
    }

    pub fn for_holder(&self, holder_id: HolderId) -> Option<&Assignment> {
        self.by_holder
            .get(&holder_id)
            .and_then(|number| self.by_number.get(number))
    }

    /// Idempotent removal.
    pub fn clear(&mut self, number: &NormalizedNumber) -> Option<Assignment> {
        let removed = self.by_number.remove(number)?;
        self.by_holder.remove(&removed.holder_id);
        Some(removed)
    }

    pub fn expire_issued_before(&mut self, cutoff: DateTime<Utc>) -> Vec<Assignment> {
        let stale: Vec<NormalizedNumber> = self
            .by_number
            .values()
            .filter(|a| a.issued_at < cutoff)
            .map(|a| a.normalized_number.clone())
            .collect();

        stale.iter().filter_map(|number| self.clear(number)).collect()
    }
}
