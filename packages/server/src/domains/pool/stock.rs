use rand::Rng;
use std::collections::HashSet;

use super::models::NumberRecord;

/// In-process number pool.
///
/// Callers hold `&mut self` for every mutation, so selection and removal in
/// [`NumberPool::take_random`] always observe the same snapshot.
#[derive(Debug, Default)]
pub struct NumberPool {
    records: Vec<NumberRecord>,
    stocked: HashSet<String>,
    next_id: i64,
}

impl NumberPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add one value. Returns false for duplicates and digitless input.
    pub fn add(&mut self, raw_value: &str) -> bool {
        let Some(clean) = NumberRecord::clean_input(raw_value) else {
            return false;
        };
        if !self.stocked.insert(clean.to_string()) {
            return false;
        }
        self.next_id += 1;
        self.records.push(NumberRecord {
            id: self.next_id,
            raw_value: clean.to_string(),
        });
        true
    }

    /// Remove and return a uniformly chosen record.
    pub fn take_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<NumberRecord> {
        if self.records.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.records.len());
        let record = self.records.swap_remove(index);
        self.stocked.remove(&record.raw_value);
        Some(record)
    }

    pub fn remove(&mut self, raw_value: &str) -> bool {
        let raw_value = raw_value.trim();
        if !self.stocked.remove(raw_value) {
            return false;
        }
        self.records.retain(|record| record.raw_value != raw_value);
        true
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        self.stocked.clear();
        removed
    }
}
