use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether the pool is known to be empty so the operator hears about
/// it once per depletion, not once per request.
#[derive(Debug, Default)]
pub struct DepletionLatch {
    tripped: AtomicBool,
}

impl DepletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the pool empty. True only for the call that made the transition.
    pub fn trip(&self) -> bool {
        !self.tripped.swap(true, Ordering::AcqRel)
    }

    /// Mark the pool stocked again.
    pub fn reset(&self) {
        self.tripped.store(false, Ordering::Release);
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_trips_once_until_reset() {
        let latch = DepletionLatch::new();
        assert!(latch.trip());
        assert!(!latch.trip());
        assert!(!latch.trip());
        latch.reset();
        assert!(!latch.is_tripped());
        assert!(latch.trip());
    }

    #[test]
    fn test_concurrent_trips_report_one_transition() {
        let latch = Arc::new(DepletionLatch::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let latch = latch.clone();
                std::thread::spawn(move || latch.trip())
            })
            .collect();
        let transitions = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|tripped| *tripped)
            .count();
        assert_eq!(transitions, 1);
    }
}
