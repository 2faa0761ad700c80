//! FIFO eviction policy for the buffer pool.
//!
//! Pages are evicted in the order they were brought into the pool. A page
//! that is hit again keeps its original position.

use std::collections::VecDeque;

use minnow_common::types::HeapPageId;

/// First-in, first-out page replacement.
#[derive(Debug, Default)]
pub struct FifoReplacer {
    queue: VecDeque<HeapPageId>,
}

impl FifoReplacer {
    /// Creates an empty replacer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `page_id` became resident.
    pub fn record_admission(&mut self, page_id: HeapPageId) {
        self.queue.push_back(page_id);
    }

    /// Forgets `page_id`, e.g. after it was discarded.
    pub fn remove(&mut self, page_id: HeapPageId) {
        self.queue.retain(|p| *p != page_id);
    }

    /// Removes and returns the oldest resident page.
    pub fn pop_victim(&mut self) -> Option<HeapPageId> {
        self.queue.pop_front()
    }

    /// Returns the number of tracked pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if no page is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minnow_common::types::TableId;

    fn page(n: u64) -> HeapPageId {
        HeapPageId::new(TableId::new(1), n)
    }

    #[test]
    fn test_victims_in_admission_order() {
        let mut replacer = FifoReplacer::new();
        for n in 0..3 {
            replacer.record_admission(page(n));
        }
        assert_eq!(replacer.pop_victim(), Some(page(0)));
        assert_eq!(replacer.pop_victim(), Some(page(1)));
        assert_eq!(replacer.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut replacer = FifoReplacer::new();
        replacer.record_admission(page(0));
        replacer.record_admission(page(1));
        replacer.remove(page(0));
        assert_eq!(replacer.pop_victim(), Some(page(1)));
        assert!(replacer.is_empty());
        assert_eq!(replacer.pop_victim(), None);
    }
}
