use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// Iterative frontier for pagination and nested folders.
///
/// An item is queued at most once; the walk ends when the frontier is empty,
/// which bounds it by the number of distinct items discovered.
#[derive(Debug)]
pub struct WorkQueue<T> {
    pending: VecDeque<T>,
    visited: HashSet<T>,
}

impl<T: Clone + Eq + Hash> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            visited: HashSet::new(),
        }
    }

    pub fn seeded(item: T) -> Self {
        let mut queue = Self::new();
        queue.push(item);
        queue
    }

    /// Queue an item; returns `false` if it was seen before
    pub fn push(&mut self, item: T) -> bool {
        if self.visited.insert(item.clone()) {
            self.pending.push_back(item);
            true
        } else {
            false
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        self.pending.pop_front()
    }

    pub fn visited(&self) -> usize {
        self.visited.len()
    }
}

impl<T: Clone + Eq + Hash> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
