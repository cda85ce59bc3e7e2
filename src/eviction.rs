//! Swap-out victim selection.
//!
//! Owners are queued in the order their allocations were granted. When an
//! allocation cannot be placed, the oldest queued owner that still holds
//! memory is swapped out. Owners already freed by a direct deallocation stay
//! in the queue and are discarded when they reach the front.

use crate::block::{BlockList, Pid};
use std::collections::VecDeque;

/// FIFO of owners in allocation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionQueue {
    order: VecDeque<Pid>,
}

impl EvictionQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a granted allocation.
    pub fn push(&mut self, owner: Pid) {
        self.order.push_back(owner);
    }

    /// Number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if queue is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        self.order.iter().copied()
    }

    /// Pop entries until one names an owner still resident in `blocks`.
    ///
    /// Stale entries popped on the way are dropped. Returns `None` once the
    /// queue runs dry.
    pub fn next_victim(&mut self, blocks: &BlockList) -> Option<Pid> {
        while let Some(owner) = self.order.pop_front() {
            if blocks.is_resident(owner) {
                return Some(owner);
            }
            log::debug!("skipping stale eviction entry for PID {owner}");
        }
        None
    }
}
