//! Block list representation of the simulated address space.
//!
//! The address space is a sequence of contiguous blocks keyed by their start
//! address. Every block is either free or owned by a single [`Pid`].
//!
//! ```text
//!   0        200            500                     1000
//!   ┌────────┬──────────────┬───────────────────────┐
//!   │ PID 1  │    free      │        PID 2          │
//!   └────────┴──────────────┴───────────────────────┘
//! ```
//!
//! Between operations the list always satisfies:
//!
//! 1. the first block starts at `0` and the last one ends at the total size,
//! 2. each block starts exactly where the previous one ends,
//! 3. no two neighbouring blocks are both free.
//!
//! Searches hand back a start address instead of a reference so that the
//! structural mutations (split, merge) always run after the scan completes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Identifier of the process owning an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pid(pub u32);

impl Pid {
    /// Create a new process id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Pid {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A contiguous address range with an occupancy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Offset of the first address unit.
    pub start: usize,
    /// Length in address units.
    pub size: usize,
    /// Owning process, `None` when the block is free.
    pub owner: Option<Pid>,
}

impl Block {
    /// Create a free block.
    pub const fn free(start: usize, size: usize) -> Self {
        Self {
            start,
            size,
            owner: None,
        }
    }

    /// Check if block is free.
    pub const fn is_free(&self) -> bool {
        self.owner.is_none()
    }

    /// One past the last address of the block.
    pub const fn end(&self) -> usize {
        self.start + self.size
    }

    /// Address range covered by the block.
    pub const fn range(&self) -> Range<usize> {
        self.start..self.start + self.size
    }

    /// Whether this block is free and can hold `size` units.
    pub const fn fits(&self, size: usize) -> bool {
        self.is_free() && self.size >= size
    }
}

/// Read-only snapshot of a block, as handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Address range covered.
    pub range: Range<usize>,
    /// Whether the block is unowned.
    pub free: bool,
    /// Owner when allocated.
    pub owner: Option<Pid>,
}

impl BlockInfo {
    /// Length of the block.
    pub fn size(&self) -> usize {
        self.range.end - self.range.start
    }
}

impl From<&Block> for BlockInfo {
    fn from(block: &Block) -> Self {
        Self {
            range: block.range(),
            free: block.is_free(),
            owner: block.owner,
        }
    }
}

/// Ordered list of blocks covering the whole address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockList {
    total_size: usize,
    blocks: BTreeMap<usize, Block>,
}

impl BlockList {
    /// Create a list holding a single free block of `total_size` units.
    pub fn new(total_size: usize) -> Self {
        let mut blocks = BTreeMap::new();
        blocks.insert(0, Block::free(0, total_size));
        Self { total_size, blocks }
    }

    /// Total size of the address space.
    pub const fn total_size(&self) -> usize {
        self.total_size
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// A list always holds at least one block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over blocks in address order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.values()
    }

    /// Get the block starting at `start`.
    pub fn get(&self, start: usize) -> Option<&Block> {
        self.blocks.get(&start)
    }

    /// Snapshot of all blocks.
    pub fn snapshot(&self) -> Vec<BlockInfo> {
        self.iter().map(BlockInfo::from).collect()
    }

    /// Lowest-address free block that can hold `size` units.
    pub fn first_fit(&self, size: usize) -> Option<usize> {
        self.iter().find(|b| b.fits(size)).map(|b| b.start)
    }

    /// Smallest free block that can hold `size` units. Ties go to the lower
    /// address.
    pub fn best_fit(&self, size: usize) -> Option<usize> {
        self.iter()
            .filter(|b| b.fits(size))
            .fold(None::<&Block>, |best, b| match best {
                Some(current) if current.size <= b.size => Some(current),
                _ => Some(b),
            })
            .map(|b| b.start)
    }

    /// Circular search starting at list position `cursor`.
    ///
    /// Returns the chosen block's start and the position right after it,
    /// wrapped to the current block count.
    pub fn next_fit(&self, size: usize, cursor: usize) -> Option<(usize, usize)> {
        let n = self.blocks.len();
        let from = cursor % n;

        self.blocks
            .values()
            .enumerate()
            .cycle()
            .skip(from)
            .take(n)
            .find(|(_, b)| b.fits(size))
            .map(|(pos, b)| (b.start, (pos + 1) % n))
    }

    /// Claim `size` units at the front of the free block at `start` for
    /// `owner`, splitting off the remainder as a new free block.
    pub fn claim(&mut self, start: usize, size: usize, owner: Pid) -> Result<()> {
        let block = self
            .blocks
            .get_mut(&start)
            .ok_or_else(|| Error::internal(format!("no block starts at {start}")))?;

        if !block.fits(size) {
            return Err(Error::internal(format!(
                "block at {start} cannot hold {size} units"
            )));
        }

        let remainder = block.size - size;
        block.size = size;
        block.owner = Some(owner);

        if remainder > 0 {
            let split_start = start + size;
            log::debug!("split block at {start}: {size} allocated, {remainder} free at {split_start}");
            self.blocks
                .insert(split_start, Block::free(split_start, remainder));
        }

        Ok(())
    }

    /// Free every block owned by `owner`. Returns the freed blocks.
    ///
    /// Does not coalesce.
    pub fn release_all(&mut self, owner: Pid) -> Vec<Block> {
        let mut freed = Vec::new();
        for block in self.blocks.values_mut() {
            if block.owner == Some(owner) {
                freed.push(*block);
                block.owner = None;
            }
        }
        freed
    }

    /// Free the lowest-address block owned by `owner`, if any.
    ///
    /// Does not coalesce.
    pub fn release_first(&mut self, owner: Pid) -> Option<Block> {
        let block = self
            .blocks
            .values_mut()
            .find(|b| b.owner == Some(owner))?;
        let freed = *block;
        block.owner = None;
        Some(freed)
    }

    /// Check if `owner` holds any block.
    pub fn is_resident(&self, owner: Pid) -> bool {
        self.iter().any(|b| b.owner == Some(owner))
    }

    /// Merge runs of adjacent free blocks, left to right, until no two
    /// neighbours are free. Returns the number of merges performed.
    pub fn coalesce(&mut self) -> usize {
        let mut absorbed = Vec::new();
        let mut run_head: Option<usize> = None;

        for block in self.blocks.values() {
            match (block.is_free(), run_head) {
                (true, Some(_)) => absorbed.push(block.start),
                (true, None) => run_head = Some(block.start),
                (false, _) => run_head = None,
            }
        }

        for start in &absorbed {
            if let Some(block) = self.blocks.remove(start) {
                if let Some((_, prev)) = self.blocks.range_mut(..*start).next_back() {
                    prev.size += block.size;
                }
            }
        }

        absorbed.len()
    }

    /// Verify the list invariants.
    pub fn check_integrity(&self) -> Result<()> {
        let mut expected_start = 0;
        let mut prev_free = false;

        for (&key, block) in &self.blocks {
            if key != block.start {
                return Err(Error::internal(format!(
                    "block keyed at {key} claims start {}",
                    block.start
                )));
            }
            if block.size == 0 {
                return Err(Error::internal(format!("empty block at {key}")));
            }
            if block.start != expected_start {
                return Err(Error::internal(format!(
                    "block at {} does not follow previous end {expected_start}",
                    block.start
                )));
            }
            if prev_free && block.is_free() {
                return Err(Error::internal(format!(
                    "adjacent free blocks at {}",
                    block.start
                )));
            }
            prev_free = block.is_free();
            expected_start = block.end();
        }

        if expected_start != self.total_size {
            return Err(Error::internal(format!(
                "blocks cover {expected_start} units of {}",
                self.total_size
            )));
        }

        Ok(())
    }
}
