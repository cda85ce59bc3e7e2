//! Allocator engine.
//!
//! Paged allocation over a fixed linear address space, with three fit
//! strategies, coalescing of neighbouring free blocks and FIFO swap-out when
//! a request cannot be placed.
//!
//! # Key Concepts
//!
//! ## Quantization
//!
//! Every request is rounded up to whole pages: with a page size of 100, a
//! request for 150 units occupies 200.
//!
//! ## Swap-out
//!
//! When no free block is large enough, the owner whose allocation is oldest
//! is swapped out (one block), neighbouring free blocks are merged and the
//! search runs again. This repeats once per victim until the request fits or
//! no resident owner is left to evict.
//!
//! ```text
//!   request 400, strategy first
//!
//!   ┌──────┬──────┬──────┬─┐        ┌─────────────┬──────┬─┐
//!   │ A300 │ B300 │ C300 │ │  evict │   free 300  │ ...  │ │  still no fit
//!   └──────┴──────┴──────┴─┘   A    └─────────────┴──────┴─┘
//!
//!   ┌────────────────────┬──────┬─┐        ┌─────┬──────────┬──────┬─┐
//!   │      free 600      │ C300 │ │ place  │ D400│ free 200 │ C300 │ │
//!   └────────────────────┴──────┴─┘  ───►  └─────┴──────────┴──────┴─┘
//! ```

use crate::block::{BlockInfo, BlockList, Pid};
use crate::config::AllocatorConfig;
use crate::eviction::EvictionQueue;
use crate::strategy::FitStrategy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of a successful allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Owner the memory was granted to.
    pub owner: Pid,
    /// Start address of the allocated block.
    pub address: usize,
    /// Units requested by the caller.
    pub requested: usize,
    /// Units actually occupied, a whole number of pages.
    pub size: usize,
    /// Number of pages occupied.
    pub pages: usize,
    /// Owners swapped out to make room, oldest first.
    pub evicted: Vec<Pid>,
}

/// Operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorStats {
    /// Allocations granted.
    pub allocations: u64,
    /// Deallocation calls that freed at least one block.
    pub deallocations: u64,
    /// Owners swapped out.
    pub evictions: u64,
    /// Allocations that ran out of memory.
    pub failed_allocations: u64,
}

/// Memory usage snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Size of the address space.
    pub total_units: usize,
    /// Units held by owners.
    pub allocated_units: usize,
    /// Units available.
    pub free_units: usize,
    /// Blocks in the list.
    pub num_blocks: usize,
    /// Free blocks in the list.
    pub num_free_blocks: usize,
    /// Largest single free block.
    pub largest_free_block: usize,
    /// Distinct owners holding memory.
    pub num_owners: usize,
}

impl MemoryStats {
    /// Calculate utilization as a fraction.
    pub fn utilization(&self) -> f64 {
        if self.total_units == 0 {
            0.0
        } else {
            self.allocated_units as f64 / self.total_units as f64
        }
    }

    /// External fragmentation: share of free space outside the largest free
    /// block.
    pub fn fragmentation(&self) -> f64 {
        if self.free_units == 0 {
            0.0
        } else {
            1.0 - self.largest_free_block as f64 / self.free_units as f64
        }
    }
}

/// Round `requested` up to whole pages. Returns `(pages, size)`, or `None`
/// when the rounded size does not fit in a `usize`.
///
/// # Examples
///
/// ```rust
/// use vmem_sim::allocator::quantize;
///
/// assert_eq!(quantize(150, 100), Some((2, 200)));
/// assert_eq!(quantize(100, 100), Some((1, 100)));
/// ```
pub fn quantize(requested: usize, page_size: usize) -> Option<(usize, usize)> {
    let pages = requested.div_ceil(page_size);
    pages.checked_mul(page_size).map(|size| (pages, size))
}

/// Simulated paged memory allocator.
///
/// # Examples
///
/// ```rust
/// use vmem_sim::{AllocatorConfig, FitStrategy, MemoryAllocator, Pid};
///
/// let mut allocator = MemoryAllocator::new(AllocatorConfig::default()).unwrap();
///
/// let allocation = allocator.allocate(Pid(1), 150, FitStrategy::First).unwrap();
/// assert_eq!(allocation.address, 0);
/// assert_eq!(allocation.size, 200);
///
/// assert_eq!(allocator.deallocate(Pid(1)).unwrap(), 1);
/// assert_eq!(allocator.list_blocks().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryAllocator {
    config: AllocatorConfig,

    /// Address space layout.
    blocks: BlockList,

    /// Owners in allocation order, for swap-out.
    eviction_queue: EvictionQueue,

    /// Next-fit scan start, a position in the block list.
    cursor: usize,

    stats: AllocatorStats,
}

impl Default for MemoryAllocator {
    fn default() -> Self {
        Self::from_validated(AllocatorConfig::default())
    }
}

impl MemoryAllocator {
    /// Create an allocator whose address space is one free block.
    pub fn new(config: AllocatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: AllocatorConfig) -> Self {
        log::debug!(
            "new address space: {} units, page size {}",
            config.total_size,
            config.page_size
        );

        Self {
            blocks: BlockList::new(config.total_size),
            config,
            eviction_queue: EvictionQueue::new(),
            cursor: 0,
            stats: AllocatorStats::default(),
        }
    }

    /// Create with explicit sizes.
    pub fn with_size(total_size: usize, page_size: usize) -> Result<Self> {
        Self::new(AllocatorConfig::with_size(total_size).page_size(page_size))
    }

    /// Get configuration.
    pub const fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Size of the address space.
    pub const fn total_size(&self) -> usize {
        self.config.total_size
    }

    /// Allocation granularity.
    pub const fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Underlying block list.
    pub const fn blocks(&self) -> &BlockList {
        &self.blocks
    }

    /// Swap-out queue, stale entries included.
    pub const fn eviction_queue(&self) -> &EvictionQueue {
        &self.eviction_queue
    }

    /// Current next-fit scan position.
    pub const fn next_fit_cursor(&self) -> usize {
        self.cursor
    }

    /// Operation counters.
    pub const fn stats(&self) -> AllocatorStats {
        self.stats
    }

    /// Allocate `requested` units to `owner` using a strategy given by name.
    ///
    /// An unknown name fails with [`Error::UnknownStrategy`] before anything
    /// is touched.
    pub fn allocate_named(
        &mut self,
        owner: Pid,
        requested: usize,
        strategy: &str,
    ) -> Result<Allocation> {
        let strategy: FitStrategy = strategy.parse()?;
        self.allocate(owner, requested, strategy)
    }

    /// Allocate `requested` units to `owner`.
    ///
    /// The request is rounded up to whole pages. If no free block is large
    /// enough, owners are swapped out oldest first until the request fits.
    /// Swap-outs performed before an [`Error::OutOfMemory`] are not undone;
    /// the error lists them. A request whose rounded size overflows `usize`
    /// can never be placed and is handled like any other oversized request.
    pub fn allocate(
        &mut self,
        owner: Pid,
        requested: usize,
        strategy: FitStrategy,
    ) -> Result<Allocation> {
        if requested == 0 {
            return Err(Error::invalid_request("allocation size must be positive"));
        }

        let quantized = quantize(requested, self.config.page_size);
        if quantized.is_none() {
            log::debug!("{requested} units overflow when rounded to whole pages");
        }

        let mut evicted = Vec::new();
        let max_evictions = self.eviction_queue.len();
        let mut placement = self.place(quantized, strategy);

        while placement.is_none() && evicted.len() < max_evictions {
            log::debug!("no {strategy} fit for {requested} units, attempting swap-out");
            let Some(victim) = self.evict_one() else {
                break;
            };
            evicted.push(victim);
            placement = self.place(quantized, strategy);
        }

        let (Some((pages, size)), Some(start)) = (quantized, placement) else {
            let needed = quantized.map_or(requested, |(_, size)| size);
            self.stats.failed_allocations += 1;
            log::warn!(
                "out of memory: PID {owner} needs {needed} units, largest free block is {}, {} swapped out",
                self.largest_free_block(),
                evicted.len()
            );
            return Err(Error::out_of_memory_after(
                format!("no free block of {needed} units for PID {owner}"),
                evicted,
            ));
        };

        self.blocks.claim(start, size, owner)?;
        self.eviction_queue.push(owner);
        self.stats.allocations += 1;

        log::info!("allocated {size} units ({pages} pages) to PID {owner} at address {start}");

        #[cfg(debug_assertions)]
        self.debug_check();

        Ok(Allocation {
            owner,
            address: start,
            requested,
            size,
            pages,
            evicted,
        })
    }

    /// Free every block held by `owner` and merge neighbouring free blocks.
    ///
    /// Returns the number of blocks freed.
    pub fn deallocate(&mut self, owner: Pid) -> Result<usize> {
        let freed = self.blocks.release_all(owner);
        for block in &freed {
            log::info!("freed memory of PID {owner} at address {}", block.start);
        }

        self.blocks.coalesce();

        #[cfg(debug_assertions)]
        self.debug_check();

        if freed.is_empty() {
            log::debug!("PID {owner} not found");
            return Err(Error::OwnerNotFound(owner.value()));
        }

        self.stats.deallocations += 1;
        Ok(freed.len())
    }

    /// Swap out the oldest resident owner's first block.
    ///
    /// Returns the victim, or `None` once the queue holds no resident owner.
    fn evict_one(&mut self) -> Option<Pid> {
        let victim = self.eviction_queue.next_victim(&self.blocks)?;
        self.blocks.release_first(victim)?;
        self.blocks.coalesce();
        self.stats.evictions += 1;

        log::info!("swapped out PID {victim}");
        Some(victim)
    }

    /// Placement search for a rounded request. An unrepresentable size never
    /// fits.
    fn place(&mut self, quantized: Option<(usize, usize)>, strategy: FitStrategy) -> Option<usize> {
        let (_, size) = quantized?;
        self.find_fit(size, strategy)
    }

    /// Run the placement search. Next fit advances the cursor on success.
    fn find_fit(&mut self, size: usize, strategy: FitStrategy) -> Option<usize> {
        let start = match strategy {
            FitStrategy::First => self.blocks.first_fit(size),
            FitStrategy::Best => self.blocks.best_fit(size),
            FitStrategy::Next => {
                let (start, cursor) = self.blocks.next_fit(size, self.cursor)?;
                self.cursor = cursor;
                Some(start)
            }
        };

        if let Some(start) = start {
            log::debug!("{strategy} fit for {size} units: block at {start}");
        }
        start
    }

    /// Snapshot of the block list in address order.
    pub fn list_blocks(&self) -> Vec<BlockInfo> {
        self.blocks.snapshot()
    }

    /// Distinct owners currently holding memory.
    pub fn owners(&self) -> Vec<Pid> {
        self.blocks
            .iter()
            .filter_map(|b| b.owner)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn largest_free_block(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.is_free())
            .map(|b| b.size)
            .max()
            .unwrap_or(0)
    }

    /// Get memory usage statistics.
    pub fn memory_stats(&self) -> MemoryStats {
        let free_units = self
            .blocks
            .iter()
            .filter(|b| b.is_free())
            .map(|b| b.size)
            .sum::<usize>();

        MemoryStats {
            total_units: self.config.total_size,
            allocated_units: self.config.total_size - free_units,
            free_units,
            num_blocks: self.blocks.len(),
            num_free_blocks: self.blocks.iter().filter(|b| b.is_free()).count(),
            largest_free_block: self.largest_free_block(),
            num_owners: self.owners().len(),
        }
    }

    /// Verify the block list invariants.
    pub fn check_invariants(&self) -> Result<()> {
        self.blocks.check_integrity()
    }

    #[cfg(debug_assertions)]
    fn debug_check(&self) {
        if let Err(e) = self.blocks.check_integrity() {
            panic!("block list corrupted: {e}");
        }
    }
}
