//! Text rendering of the block list.
//!
//! Two views are available: a table with one line per block, and a
//! fixed-width occupancy map.
//!
//! # Example
//!
//! ```rust
//! use vmem_sim::render::{render_map, render_table};
//! use vmem_sim::{FitStrategy, MapConfig, MemoryAllocator, Pid};
//!
//! let mut allocator = MemoryAllocator::default();
//! allocator.allocate(Pid(1), 150, FitStrategy::First).unwrap();
//!
//! let table = render_table(&allocator.list_blocks());
//! assert!(table.contains("[0 - 199] : Allocated (PID 1)"));
//!
//! let map = render_map(&allocator.list_blocks(), allocator.total_size(), &MapConfig::with_buckets(10));
//! assert!(map.contains("##........"));
//! ```

use crate::allocator::{AllocatorStats, MemoryStats};
use crate::block::BlockInfo;
use crate::config::MapConfig;
use std::fmt::Write;

/// One line per block: `[start - end] : Free` or
/// `[start - end] : Allocated (PID n)`.
pub fn render_table(blocks: &[BlockInfo]) -> String {
    let mut out = String::from("--- Memory Blocks ---\n");
    for block in blocks {
        let last = block.range.end.saturating_sub(1);
        let _ = match block.owner {
            Some(pid) => writeln!(
                out,
                "[{} - {}] : Allocated (PID {})",
                block.range.start, last, pid
            ),
            None => writeln!(out, "[{} - {}] : Free", block.range.start, last),
        };
    }
    out
}

/// Paint one marker per bucket. A bucket is marked allocated when any
/// allocated block overlaps it.
pub fn occupancy(blocks: &[BlockInfo], total_size: usize, buckets: usize) -> Vec<bool> {
    let mut map = vec![false; buckets];
    if total_size == 0 || buckets == 0 {
        return map;
    }

    // Bucket i spans [i * total / buckets, (i + 1) * total / buckets).
    let scaled = |addr: usize| addr as u128 * buckets as u128;
    let total = total_size as u128;

    for block in blocks.iter().filter(|b| !b.free && !b.range.is_empty()) {
        let first = (scaled(block.range.start) / total) as usize;
        let last = (scaled(block.range.end).div_ceil(total) as usize)
            .saturating_sub(1)
            .min(buckets - 1);
        if first > last {
            continue;
        }
        for slot in &mut map[first..=last] {
            *slot = true;
        }
    }
    map
}

/// Fixed-width occupancy map with header and legend.
pub fn render_map(blocks: &[BlockInfo], total_size: usize, config: &MapConfig) -> String {
    let line: String = occupancy(blocks, total_size, config.buckets)
        .into_iter()
        .map(|used| {
            if used {
                config.allocated_marker
            } else {
                config.free_marker
            }
        })
        .collect();

    format!(
        "--- Memory Map ---\n{line}\nLegend: {} = Allocated, {} = Free\n",
        config.allocated_marker, config.free_marker
    )
}

/// Multi-line usage summary.
pub fn render_stats(stats: &AllocatorStats, memory: &MemoryStats) -> String {
    let mut out = String::from("--- Statistics ---\n");
    let _ = writeln!(
        out,
        "Used: {} / {} units ({:.1}%)",
        memory.allocated_units,
        memory.total_units,
        memory.utilization() * 100.0
    );
    let _ = writeln!(
        out,
        "Blocks: {} ({} free, largest free {})",
        memory.num_blocks, memory.num_free_blocks, memory.largest_free_block
    );
    let _ = writeln!(out, "Fragmentation: {:.1}%", memory.fragmentation() * 100.0);
    let _ = writeln!(out, "Owners: {}", memory.num_owners);
    let _ = writeln!(
        out,
        "Allocations: {}, failed: {}, deallocations: {}, swap-outs: {}",
        stats.allocations, stats.failed_allocations, stats.deallocations, stats.evictions
    );
    out
}
