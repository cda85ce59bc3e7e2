//! Virtual Memory Allocator Simulation
//!
//! Models how an operating system's memory manager places, frees and swaps
//! out process allocations in a fixed-size linear address space. No real
//! memory is touched: the address space is a list of blocks.
//!
//! # Overview
//!
//! - **Allocator**: page-quantized allocation with first, best and next fit
//! - **Coalescing**: neighbouring free blocks are always merged
//! - **Swap-out**: FIFO eviction of the oldest allocation when nothing fits
//! - **Rendering**: block table and ASCII occupancy map
//! - **Command**: line-oriented session driving one allocator
//!
//! # Examples
//!
//! ```rust
//! use vmem_sim::{AllocatorConfig, FitStrategy, MemoryAllocator, Pid};
//!
//! let config = AllocatorConfig::with_size(1000).page_size(100);
//! let mut allocator = MemoryAllocator::new(config).unwrap();
//!
//! allocator.allocate(Pid(1), 300, FitStrategy::First).unwrap();
//! allocator.allocate(Pid(2), 300, FitStrategy::First).unwrap();
//! allocator.allocate(Pid(3), 300, FitStrategy::First).unwrap();
//!
//! // Only 100 units left: PID 1, the oldest allocation, is swapped out.
//! let allocation = allocator.allocate(Pid(4), 250, FitStrategy::Best).unwrap();
//! assert_eq!(allocation.evicted, vec![Pid(1)]);
//! assert_eq!(allocation.address, 0);
//! ```
//!
//! # Logging
//!
//! The library logs through the `log` facade: placement decisions at
//! `debug`, allocations, frees and swap-outs at `info`, exhaustion at `warn`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::return_self_not_must_use)]

pub mod allocator;
pub mod block;
pub mod command;
pub mod config;
pub mod error;
pub mod eviction;
pub mod render;
pub mod strategy;

pub use allocator::{Allocation, AllocatorStats, MemoryAllocator, MemoryStats};
pub use block::{Block, BlockInfo, BlockList, Pid};
pub use config::{AllocatorConfig, MapConfig, SimConfig};
pub use error::{Error, Result};
pub use strategy::FitStrategy;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
