//! Swap-out Walkthrough
//!
//! Fills a small address space, frees part of it, and then issues requests
//! that only succeed after the oldest allocations are swapped out.
//!
//! # Run
//!
//! ```bash
//! cargo run --example eviction_walkthrough
//! ```

use vmem_sim::render::{render_map, render_stats, render_table};
use vmem_sim::{AllocatorConfig, FitStrategy, MapConfig, MemoryAllocator, Pid};

fn show(allocator: &MemoryAllocator, map: &MapConfig) {
    print!("{}", render_table(&allocator.list_blocks()));
    print!(
        "{}",
        render_map(&allocator.list_blocks(), allocator.total_size(), map)
    );
    println!();
}

fn main() {
    println!("=== Swap-out Walkthrough ===\n");

    let config = AllocatorConfig::with_size(1000).page_size(100);
    println!("Address space: {} units", config.total_size);
    println!("Page size: {} units ({} pages)", config.page_size, config.num_pages());
    println!();

    let mut allocator = MemoryAllocator::new(config).expect("valid configuration");
    let map = MapConfig::default();

    let requests = [
        (1, 150, FitStrategy::First),
        (2, 320, FitStrategy::First),
        (3, 100, FitStrategy::Best),
        (4, 250, FitStrategy::Next),
    ];

    for (pid, size, strategy) in requests {
        match allocator.allocate(Pid(pid), size, strategy) {
            Ok(a) => println!(
                "  PID {}: {} units requested, {} granted ({} pages) at {} [{}]",
                pid, size, a.size, a.pages, a.address, strategy
            ),
            Err(e) => println!("  PID {}: {}", pid, e),
        }
    }
    println!();
    show(&allocator, &map);

    println!("Freeing PID 1...");
    let freed = allocator.deallocate(Pid(1)).expect("PID 1 is resident");
    println!("  {} block(s) freed\n", freed);
    show(&allocator, &map);

    // PID 1 is a stale queue entry now: PID 2 is the first real victim.
    println!("Requesting 500 units for PID 5 (best fit)...");
    match allocator.allocate(Pid(5), 500, FitStrategy::Best) {
        Ok(a) => {
            for victim in &a.evicted {
                println!("  Swapped out PID {}", victim);
            }
            println!("  Allocated {} units to PID 5 at {}", a.size, a.address);
        }
        Err(e) => println!("  {}", e),
    }
    println!();
    show(&allocator, &map);

    println!("Requesting 2000 units for PID 6 (cannot ever fit)...");
    if let Err(e) = allocator.allocate(Pid(6), 2000, FitStrategy::First) {
        println!("  {} [{}]", e, e.code());
    }
    println!();
    show(&allocator, &map);

    print!("{}", render_stats(&allocator.stats(), &allocator.memory_stats()));
}
