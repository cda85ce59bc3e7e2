//! Simulation configuration.
//!
//! Configuration can be built in code or loaded from a JSON file. Every
//! field is optional in JSON and falls back to its default.
//!
//! # Example
//!
//! ```rust
//! use vmem_sim::config::{AllocatorConfig, SimConfig};
//!
//! let config = SimConfig::from_json(r#"{ "allocator": { "total_size": 4096 } }"#).unwrap();
//! assert_eq!(config.allocator.total_size, 4096);
//! assert_eq!(config.allocator.page_size, 100);
//!
//! let custom = AllocatorConfig::with_size(2048).page_size(64);
//! assert!(custom.validate().is_ok());
//! ```

use crate::strategy::FitStrategy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default address-space size in units.
pub const DEFAULT_TOTAL_SIZE: usize = 1000;

/// Default page size in units.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default number of buckets in the memory map.
pub const DEFAULT_MAP_BUCKETS: usize = 50;

/// Allocator engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Size of the address space.
    pub total_size: usize,

    /// Allocation granularity. Requests are rounded up to whole pages.
    pub page_size: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            total_size: DEFAULT_TOTAL_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AllocatorConfig {
    /// Create a config with the given total size and the default page size.
    pub const fn with_size(total_size: usize) -> Self {
        Self {
            total_size,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set page size.
    pub const fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Number of whole pages in the address space.
    pub const fn num_pages(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.total_size / self.page_size
        }
    }

    /// Reject zero sizes.
    pub fn validate(&self) -> Result<()> {
        if self.total_size == 0 {
            return Err(Error::invalid_configuration(
                "total size must be positive",
            ));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_configuration("page size must be positive"));
        }
        Ok(())
    }
}

/// Memory map rendering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Number of equal buckets the address space is divided into.
    pub buckets: usize,

    /// Marker for buckets overlapping an allocated block.
    pub allocated_marker: char,

    /// Marker for fully free buckets.
    pub free_marker: char,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            buckets: DEFAULT_MAP_BUCKETS,
            allocated_marker: '#',
            free_marker: '.',
        }
    }
}

impl MapConfig {
    /// Create with bucket count.
    pub fn with_buckets(buckets: usize) -> Self {
        Self {
            buckets,
            ..Default::default()
        }
    }

    /// Set markers.
    pub const fn markers(mut self, allocated: char, free: char) -> Self {
        self.allocated_marker = allocated;
        self.free_marker = free;
        self
    }

    /// Reject an empty map.
    pub fn validate(&self) -> Result<()> {
        if self.buckets == 0 {
            return Err(Error::invalid_configuration(
                "map bucket count must be positive",
            ));
        }
        Ok(())
    }
}

/// Top-level configuration for a simulation session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Engine settings.
    pub allocator: AllocatorConfig,

    /// Map rendering settings.
    pub map: MapConfig,

    /// Strategy used when a command omits one.
    pub default_strategy: FitStrategy,
}

impl SimConfig {
    /// Parse from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::invalid_configuration(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            Error::invalid_configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("cannot serialize config: {e}")))
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<()> {
        self.allocator.validate()?;
        self.map.validate()
    }
}
