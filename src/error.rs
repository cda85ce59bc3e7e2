//! Error types for the allocator simulation.
//!
//! Every failure the engine can report is non-fatal: the allocator stays
//! usable and its block list keeps all of its invariants after any error.
//!
//! # Examples
//!
//! ```rust
//! use vmem_sim::{Error, Result};
//!
//! fn checked_size(size: usize) -> Result<usize> {
//!     if size == 0 {
//!         return Err(Error::invalid_request("size must be positive"));
//!     }
//!     Ok(size)
//! }
//!
//! assert!(checked_size(0).is_err());
//! ```

use crate::block::Pid;

/// Main error type for the crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Engine constructed with a zero total size or page size, or a
    /// configuration file could not be read.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Allocation requested with a zero size.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Placement strategy name is not `first`, `best` or `next`.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// No free block fits, even after evicting every candidate.
    #[error("out of memory: {message}")]
    OutOfMemory {
        /// What could not be placed.
        message: String,
        /// Owners swapped out before giving up, oldest first. These
        /// swap-outs are not undone.
        evicted: Vec<Pid>,
    },

    /// Deallocation of an owner that holds no memory.
    #[error("PID {0} not found")]
    OwnerNotFound(u32),

    /// Malformed command line in the interactive session.
    #[error("command error: {0}")]
    Command(String),

    /// Block list invariant violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an unknown strategy error.
    pub fn unknown_strategy(name: impl Into<String>) -> Self {
        Self::UnknownStrategy(name.into())
    }

    /// Create an out of memory error with no swap-outs.
    pub fn out_of_memory(msg: impl Into<String>) -> Self {
        Self::out_of_memory_after(msg, Vec::new())
    }

    /// Create an out of memory error reporting the owners swapped out
    /// before the allocation gave up.
    pub fn out_of_memory_after(msg: impl Into<String>, evicted: Vec<Pid>) -> Self {
        Self::OutOfMemory {
            message: msg.into(),
            evicted,
        }
    }

    /// Owners swapped out by the failed operation. Empty for every error
    /// other than [`Error::OutOfMemory`].
    pub fn evicted(&self) -> &[Pid] {
        match self {
            Self::OutOfMemory { evicted, .. } => evicted,
            _ => &[],
        }
    }

    /// Create a command error.
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the caller can retry after changing the allocator's state,
    /// e.g. freeing memory before repeating an allocation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vmem_sim::Error;
    ///
    /// assert!(Error::out_of_memory("full").is_recoverable());
    /// assert!(!Error::unknown_strategy("worst").is_recoverable());
    /// ```
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. } | Self::OwnerNotFound(_))
    }

    /// Check if the error stems from bad caller input.
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration(_)
                | Self::InvalidRequest(_)
                | Self::UnknownStrategy(_)
                | Self::Command(_)
        )
    }

    /// Get error code for logging.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vmem_sim::Error;
    ///
    /// assert_eq!(Error::OwnerNotFound(7).code(), "OWNER_NOT_FOUND");
    /// ```
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::UnknownStrategy(_) => "UNKNOWN_STRATEGY",
            Self::OutOfMemory { .. } => "OUT_OF_MEMORY",
            Self::OwnerNotFound(_) => "OWNER_NOT_FOUND",
            Self::Command(_) => "COMMAND",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

/// Result type alias for allocator operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::invalid_configuration("").code(),
            "INVALID_CONFIGURATION"
        );
        assert_eq!(Error::invalid_request("").code(), "INVALID_REQUEST");
        assert_eq!(Error::unknown_strategy("").code(), "UNKNOWN_STRATEGY");
        assert_eq!(Error::out_of_memory("").code(), "OUT_OF_MEMORY");
        assert_eq!(Error::OwnerNotFound(1).code(), "OWNER_NOT_FOUND");
        assert_eq!(Error::command("").code(), "COMMAND");
        assert_eq!(Error::internal("").code(), "INTERNAL");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", Error::unknown_strategy("worst")),
            "unknown strategy: worst"
        );
        assert_eq!(format!("{}", Error::OwnerNotFound(42)), "PID 42 not found");
        assert_eq!(
            format!("{}", Error::out_of_memory("need 300 units")),
            "out of memory: need 300 units"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::invalid_request("").is_caller_error());
        assert!(Error::unknown_strategy("").is_caller_error());
        assert!(Error::command("").is_caller_error());
        assert!(!Error::out_of_memory("").is_caller_error());
        assert!(!Error::internal("").is_caller_error());

        assert!(Error::out_of_memory("").is_recoverable());
        assert!(Error::OwnerNotFound(3).is_recoverable());
        assert!(!Error::internal("").is_recoverable());
    }

    #[test]
    fn test_out_of_memory_carries_victims() {
        let err = Error::out_of_memory_after("no room", vec![Pid(1), Pid(2)]);
        assert_eq!(err.evicted(), &[Pid(1), Pid(2)]);
        assert_eq!(err.to_string(), "out of memory: no room");

        assert!(Error::out_of_memory("full").evicted().is_empty());
        assert!(Error::OwnerNotFound(1).evicted().is_empty());
    }

    #[test]
    fn test_error_std_error_impl() {
        let err = Error::invalid_configuration("page size is zero");
        let std_err: &dyn std::error::Error = &err;
        assert!(std_err.to_string().contains("page size"));
    }
}
