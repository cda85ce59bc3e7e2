//! Placement strategies.
//!
//! A strategy decides which free block satisfies an allocation request:
//!
//! | Strategy | Picks |
//! |----------|-------|
//! | `first`  | lowest-address free block that is large enough |
//! | `best`   | smallest free block that is large enough |
//! | `next`   | like `first`, but resumes scanning where the last `next` search stopped |

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fit algorithm used by [`MemoryAllocator::allocate`](crate::MemoryAllocator::allocate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitStrategy {
    /// First fit.
    #[default]
    First,
    /// Best fit.
    Best,
    /// Next fit.
    Next,
}

impl FitStrategy {
    /// All strategies, in display order.
    pub const ALL: [Self; 3] = [Self::First, Self::Best, Self::Next];

    /// Name as accepted by [`FromStr`].
    pub const fn name(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Best => "best",
            Self::Next => "next",
        }
    }
}

impl fmt::Display for FitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FitStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Self::First),
            "best" => Ok(Self::Best),
            "next" => Ok(Self::Next),
            other => Err(Error::unknown_strategy(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_strategies() {
        assert_eq!("first".parse::<FitStrategy>(), Ok(FitStrategy::First));
        assert_eq!("best".parse::<FitStrategy>(), Ok(FitStrategy::Best));
        assert_eq!("next".parse::<FitStrategy>(), Ok(FitStrategy::Next));
    }

    #[test]
    fn test_parse_unknown_strategy() {
        assert_eq!(
            "worst".parse::<FitStrategy>(),
            Err(Error::unknown_strategy("worst"))
        );
        // Names are case sensitive.
        assert!("First".parse::<FitStrategy>().is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for strategy in FitStrategy::ALL {
            assert_eq!(strategy.to_string().parse::<FitStrategy>(), Ok(strategy));
        }
    }

    #[test]
    fn test_default_is_first() {
        assert_eq!(FitStrategy::default(), FitStrategy::First);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&FitStrategy::Best).unwrap();
        assert_eq!(json, "\"best\"");
        let parsed: FitStrategy = serde_json::from_str("\"next\"").unwrap();
        assert_eq!(parsed, FitStrategy::Next);
    }
}
