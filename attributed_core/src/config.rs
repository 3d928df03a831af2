//! Configuration for arenas and datum buffers.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Strategy deciding how much room an internal buffer gains when a push
/// finds it full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// Start at `initial`, double until `threshold`, then add `increment`.
    Doubling {
        initial: usize,
        threshold: usize,
        increment: usize,
    },
    /// Always add a fixed number of slots.
    Linear { increment: usize },
    /// Grow by exactly one slot.
    Exact,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        GrowthPolicy::Doubling {
            initial: 4,
            threshold: 1024,
            increment: 256,
        }
    }
}

impl GrowthPolicy {
    /// Capacity to grow to from `capacity` so that at least `required` elements fit.
    ///
    /// Fails when the computation overflows `usize`.
    pub fn next_capacity(&self, capacity: usize, required: usize) -> Result<usize> {
        let overflow = || Error::CapacityOverflow {
            requested: required,
        };
        let mut next = capacity;
        while next < required {
            next = match *self {
                GrowthPolicy::Doubling {
                    initial,
                    threshold,
                    increment,
                } => {
                    if next == 0 {
                        initial.max(1)
                    } else if next < threshold {
                        next.checked_mul(2).ok_or_else(overflow)?
                    } else {
                        next.checked_add(increment.max(1)).ok_or_else(overflow)?
                    }
                }
                GrowthPolicy::Linear { increment } => {
                    next.checked_add(increment.max(1)).ok_or_else(overflow)?
                }
                GrowthPolicy::Exact => required,
            };
        }
        Ok(next)
    }
}

/// Settings applied by a [`ScopeArena`](crate::ScopeArena) to everything it creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Growth strategy for datums created by the arena.
    pub growth: GrowthPolicy,

    /// Number of entries reserved up front in every new scope.
    pub entry_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            growth: GrowthPolicy::default(),
            entry_capacity: 8,
        }
    }
}

impl CoreConfig {
    /// Parse a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}
