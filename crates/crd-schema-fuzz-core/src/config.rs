//! Configuration for fuzz sweeps.

use serde::{Deserialize, Serialize};

/// Iterations run per CRD version when nothing else is configured.
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Options for a fuzz sweep and the random-value generator behind it.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `nil-chance`, `max-elements`).
/// Missing fields take their default, so a config file only needs the knobs it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FuzzOptions {
    /// Randomized checks per version. Default: 1000.
    pub iterations: usize,
    /// Seed for the generator. `None` draws a fresh seed, which is logged so
    /// a failing run can be replayed.
    pub seed: Option<u64>,
    /// Probability that an optional value, collection or map is left empty.
    pub nil_chance: f64,
    /// Minimum number of elements in a populated collection.
    pub min_elements: usize,
    /// Maximum number of elements in a populated collection.
    pub max_elements: usize,
    /// Nesting depth beyond which values are left untouched.
    pub max_depth: usize,
}

impl Default for FuzzOptions {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            nil_chance: 0.2,
            min_elements: 1,
            max_elements: 10,
            max_depth: 100,
        }
    }
}
