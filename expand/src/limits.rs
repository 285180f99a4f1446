//! Expansion limits.

use crate::{DEFAULT_BASE_PASS_LIMIT, DEFAULT_MAX_CONCEPTS, DEFAULT_PASSES_PER_CONCEPT};
use serde::{Deserialize, Serialize};

/// Bounds that turn a non-converging expansion into an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionLimits {
    pub base_pass_limit: usize,
    pub passes_per_concept: usize,
    pub max_concepts: usize,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            base_pass_limit: DEFAULT_BASE_PASS_LIMIT,
            passes_per_concept: DEFAULT_PASSES_PER_CONCEPT,
            max_concepts: DEFAULT_MAX_CONCEPTS,
        }
    }
}

impl ExpansionLimits {
    /// Number of passes allowed for a model holding `initial_count`
    /// concepts when expansion starts.
    ///
    /// The bound is fixed at the start: a bound that grew with the model
    /// would never stop a macro adding one concept per pass.
    pub fn pass_limit(&self, initial_count: usize) -> usize {
        self.base_pass_limit
            .saturating_add(self.passes_per_concept.saturating_mul(initial_count))
    }
}
