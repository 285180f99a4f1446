//! Concord Expand
//!
//! Grow a concept model to a fixed point through macro capabilities.
//!
//! Responsibilities:
//! - Capability traits (macro, global macro, self-check, initializer)
//! - Capability registration per concept type, inherited by refinements
//! - Fixed-point expansion: Loading → Expanding → Closed
//! - Detect non-converging macros

mod capability;
mod engine;
mod error;
mod limits;

pub use capability::{
    CapabilityTable, ConceptInitializer, GlobalMacro, MacroExpander, MacroOutput, SemanticCheck,
};
pub use engine::{ExpansionEngine, ExpansionState, ExpansionStats, MacroStats};
pub use error::{ExpandError, ExpandResult};
pub use limits::ExpansionLimits;

/// Passes always allowed before non-convergence is suspected.
pub const DEFAULT_BASE_PASS_LIMIT: usize = 100;

/// Extra passes allowed per concept present when expansion starts.
pub const DEFAULT_PASSES_PER_CONCEPT: usize = 1;

/// Hard ceiling on the number of concepts in one model.
pub const DEFAULT_MAX_CONCEPTS: usize = 1_000_000;
