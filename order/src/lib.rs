//! Concord Order
//!
//! Processing order for a closed concept model.
//!
//! Responsibilities:
//! - Deterministic topological order (dependencies first, ties by key)
//! - Strongly connected component detection
//! - Minimal cycle reporting

mod scc;
mod sequencer;

pub use scc::strongly_connected_components;
pub use sequencer::{sequence, Sequencer};
