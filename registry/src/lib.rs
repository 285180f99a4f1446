//! Concord Registry
//!
//! Concept type schema lookup. Single source of truth for concept types, their
//! key fields, refinement chains and the capabilities they satisfy.
//! The registry is immutable after construction via RegistryBuilder.

mod builder;
mod registry;
mod types;

pub use builder::{RegistryBuilder, TypeBuilder};
pub use registry::Registry;
pub use types::*;
