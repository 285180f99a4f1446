//! Concord Concept Graph
//!
//! This crate holds the resolved concept model and its identity rules:
//! - Identity: canonical keys, descriptions and dependency sets
//! - Concept store: arena of canonical concepts indexed by key and type
//! - Reference resolver: stub references replaced in place by canonical handles
//! - Dependency tracker: intrinsic (reference) and declared ordering edges

mod dependencies;
mod identity;
mod index;
mod resolver;
mod store;

pub use dependencies::{Dependency, DependencyTracker};
pub use identity::{quote_key_value, Identity};
pub use index::TypeIndex;
pub use resolver::{
    resolve_references, FinalizeError, ReferenceResolver, Resolution, UnresolvedReference,
};
pub use store::{AddOutcome, ConceptStore};
