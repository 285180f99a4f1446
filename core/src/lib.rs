//! Concord Core Types
//!
//! This crate provides the foundational types used throughout Concord:
//! - Identity handles (ConceptId, TypeId)
//! - Value types (primitive values and stub/canonical references)
//! - The Concept instance structure
//! - The error taxonomy shared by every build stage

mod concept;
mod error;
mod id;
mod value;

pub use concept::*;
pub use error::*;
pub use id::*;
pub use value::*;
