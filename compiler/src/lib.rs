//! Concord Compiler
//!
//! Turn parsed concepts into a closed, ordered and validated model.
//!
//! Responsibilities:
//! - Run initializers for computed fields
//! - Load, resolve and expand to a fixed point
//! - Report unresolved references once, after expansion closes
//! - Sequence the model and run semantic checks
//! - Hand the result to generators as a read-only `Model`

mod compiler;
mod config;
mod error;
mod model;
mod validator;

pub use compiler::{build, Compiler};
pub use config::BuildConfig;
pub use error::{BuildError, BuildResult};
pub use model::Model;
pub use validator::validate_semantics;
