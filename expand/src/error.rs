//! Expansion error types.

use crate::engine::ExpansionState;
use concord_core::{CapabilityError, DefinitionError};
use thiserror::Error;

/// Result type for expansion operations.
pub type ExpandResult<T> = Result<T, ExpandError>;

/// Errors that can occur while loading or expanding a model.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("Macro of {concept} failed: {source}")]
    Macro {
        concept: String,
        #[source]
        source: CapabilityError,
    },

    #[error("Expansion is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: ExpansionState,
        actual: ExpansionState,
    },
}

impl ExpandError {
    pub fn macro_failed(concept: impl Into<String>, source: CapabilityError) -> Self {
        Self::Macro {
            concept: concept.into(),
            source,
        }
    }

    pub fn invalid_state(expected: ExpansionState, actual: ExpansionState) -> Self {
        Self::InvalidState { expected, actual }
    }
}
