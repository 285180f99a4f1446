//! Build error types.

use concord_core::{
    CapabilityError, DefinitionError, SemanticValidationError, UnresolvedReferenceError,
};
use concord_expand::ExpandError;
use concord_graph::FinalizeError;
use thiserror::Error;

/// Errors that abort a model build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The schema or the model is inconsistent.
    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// References that never resolved, reported after expansion closed.
    #[error("{0}")]
    Unresolved(#[from] UnresolvedReferenceError),

    /// A concept's own check rejected the model.
    #[error("{0}")]
    Semantic(#[from] SemanticValidationError),

    #[error("Macro of {concept} failed: {source}")]
    Macro {
        concept: String,
        #[source]
        source: CapabilityError,
    },

    #[error("Initializer of {concept} failed: {source}")]
    Initializer {
        concept: String,
        #[source]
        source: CapabilityError,
    },

    /// The expansion engine was driven out of order.
    #[error("{0}")]
    Expansion(ExpandError),
}

impl BuildError {
    pub fn initializer_failed(concept: impl Into<String>, source: CapabilityError) -> Self {
        Self::Initializer {
            concept: concept.into(),
            source,
        }
    }

    /// Descriptions of every concept the error names, for drivers that
    /// print them apart from the message.
    pub fn implicated_concepts(&self) -> Vec<String> {
        match self {
            Self::Definition(e) => e.implicated_concepts(),
            Self::Unresolved(e) => e.implicated_concepts(),
            Self::Semantic(e) => e.concepts.clone(),
            Self::Macro { concept, .. } | Self::Initializer { concept, .. } => vec![concept.clone()],
            Self::Expansion(_) => Vec::new(),
        }
    }
}

impl From<ExpandError> for BuildError {
    fn from(e: ExpandError) -> Self {
        match e {
            ExpandError::Definition(e) => Self::Definition(e),
            ExpandError::Macro { concept, source } => Self::Macro { concept, source },
            e @ ExpandError::InvalidState { .. } => Self::Expansion(e),
        }
    }
}

impl From<FinalizeError> for BuildError {
    fn from(e: FinalizeError) -> Self {
        match e {
            FinalizeError::Definition(e) => Self::Definition(e),
            FinalizeError::Unresolved(e) => Self::Unresolved(e),
        }
    }
}

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;
