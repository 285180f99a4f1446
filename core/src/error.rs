//! Error taxonomy shared by every Concord build stage.
//!
//! - [`DefinitionError`]: the schema or the model itself is inconsistent.
//! - [`UnresolvedReferenceError`]: references that never resolved, reported
//!   once after expansion has closed.
//! - [`SemanticValidationError`]: raised by a concept's own self-check and
//!   passed through unchanged.
//! - [`CapabilityError`]: a macro or initializer could not produce output.

use thiserror::Error;

/// Errors in concept type definitions or in the concept model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("Unknown concept type '{name}'")]
    UnknownType { name: String },

    #[error("Concept type '{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    #[error("Duplicate concept type name '{name}'")]
    DuplicateType { name: String },

    #[error("Concept type '{type_name}' refines unknown base type '{base}'")]
    UnknownBaseType { type_name: String, base: String },

    #[error("Invalid name '{name}': expected an identifier")]
    InvalidName { name: String },

    #[error("Field '{field}' of concept type '{type_name}' references unknown concept type '{target}'")]
    UnknownReferenceTarget {
        type_name: String,
        field: String,
        target: String,
    },

    #[error(
        "Concept type '{type_name}' refines another concept type and must not declare key field '{field}'; \
         a refinement inherits the key of its base type"
    )]
    RefinementAddsKeyField { type_name: String, field: String },

    #[error("Field '{field}' of concept type '{type_name}' expects {expected}, but holds {actual}")]
    FieldKindMismatch {
        type_name: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Key field '{field}' of concept type '{type_name}' is not set")]
    MissingKeyValue { type_name: String, field: String },

    #[error("Field '{field}' of {concept} expects {expected}, but the referenced concept is {actual}")]
    ReferenceTypeMismatch {
        concept: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Two different concepts share the key '{key}':\n  {existing}\n  {incoming}")]
    KeyConflict {
        key: String,
        existing: String,
        incoming: String,
    },

    #[error(
        "Possible infinite loop detected: macro expansion did not converge after {passes} passes. \
         Macros still producing new concepts: {}",
        .macros.join(", ")
    )]
    InfiniteLoop { passes: usize, macros: Vec<String> },

    #[error(
        "Macro expansion exceeded the limit of {limit} concepts. Macros still producing new concepts: {}",
        .macros.join(", ")
    )]
    ConceptLimitExceeded { limit: usize, macros: Vec<String> },

    #[error("Dependency cycle detected between concepts:\n  {}", .concepts.join("\n  "))]
    DependencyCycle { concepts: Vec<String> },

    #[error("Capability '{capability}' registered for unknown concept type '{type_name}'")]
    UnknownCapabilityTarget {
        capability: String,
        type_name: String,
    },
}

impl DefinitionError {
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    pub fn unknown_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    pub fn missing_key_value(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingKeyValue {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    pub fn key_conflict(
        key: impl Into<String>,
        existing: impl Into<String>,
        incoming: impl Into<String>,
    ) -> Self {
        Self::KeyConflict {
            key: key.into(),
            existing: existing.into(),
            incoming: incoming.into(),
        }
    }

    pub fn infinite_loop(passes: usize, macros: Vec<String>) -> Self {
        Self::InfiniteLoop { passes, macros }
    }

    pub fn dependency_cycle(concepts: Vec<String>) -> Self {
        Self::DependencyCycle { concepts }
    }

    /// Descriptions of the concepts this error implicates, if any.
    pub fn implicated_concepts(&self) -> Vec<String> {
        match self {
            Self::KeyConflict {
                existing, incoming, ..
            } => vec![existing.clone(), incoming.clone()],
            Self::ReferenceTypeMismatch { concept, .. } => vec![concept.clone()],
            Self::DependencyCycle { concepts } => concepts.clone(),
            _ => Vec::new(),
        }
    }
}

/// A reference key that never matched any concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingReference {
    /// Key the reference was looking for.
    pub key: String,
    /// Descriptions of every concept that directly or transitively depends
    /// on the missing one, sorted and deduplicated.
    pub dependents: Vec<String>,
}

/// One or more references never resolved, even after expansion closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_missing(.missing))]
pub struct UnresolvedReferenceError {
    pub missing: Vec<MissingReference>,
}

fn render_missing(missing: &[MissingReference]) -> String {
    let mut out = String::from("Referenced concepts are not defined:");
    for entry in missing {
        out.push_str(&format!("\n  missing '{}', required by:", entry.key));
        for dependent in &entry.dependents {
            out.push_str(&format!("\n    {}", dependent));
        }
    }
    out
}

impl UnresolvedReferenceError {
    pub fn new(missing: Vec<MissingReference>) -> Self {
        Self { missing }
    }

    /// All dependent concept descriptions across the missing keys, deduplicated.
    pub fn implicated_concepts(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .missing
            .iter()
            .flat_map(|m| m.dependents.iter().cloned())
            .collect();
        all.sort();
        all.dedup();
        all
    }
}

/// Error raised by a concept's domain-specific self-check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SemanticValidationError {
    pub message: String,
    pub concepts: Vec<String>,
}

impl SemanticValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            concepts: Vec::new(),
        }
    }

    /// Attach the description of an implicated concept.
    pub fn with_concept(mut self, description: impl Into<String>) -> Self {
        self.concepts.push(description.into());
        self
    }
}

/// Error returned by a macro or initializer capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CapabilityError {
    pub message: String,
}

impl CapabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<DefinitionError> for CapabilityError {
    fn from(e: DefinitionError) -> Self {
        Self::new(e.to_string())
    }
}

/// Result type for definition-checked operations.
pub type DefinitionResult<T> = Result<T, DefinitionError>;
