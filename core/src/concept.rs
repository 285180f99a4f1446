//! The concept instance structure.
//!
//! A concept is a typed record of field values. Its identity (key) is derived
//! from its type's key fields; see the identity module of `concord-graph`.

use crate::{ConceptId, Fields, Reference, Stub, TypeId, Value};

/// A concept instance: a value of some concept type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    /// Declared type of this concept (reference to registry).
    pub type_id: TypeId,
    /// Field values. An absent entry is an unset (null) field.
    pub fields: Fields,
}

static NULL: Value = Value::Null;

impl Concept {
    /// Create a new concept with the given field values.
    pub fn new(type_id: TypeId, fields: Fields) -> Self {
        Self { type_id, fields }
    }

    /// Get a field value by name. Unset fields read as `Value::Null`.
    pub fn get(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&NULL)
    }

    /// Set a field value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Builder-style field assignment.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Iterate over all reference-valued fields.
    pub fn references(&self) -> impl Iterator<Item = (&str, &Reference)> + '_ {
        self.fields
            .iter()
            .filter_map(|(name, value)| value.as_reference().map(|r| (name.as_str(), r)))
    }

    /// Iterate over fields that still hold a stub.
    pub fn stubs(&self) -> impl Iterator<Item = (&str, &Stub)> + '_ {
        self.references()
            .filter_map(|(name, r)| r.as_stub().map(|s| (name, s)))
    }

    /// Handles of all canonical references held by this concept.
    pub fn canonical_references(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.references().filter_map(|(_, r)| r.as_canonical())
    }

    /// Returns true if any reference field still holds a stub.
    pub fn has_stubs(&self) -> bool {
        self.stubs().next().is_some()
    }
}
