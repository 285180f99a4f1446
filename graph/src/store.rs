//! Concept store: the arena of canonical concept instances.

use crate::identity::Identity;
use crate::index::TypeIndex;
use concord_core::{
    Concept, ConceptId, DefinitionError, DefinitionResult, TypeId, Value,
};
use concord_registry::{FieldKind, Registry};
use std::collections::HashMap;

/// Result of offering a concept to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The key was new; the concept now lives at this handle.
    Added(ConceptId),
    /// The key already existed with a compatible description. `refined` is
    /// set when the stored instance was replaced by a more derived one.
    DuplicateIgnored { id: ConceptId, refined: bool },
    /// The key already existed with a conflicting description.
    Conflict {
        key: String,
        existing: ConceptId,
        incoming: Box<Concept>,
    },
}

/// Comparable form of a field value: references compare by target key.
#[derive(Debug, PartialEq, Eq)]
enum Comparable {
    Value(Value),
    Key(String),
}

/// The in-memory concept store.
///
/// Concepts are never removed. A slot's content may be replaced by a more
/// specific description of the same key, and reference fields are rewritten
/// in place from stub to canonical; handles stay valid through both.
#[derive(Debug)]
pub struct ConceptStore<'r> {
    registry: &'r Registry,
    /// Concept arena, indexed by ConceptId
    concepts: Vec<Concept>,
    /// Key of each slot
    keys: Vec<String>,
    /// Key lookup
    by_key: HashMap<String, ConceptId>,
    /// Type index
    type_index: TypeIndex,
}

impl<'r> ConceptStore<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            concepts: Vec::new(),
            keys: Vec::new(),
            by_key: HashMap::new(),
            type_index: TypeIndex::new(),
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Identity rules bound to the current arena.
    pub fn identity(&self) -> Identity<'_> {
        Identity::new(self.registry, &self.concepts)
    }

    // ==================== Lookups ====================

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Look up a canonical concept by key.
    pub fn try_get(&self, key: &str) -> Option<ConceptId> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, id: ConceptId) -> Option<&Concept> {
        self.concepts.get(id.index())
    }

    /// Key of a stored concept.
    pub fn key_of(&self, id: ConceptId) -> Option<&str> {
        self.keys.get(id.index()).map(|k| k.as_str())
    }

    /// Value of a field, `Value::Null` for unknown handles or unset fields.
    pub fn field(&self, id: ConceptId, name: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.get(id).map(|c| c.get(name)).unwrap_or(&NULL)
    }

    /// Canonical concept referenced by a field, if resolved.
    pub fn referenced(&self, id: ConceptId, name: &str) -> Option<ConceptId> {
        self.field(id, name).as_concept()
    }

    /// All handles in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ConceptId> + '_ {
        (0..self.concepts.len() as u32).map(ConceptId::new)
    }

    /// All concepts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ConceptId, &Concept)> + '_ {
        self.concepts
            .iter()
            .enumerate()
            .map(|(i, c)| (ConceptId::new(i as u32), c))
    }

    /// Concepts of a type or any of its refinements, in insertion order.
    pub fn of_type(&self, type_id: TypeId) -> Vec<ConceptId> {
        let mut ids: Vec<ConceptId> = self.type_index.get(type_id).collect();
        for sub in self.registry.get_subtypes(type_id) {
            ids.extend(self.type_index.get(sub));
        }
        ids.sort();
        ids
    }

    /// Concepts of the named type or any of its refinements.
    pub fn of_type_name(&self, type_name: &str) -> Vec<ConceptId> {
        self.registry
            .get_type_id(type_name)
            .map(|type_id| self.of_type(type_id))
            .unwrap_or_default()
    }

    /// Full description of a stored concept for diagnostics.
    pub fn describe(&self, id: ConceptId) -> String {
        match self.get(id) {
            Some(concept) => self.identity().describe(concept),
            None => id.to_string(),
        }
    }

    // ==================== Mutation ====================

    /// Add a concept, or reconcile it with the stored concept of the same key.
    pub fn add_or_reconcile(&mut self, concept: Concept) -> DefinitionResult<AddOutcome> {
        self.check_fields(&concept)?;
        let key = self.identity().key(&concept)?;

        let Some(existing_id) = self.try_get(&key) else {
            let id = ConceptId::new(self.concepts.len() as u32);
            tracing::debug!(%key, id = %id, "concept added");
            self.type_index.insert(concept.type_id, id);
            self.by_key.insert(key.clone(), id);
            self.keys.push(key);
            self.concepts.push(concept);
            return Ok(AddOutcome::Added(id));
        };

        let existing_type = self.concepts[existing_id.index()].type_id;
        let incoming_type = concept.type_id;

        let compatible = if self.registry.are_related(existing_type, incoming_type) {
            // Compare the fields of the less derived type; both types have them
            let shared = if self.registry.is_subtype(existing_type, incoming_type) {
                incoming_type
            } else {
                existing_type
            };
            self.fields_equal(shared, &self.concepts[existing_id.index()], &concept)
        } else {
            false
        };

        if !compatible {
            return Ok(AddOutcome::Conflict {
                key,
                existing: existing_id,
                incoming: Box::new(concept),
            });
        }

        if incoming_type != existing_type && self.registry.is_subtype(incoming_type, existing_type) {
            tracing::debug!(
                %key,
                from = %self.registry.type_name(existing_type),
                to = %self.registry.type_name(incoming_type),
                "concept refined"
            );
            self.type_index.retype(existing_type, incoming_type, existing_id);
            self.concepts[existing_id.index()] = concept;
            return Ok(AddOutcome::DuplicateIgnored {
                id: existing_id,
                refined: true,
            });
        }

        tracing::trace!(%key, "duplicate concept ignored");
        Ok(AddOutcome::DuplicateIgnored {
            id: existing_id,
            refined: false,
        })
    }

    /// Add a concept, turning a conflicting description into a definition error.
    ///
    /// Returns the handle and whether the key was new.
    pub fn add(&mut self, concept: Concept) -> DefinitionResult<(ConceptId, bool)> {
        match self.add_or_reconcile(concept)? {
            AddOutcome::Added(id) => Ok((id, true)),
            AddOutcome::DuplicateIgnored { id, .. } => Ok((id, false)),
            AddOutcome::Conflict {
                key,
                existing,
                incoming,
            } => Err(self.conflict_error(&key, existing, &incoming)),
        }
    }

    /// Definition error naming both conflicting descriptions.
    pub fn conflict_error(&self, key: &str, existing: ConceptId, incoming: &Concept) -> DefinitionError {
        let identity = self.identity();
        DefinitionError::key_conflict(key, self.describe(existing), identity.describe(incoming))
    }

    /// Replace a reference field with a canonical handle.
    pub(crate) fn set_reference(&mut self, id: ConceptId, field: &str, target: ConceptId) {
        if let Some(concept) = self.concepts.get_mut(id.index()) {
            concept.set(field, target);
        }
    }

    /// Check that a resolved reference points at an acceptable type.
    pub(crate) fn check_reference_type(
        &self,
        owner: ConceptId,
        field: &str,
        target: ConceptId,
    ) -> DefinitionResult<()> {
        let (Some(owner_concept), Some(target_concept)) = (self.get(owner), self.get(target)) else {
            return Ok(());
        };
        let Some(field_def) = self.registry.field(owner_concept.type_id, field) else {
            return Err(DefinitionError::unknown_field(
                self.registry.type_name(owner_concept.type_id),
                field,
            ));
        };

        let (accepted, expected) = match &field_def.kind {
            FieldKind::Reference(type_name) => (
                self.registry
                    .get_type_id(type_name)
                    .is_some_and(|t| self.registry.is_subtype(target_concept.type_id, t)),
                type_name.clone(),
            ),
            FieldKind::Capability(capability) => (
                self.registry.satisfies(target_concept.type_id, capability),
                format!("a concept satisfying {}", capability),
            ),
            FieldKind::Value => (false, "a value".to_string()),
        };

        if accepted {
            Ok(())
        } else {
            Err(DefinitionError::ReferenceTypeMismatch {
                concept: self.describe(owner),
                field: field.to_string(),
                expected,
                actual: self.registry.type_name(target_concept.type_id),
            })
        }
    }

    /// Initializers may set fields after construction, so the store checks
    /// again before a concept gets a key.
    fn check_fields(&self, concept: &Concept) -> DefinitionResult<()> {
        if self.registry.get_type(concept.type_id).is_none() {
            return Err(DefinitionError::unknown_type(concept.type_id.to_string()));
        }
        for (name, value) in &concept.fields {
            self.registry.check_field(concept.type_id, name, value)?;
        }
        Ok(())
    }

    fn fields_equal(&self, type_id: TypeId, a: &Concept, b: &Concept) -> bool {
        self.registry
            .fields(type_id)
            .iter()
            .all(|field| self.comparable(a.get(&field.name)) == self.comparable(b.get(&field.name)))
    }

    fn comparable(&self, value: &Value) -> Comparable {
        match value {
            Value::Ref(reference) => match self.identity().reference_key(reference) {
                Ok(key) => Comparable::Key(key),
                Err(_) => Comparable::Value(value.clone()),
            },
            other => Comparable::Value(other.clone()),
        }
    }
}
