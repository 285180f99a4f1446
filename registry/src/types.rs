//! Schema definition types.

use concord_core::TypeId;
use std::collections::{HashMap, HashSet};

/// What a field holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A primitive value (string, integer or boolean).
    Value,
    /// A reference to a concept of the named type or any of its refinements.
    Reference(String),
    /// A polymorphic reference to any concept satisfying the named capability.
    Capability(String),
}

impl FieldKind {
    /// Returns true for reference and capability fields.
    pub fn is_reference(&self) -> bool {
        !matches!(self, FieldKind::Value)
    }

    /// Returns true for capability (polymorphic) fields.
    pub fn is_capability(&self) -> bool {
        matches!(self, FieldKind::Capability(_))
    }
}

/// Field definition within a concept type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Value or reference kind.
    pub kind: FieldKind,
    /// Whether this field is part of the concept key.
    pub is_key: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_key: false,
        }
    }

    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }
}

/// Concept type definition.
#[derive(Debug, Clone)]
pub struct ConceptTypeDef {
    /// Unique identifier.
    pub id: TypeId,
    /// Type name, used in keys and diagnostics.
    pub name: String,
    /// DSL keyword, if the type has a syntax of its own.
    pub keyword: Option<String>,
    /// Base type this type refines.
    pub base_id: Option<TypeId>,
    /// Key fields declared by this type, in declaration order.
    pub key_fields: Vec<FieldDef>,
    /// Non-key fields declared by this type, in declaration order.
    pub fields: Vec<FieldDef>,
    /// Capabilities this type declares it satisfies.
    pub capabilities: Vec<String>,
}

impl ConceptTypeDef {
    pub fn new(id: TypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            keyword: None,
            base_id: None,
            key_fields: Vec::new(),
            fields: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    /// Keyword if declared, type name otherwise.
    pub fn keyword_or_name(&self) -> &str {
        self.keyword.as_deref().unwrap_or(&self.name)
    }

    /// Fields declared on this type itself (key fields first).
    pub fn own_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.key_fields.iter().chain(self.fields.iter())
    }
}

/// Precomputed subtype relationships.
#[derive(Debug, Default)]
pub struct SubtypeIndex {
    /// For each type, the set of all its subtypes (transitive).
    subtypes: HashMap<TypeId, HashSet<TypeId>>,
    /// For each type, the set of all its supertypes (transitive).
    supertypes: HashMap<TypeId, HashSet<TypeId>>,
}

impl SubtypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the subtype index from type definitions.
    pub fn build(types: &HashMap<TypeId, ConceptTypeDef>) -> Self {
        let mut index = Self::new();

        for &type_id in types.keys() {
            index.subtypes.insert(type_id, HashSet::new());
            index.supertypes.insert(type_id, HashSet::new());
        }

        // Walk each refinement chain up to its root
        for (&type_id, type_def) in types {
            let mut current = type_def.base_id;
            while let Some(base_id) = current {
                if let Some(set) = index.subtypes.get_mut(&base_id) {
                    set.insert(type_id);
                }
                if let Some(set) = index.supertypes.get_mut(&type_id) {
                    set.insert(base_id);
                }
                current = types.get(&base_id).and_then(|t| t.base_id);
            }
        }

        index
    }

    /// Check if `sub` is a subtype of `super_type`.
    pub fn is_subtype(&self, sub: TypeId, super_type: TypeId) -> bool {
        if sub == super_type {
            return true;
        }
        self.supertypes
            .get(&sub)
            .map(|set| set.contains(&super_type))
            .unwrap_or(false)
    }

    /// Get all subtypes of a type (not including the type itself).
    pub fn get_subtypes(&self, type_id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        self.subtypes
            .get(&type_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get all supertypes of a type (not including the type itself).
    pub fn get_supertypes(&self, type_id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        self.supertypes
            .get(&type_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}
