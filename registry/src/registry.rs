//! The Registry - immutable concept type lookup.

use crate::{ConceptTypeDef, FieldDef, FieldKind, SubtypeIndex};
use concord_core::{Concept, DefinitionError, DefinitionResult, Fields, TypeId, Value};
use std::collections::{BTreeSet, HashMap};

/// The Registry provides lookup of concept type definitions.
/// It is immutable after construction.
#[derive(Debug, Default)]
pub struct Registry {
    /// Concept type definitions by ID.
    types: HashMap<TypeId, ConceptTypeDef>,
    /// Concept type ID lookup by name.
    type_names: HashMap<String, TypeId>,
    /// Precomputed subtype relationships.
    subtype_index: SubtypeIndex,
    /// Topmost type of each refinement chain that defines the key.
    key_types: HashMap<TypeId, TypeId>,
    /// All fields of each type, inherited ones included (key fields first).
    all_fields: HashMap<TypeId, Vec<FieldDef>>,
    /// Capabilities satisfied by each type, inherited ones included.
    capabilities: HashMap<TypeId, BTreeSet<String>>,
}

impl Registry {
    pub(crate) fn new(types: HashMap<TypeId, ConceptTypeDef>, type_names: HashMap<String, TypeId>) -> Self {
        let subtype_index = SubtypeIndex::build(&types);

        let mut key_types = HashMap::new();
        let mut all_fields = HashMap::new();
        let mut capabilities = HashMap::new();

        for &type_id in types.keys() {
            let chain = base_chain(&types, type_id);

            // The key is defined by the topmost type in the chain that declares
            // key fields; a chain without any key fields is keyed by its root.
            let key_type = chain
                .iter()
                .rev()
                .copied()
                .find(|id| types.get(id).is_some_and(|t| !t.key_fields.is_empty()))
                .or_else(|| chain.last().copied())
                .unwrap_or(type_id);
            key_types.insert(type_id, key_type);

            let mut fields = Vec::new();
            let mut caps = BTreeSet::new();
            for id in chain.iter().rev() {
                if let Some(def) = types.get(id) {
                    fields.extend(def.key_fields.iter().cloned());
                    caps.extend(def.capabilities.iter().cloned());
                }
            }
            for id in chain.iter().rev() {
                if let Some(def) = types.get(id) {
                    fields.extend(def.fields.iter().cloned());
                }
            }
            all_fields.insert(type_id, fields);
            capabilities.insert(type_id, caps);
        }

        Self {
            types,
            type_names,
            subtype_index,
            key_types,
            all_fields,
            capabilities,
        }
    }

    // ==================== Type Lookups ====================

    /// Get a type definition by name.
    pub fn get_type_by_name(&self, name: &str) -> Option<&ConceptTypeDef> {
        self.type_names.get(name).and_then(|id| self.types.get(id))
    }

    /// Get a type definition by ID.
    pub fn get_type(&self, id: TypeId) -> Option<&ConceptTypeDef> {
        self.types.get(&id)
    }

    /// Get a type ID by name.
    pub fn get_type_id(&self, name: &str) -> Option<TypeId> {
        self.type_names.get(name).copied()
    }

    /// Get a type ID by name, failing for unknown names.
    pub fn type_id(&self, name: &str) -> DefinitionResult<TypeId> {
        self.get_type_id(name)
            .ok_or_else(|| DefinitionError::unknown_type(name))
    }

    /// Name of a type. Unknown IDs render as their raw handle.
    pub fn type_name(&self, id: TypeId) -> String {
        self.types
            .get(&id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Get the number of types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // ==================== Fields ====================

    /// The type whose name prefixes keys of `type_id` concepts.
    pub fn key_type(&self, type_id: TypeId) -> TypeId {
        self.key_types.get(&type_id).copied().unwrap_or(type_id)
    }

    /// Key fields of a type, in declaration order (inherited from the key type).
    pub fn key_fields(&self, type_id: TypeId) -> &[FieldDef] {
        let key_type = self.key_type(type_id);
        self.types
            .get(&key_type)
            .map(|t| t.key_fields.as_slice())
            .unwrap_or(&[])
    }

    /// All fields of a type including inherited ones, key fields first.
    pub fn fields(&self, type_id: TypeId) -> &[FieldDef] {
        self.all_fields
            .get(&type_id)
            .map(|f| f.as_slice())
            .unwrap_or(&[])
    }

    /// Get a field definition from a type, including inherited fields.
    pub fn field(&self, type_id: TypeId, name: &str) -> Option<&FieldDef> {
        self.fields(type_id).iter().find(|f| f.name == name)
    }

    // ==================== Subtype Queries ====================

    /// Check if `sub` is a subtype (refinement) of `super_type`.
    pub fn is_subtype(&self, sub: TypeId, super_type: TypeId) -> bool {
        self.subtype_index.is_subtype(sub, super_type)
    }

    /// Check if two types are in a base/derived relationship, in either direction.
    pub fn are_related(&self, a: TypeId, b: TypeId) -> bool {
        self.is_subtype(a, b) || self.is_subtype(b, a)
    }

    /// Get all subtypes of a type (not including the type itself).
    pub fn get_subtypes(&self, type_id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        self.subtype_index.get_subtypes(type_id)
    }

    /// Get all supertypes of a type (not including the type itself).
    pub fn get_supertypes(&self, type_id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        self.subtype_index.get_supertypes(type_id)
    }

    /// Check if a type satisfies a capability, directly or through its base.
    pub fn satisfies(&self, type_id: TypeId, capability: &str) -> bool {
        self.capabilities
            .get(&type_id)
            .is_some_and(|caps| caps.contains(capability))
    }

    // ==================== Construction ====================

    /// Check that a type declares the field and that the value fits its
    /// kind: references in reference fields, primitives in value fields.
    /// `Null` fits any field.
    pub fn check_field(&self, type_id: TypeId, name: &str, value: &Value) -> DefinitionResult<()> {
        let Some(field) = self.field(type_id, name) else {
            return Err(DefinitionError::unknown_field(self.type_name(type_id), name));
        };

        let fits = match (&field.kind, value) {
            (_, Value::Null) => true,
            (FieldKind::Value, value) => !value.is_ref(),
            (FieldKind::Reference(_) | FieldKind::Capability(_), value) => value.is_ref(),
        };
        if fits {
            return Ok(());
        }

        let expected = match &field.kind {
            FieldKind::Value => "a value".to_string(),
            FieldKind::Reference(target) => format!("a reference to {}", target),
            FieldKind::Capability(capability) => format!("a reference to a concept satisfying {}", capability),
        };
        Err(DefinitionError::FieldKindMismatch {
            type_name: self.type_name(type_id),
            field: name.to_string(),
            expected,
            actual: format!("{} {}", value.type_name(), value),
        })
    }

    /// Create a concept of the named type, checking every field.
    pub fn concept(&self, type_name: &str, fields: Fields) -> DefinitionResult<Concept> {
        let type_id = self.type_id(type_name)?;
        for (name, value) in &fields {
            self.check_field(type_id, name, value)?;
        }
        Ok(Concept::new(type_id, fields))
    }
}

/// The refinement chain of a type: the type itself first, its root last.
fn base_chain(types: &HashMap<TypeId, ConceptTypeDef>, type_id: TypeId) -> Vec<TypeId> {
    let mut chain = vec![type_id];
    let mut current = types.get(&type_id).and_then(|t| t.base_id);
    while let Some(base_id) = current {
        if chain.contains(&base_id) {
            break;
        }
        chain.push(base_id);
        current = types.get(&base_id).and_then(|t| t.base_id);
    }
    chain
}
