//! RegistryBuilder for constructing an immutable Registry.

use crate::{ConceptTypeDef, FieldDef, FieldKind, Registry};
use concord_core::{DefinitionError, TypeId};
use regex_lite::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn identifier() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

fn check_name(name: &str) -> Result<(), DefinitionError> {
    if identifier().is_match(name) {
        Ok(())
    } else {
        Err(DefinitionError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Builder for constructing an immutable Registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    /// Next type ID to allocate.
    next_type_id: u32,
    /// Types being built.
    types: HashMap<TypeId, ConceptTypeDef>,
    /// Type name to ID mapping.
    type_names: HashMap<String, TypeId>,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a concept type definition.
    pub fn add_type(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        let name = name.into();
        let id = TypeId::new(self.next_type_id);
        self.next_type_id += 1;

        TypeBuilder {
            builder: self,
            id,
            name,
            keyword: None,
            base_name: None,
            key_fields: Vec::new(),
            fields: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    /// Build the immutable Registry.
    ///
    /// Reference targets may name types declared later, so they are only
    /// checked here.
    pub fn build(self) -> Result<Registry, DefinitionError> {
        let mut type_ids: Vec<&TypeId> = self.types.keys().collect();
        type_ids.sort();

        for id in type_ids {
            let type_def = &self.types[id];
            for field in type_def.own_fields() {
                if let FieldKind::Reference(target) = &field.kind {
                    if !self.type_names.contains_key(target) {
                        return Err(DefinitionError::UnknownReferenceTarget {
                            type_name: type_def.name.clone(),
                            field: field.name.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }

        Ok(Registry::new(self.types, self.type_names))
    }
}

/// Builder for a concept type definition.
pub struct TypeBuilder<'a> {
    builder: &'a mut RegistryBuilder,
    id: TypeId,
    name: String,
    keyword: Option<String>,
    base_name: Option<String>,
    key_fields: Vec<FieldDef>,
    fields: Vec<FieldDef>,
    capabilities: Vec<String>,
}

impl<'a> TypeBuilder<'a> {
    /// Set the DSL keyword.
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Refine a base type by name. The base must already be declared.
    pub fn extends(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = Some(base_name.into());
        self
    }

    /// Add a primitive key field.
    pub fn key_value(mut self, name: impl Into<String>) -> Self {
        self.key_fields.push(FieldDef::new(name, FieldKind::Value).key());
        self
    }

    /// Add a key field referencing a concrete concept type.
    pub fn key_reference(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.key_fields
            .push(FieldDef::new(name, FieldKind::Reference(target.into())).key());
        self
    }

    /// Add a key field referencing any concept that satisfies a capability.
    pub fn key_capability(mut self, name: impl Into<String>, capability: impl Into<String>) -> Self {
        self.key_fields
            .push(FieldDef::new(name, FieldKind::Capability(capability.into())).key());
        self
    }

    /// Add a primitive non-key field.
    pub fn value(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDef::new(name, FieldKind::Value));
        self
    }

    /// Add a non-key field referencing a concrete concept type.
    pub fn reference(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.fields
            .push(FieldDef::new(name, FieldKind::Reference(target.into())));
        self
    }

    /// Add a non-key field referencing any concept that satisfies a capability.
    pub fn capability_reference(
        mut self,
        name: impl Into<String>,
        capability: impl Into<String>,
    ) -> Self {
        self.fields
            .push(FieldDef::new(name, FieldKind::Capability(capability.into())));
        self
    }

    /// Declare that this type satisfies a capability.
    pub fn satisfies(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Finish building this type.
    pub fn done(self) -> Result<TypeId, DefinitionError> {
        check_name(&self.name)?;
        for field in self.key_fields.iter().chain(self.fields.iter()) {
            check_name(&field.name)?;
        }

        // Check for duplicate name
        if self.builder.type_names.contains_key(&self.name) {
            return Err(DefinitionError::DuplicateType { name: self.name });
        }

        // Resolve the base type
        let base_id = match &self.base_name {
            Some(base_name) => match self.builder.type_names.get(base_name) {
                Some(&base_id) => Some(base_id),
                None => {
                    return Err(DefinitionError::UnknownBaseType {
                        type_name: self.name,
                        base: base_name.clone(),
                    })
                }
            },
            None => None,
        };

        // A refinement shares the identity of its base
        if base_id.is_some() {
            if let Some(field) = self.key_fields.first() {
                return Err(DefinitionError::RefinementAddsKeyField {
                    type_name: self.name,
                    field: field.name.clone(),
                });
            }
        }

        let type_def = ConceptTypeDef {
            id: self.id,
            name: self.name.clone(),
            keyword: self.keyword,
            base_id,
            key_fields: self.key_fields,
            fields: self.fields,
            capabilities: self.capabilities,
        };

        self.builder.type_names.insert(self.name, self.id);
        self.builder.types.insert(self.id, type_def);

        Ok(self.id)
    }
}
