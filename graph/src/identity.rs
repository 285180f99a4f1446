//! Concept identity: canonical keys, descriptions and dependency sets.
//!
//! A key is the name of the key type (the topmost type of the refinement
//! chain that declares key fields) followed by the key field values joined
//! with `.`. A reference key field contributes the referenced concept's own
//! key values; a polymorphic (capability) reference additionally prefixes
//! them with the referenced key type name and `:`.

use concord_core::{
    Concept, ConceptId, DefinitionError, DefinitionResult, Reference, Stub, TypeId, Value,
};
use concord_registry::{FieldDef, Registry};
use std::collections::{BTreeSet, HashSet};

/// Render a primitive key value, quoting it when it is not a plain word.
///
/// Single quotes are preferred; a value that contains only single quotes is
/// enclosed in double quotes, and a value containing both doubles the
/// enclosed single quotes.
pub fn quote_key_value(text: &str) -> String {
    let plain = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if plain {
        return text.to_string();
    }

    match (text.contains('\''), text.contains('"')) {
        (true, false) => format!("\"{}\"", text),
        (true, true) => format!("'{}'", text.replace('\'', "''")),
        _ => format!("'{}'", text),
    }
}

/// Identity rules evaluated against a registry and the concept arena.
#[derive(Clone, Copy)]
pub struct Identity<'a> {
    registry: &'a Registry,
    concepts: &'a [Concept],
}

impl<'a> Identity<'a> {
    pub fn new(registry: &'a Registry, concepts: &'a [Concept]) -> Self {
        Self { registry, concepts }
    }

    fn concept(&self, id: ConceptId) -> DefinitionResult<&'a Concept> {
        self.concepts
            .get(id.index())
            .ok_or_else(|| DefinitionError::unknown_type(format!("<dangling reference {}>", id)))
    }

    // ==================== Keys ====================

    /// Compute the canonical key of a concept.
    pub fn key(&self, concept: &Concept) -> DefinitionResult<String> {
        let parts = self.concept_key_parts(concept)?;
        Ok(self.assemble(concept.type_id, &parts))
    }

    /// Compute the key a stub refers to.
    pub fn stub_key(&self, stub: &Stub) -> DefinitionResult<String> {
        let type_id = self.registry.type_id(&stub.type_name)?;
        let parts = self.stub_key_parts(type_id, stub)?;
        Ok(self.assemble(type_id, &parts))
    }

    /// Compute the key a reference points at, stub or canonical.
    pub fn reference_key(&self, reference: &Reference) -> DefinitionResult<String> {
        match reference {
            Reference::Canonical(id) => self.key(self.concept(*id)?),
            Reference::Stub(stub) => self.stub_key(stub),
        }
    }

    fn assemble(&self, type_id: TypeId, parts: &[String]) -> String {
        let key_type = self.registry.type_name(self.registry.key_type(type_id));
        if parts.is_empty() {
            key_type
        } else {
            format!("{} {}", key_type, parts.join("."))
        }
    }

    fn concept_key_parts(&self, concept: &Concept) -> DefinitionResult<Vec<String>> {
        let type_name = self.registry.type_name(concept.type_id);
        self.registry
            .key_fields(concept.type_id)
            .iter()
            .map(|field| self.key_value(&type_name, field, concept.get(&field.name)))
            .collect()
    }

    fn stub_key_parts(&self, type_id: TypeId, stub: &Stub) -> DefinitionResult<Vec<String>> {
        let fields = self.registry.key_fields(type_id);
        if stub.key.len() > fields.len() {
            return Err(DefinitionError::unknown_field(
                &stub.type_name,
                format!("<key value #{}>", fields.len() + 1),
            ));
        }
        fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let value = stub.key.get(i).unwrap_or(&Value::Null);
                self.key_value(&stub.type_name, field, value)
            })
            .collect()
    }

    fn key_value(&self, owner: &str, field: &FieldDef, value: &Value) -> DefinitionResult<String> {
        match value {
            Value::Null => Err(DefinitionError::missing_key_value(owner, &field.name)),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(quote_key_value(&i.to_string())),
            Value::String(s) => Ok(quote_key_value(s)),
            Value::Ref(reference) => self.reference_segment(reference, field.kind.is_capability()),
        }
    }

    /// Key values of a referenced concept joined with `.`, type-prefixed for
    /// polymorphic references.
    fn reference_segment(&self, reference: &Reference, polymorphic: bool) -> DefinitionResult<String> {
        let (type_id, parts) = match reference {
            Reference::Canonical(id) => {
                let target = self.concept(*id)?;
                (target.type_id, self.concept_key_parts(target)?)
            }
            Reference::Stub(stub) => {
                let type_id = self.registry.type_id(&stub.type_name)?;
                (type_id, self.stub_key_parts(type_id, stub)?)
            }
        };

        let joined = parts.join(".");
        if polymorphic {
            let key_type = self.registry.type_name(self.registry.key_type(type_id));
            Ok(format!("{}:{}", key_type, joined))
        } else {
            Ok(joined)
        }
    }

    // ==================== Descriptions ====================

    /// Type name and every field as `name=value`. Never fails: unset fields
    /// render as `<null>` and unrenderable references fall back to their raw form.
    pub fn describe(&self, concept: &Concept) -> String {
        let mut out = self.registry.type_name(concept.type_id);
        let declared = self.registry.fields(concept.type_id);

        for field in declared {
            out.push_str(&format!(
                " {}={}",
                field.name,
                self.describe_value(concept.get(&field.name))
            ));
        }
        for (name, value) in &concept.fields {
            if !declared.iter().any(|f| &f.name == name) {
                out.push_str(&format!(" {}={}", name, self.describe_value(value)));
            }
        }
        out
    }

    fn describe_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "<null>".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::String(s) => quote_key_value(s),
            Value::Ref(reference) => self
                .reference_segment(reference, true)
                .unwrap_or_else(|_| value.to_string()),
        }
    }

    /// Keyword (or type name) followed by the key values, for compact log lines.
    pub fn describe_short(&self, concept: &Concept) -> String {
        let keyword = self
            .registry
            .get_type(concept.type_id)
            .map(|t| t.keyword_or_name().to_string())
            .unwrap_or_else(|| concept.type_id.to_string());
        match self.concept_key_parts(concept) {
            Ok(parts) if parts.is_empty() => keyword,
            Ok(parts) => format!("{} {}", keyword, parts.join(".")),
            Err(_) => self.describe(concept),
        }
    }

    // ==================== Dependencies ====================

    /// Canonical concepts directly referenced by a concept's fields.
    pub fn direct_dependencies(&self, concept: &Concept) -> BTreeSet<ConceptId> {
        concept.canonical_references().collect()
    }

    /// Transitive closure of direct dependencies, ordered by key.
    pub fn all_dependencies(&self, concept: &Concept) -> Vec<ConceptId> {
        let mut seen = HashSet::new();
        let mut stack: Vec<ConceptId> = concept.canonical_references().collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(next) = self.concepts.get(id.index()) {
                stack.extend(next.canonical_references());
            }
        }

        let mut ordered: Vec<(String, ConceptId)> = seen
            .into_iter()
            .map(|id| (self.key_or_handle(id), id))
            .collect();
        ordered.sort();
        ordered.into_iter().map(|(_, id)| id).collect()
    }

    /// Key of a stored concept, or its handle when the key cannot be computed.
    pub fn key_or_handle(&self, id: ConceptId) -> String {
        self.concept(id)
            .and_then(|c| self.key(c))
            .unwrap_or_else(|_| id.to_string())
    }
}
