//! Capabilities a concept type can carry, and their registration.
//!
//! Capabilities are registered per concept type name and checked against the
//! registry once, before a build starts. A refinement inherits the
//! capabilities of its base types; the most derived registration wins.

use concord_core::{
    CapabilityError, Concept, ConceptId, DefinitionError, DefinitionResult, SemanticValidationError,
    TypeId,
};
use concord_graph::{ConceptStore, Dependency};
use concord_registry::Registry;
use std::collections::BTreeMap;
use std::fmt;

/// What a macro produced in one invocation.
#[derive(Debug, Clone, Default)]
pub struct MacroOutput {
    pub concepts: Vec<Concept>,
    pub dependencies: Vec<Dependency>,
}

impl MacroOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concept(mut self, concept: Concept) -> Self {
        self.concepts.push(concept);
        self
    }

    /// Declare that `dependency` must come before `dependent`.
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

impl From<Vec<Concept>> for MacroOutput {
    fn from(concepts: Vec<Concept>) -> Self {
        Self {
            concepts,
            dependencies: Vec::new(),
        }
    }
}

/// A concept that generates further concepts from the current model.
///
/// Invoked again whenever the model changed since its last invocation, so
/// it must be idempotent: regenerating the same keys is expected and
/// ignored by the store.
pub trait MacroExpander {
    fn create_new_concepts(
        &self,
        concept: ConceptId,
        store: &ConceptStore<'_>,
    ) -> Result<MacroOutput, CapabilityError>;
}

/// A macro with no owning concept. Runs at least once, even on an empty
/// model.
pub trait GlobalMacro {
    /// Name used in statistics and diagnostics.
    fn name(&self) -> &str;

    fn create_new_concepts(&self, store: &ConceptStore<'_>) -> Result<MacroOutput, CapabilityError>;
}

/// A domain-specific check run against the closed model.
pub trait SemanticCheck {
    fn check_semantics(
        &self,
        concept: ConceptId,
        store: &ConceptStore<'_>,
    ) -> Result<(), SemanticValidationError>;
}

/// Computes field values a parser cannot read from source text.
pub trait ConceptInitializer {
    /// Fields this initializer populates.
    fn computed_fields(&self) -> &[&str];

    /// Fill the computed fields. May return extra concepts to merge into the
    /// model before references are resolved.
    fn initialize(
        &self,
        concept: &mut Concept,
        registry: &Registry,
    ) -> Result<Vec<Concept>, CapabilityError>;
}

/// Capability registrations, keyed by concept type name.
#[derive(Default)]
pub struct CapabilityTable {
    macros: BTreeMap<String, Box<dyn MacroExpander>>,
    checks: BTreeMap<String, Box<dyn SemanticCheck>>,
    initializers: BTreeMap<String, Box<dyn ConceptInitializer>>,
    globals: Vec<Box<dyn GlobalMacro>>,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_macro(
        &mut self,
        type_name: impl Into<String>,
        expander: impl MacroExpander + 'static,
    ) -> &mut Self {
        self.macros.insert(type_name.into(), Box::new(expander));
        self
    }

    pub fn register_check(
        &mut self,
        type_name: impl Into<String>,
        check: impl SemanticCheck + 'static,
    ) -> &mut Self {
        self.checks.insert(type_name.into(), Box::new(check));
        self
    }

    pub fn register_initializer(
        &mut self,
        type_name: impl Into<String>,
        initializer: impl ConceptInitializer + 'static,
    ) -> &mut Self {
        self.initializers
            .insert(type_name.into(), Box::new(initializer));
        self
    }

    pub fn register_global(&mut self, global: impl GlobalMacro + 'static) -> &mut Self {
        self.globals.push(Box::new(global));
        self
    }

    /// Check that every registration names a known concept type.
    pub fn validate(&self, registry: &Registry) -> DefinitionResult<()> {
        let registrations = self
            .macros
            .keys()
            .map(|t| ("macro", t))
            .chain(self.checks.keys().map(|t| ("semantic check", t)))
            .chain(self.initializers.keys().map(|t| ("initializer", t)));

        for (capability, type_name) in registrations {
            if registry.get_type_id(type_name).is_none() {
                return Err(DefinitionError::UnknownCapabilityTarget {
                    capability: capability.to_string(),
                    type_name: type_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Walk the refinement chain from `type_id` up, returning the first
    /// registration found.
    fn lookup<'a, T: ?Sized>(
        registry: &Registry,
        table: &'a BTreeMap<String, Box<T>>,
        type_id: TypeId,
    ) -> Option<&'a T> {
        let mut current = registry.get_type(type_id);
        while let Some(def) = current {
            if let Some(found) = table.get(&def.name) {
                return Some(&**found);
            }
            current = def.base_id.and_then(|base| registry.get_type(base));
        }
        None
    }

    pub fn macro_for(&self, registry: &Registry, type_id: TypeId) -> Option<&dyn MacroExpander> {
        Self::lookup(registry, &self.macros, type_id)
    }

    pub fn check_for(&self, registry: &Registry, type_id: TypeId) -> Option<&dyn SemanticCheck> {
        Self::lookup(registry, &self.checks, type_id)
    }

    pub fn initializer_for(
        &self,
        registry: &Registry,
        type_id: TypeId,
    ) -> Option<&dyn ConceptInitializer> {
        Self::lookup(registry, &self.initializers, type_id)
    }

    /// Fields of a type that are computed rather than parsed.
    pub fn computed_fields(&self, registry: &Registry, type_id: TypeId) -> Vec<String> {
        self.initializer_for(registry, type_id)
            .map(|i| i.computed_fields().iter().map(|f| f.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn globals(&self) -> &[Box<dyn GlobalMacro>] {
        &self.globals
    }
}

impl fmt::Debug for CapabilityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityTable")
            .field("macros", &self.macros.keys().collect::<Vec<_>>())
            .field("checks", &self.checks.keys().collect::<Vec<_>>())
            .field("initializers", &self.initializers.keys().collect::<Vec<_>>())
            .field("globals", &self.globals.iter().map(|g| g.name()).collect::<Vec<_>>())
            .finish()
    }
}
