//! Dependency tracking between concepts.
//!
//! An edge `(a, b)` means `a` must be present and processed before `b`.
//! Every canonical reference field contributes an intrinsic edge from the
//! referenced concept to the referencing one. Macros may declare further
//! edges; their ends may be stubs that only resolve later in the build.

use crate::resolver::UnresolvedReference;
use crate::store::ConceptStore;
use concord_core::{ConceptId, DefinitionResult, Reference};
use std::collections::BTreeSet;

/// A declared ordering constraint: `dependency` comes before `dependent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub dependency: Reference,
    pub dependent: Reference,
}

impl Dependency {
    pub fn new(dependency: impl Into<Reference>, dependent: impl Into<Reference>) -> Self {
        Self {
            dependency: dependency.into(),
            dependent: dependent.into(),
        }
    }
}

/// Records declared edges and derives the complete edge set.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    /// Declared edges whose ends are not both known yet.
    declared: Vec<Dependency>,
    /// Declared edges between canonical concepts.
    resolved: BTreeSet<(ConceptId, ConceptId)>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `dependency` must come before `dependent`.
    pub fn declare(&mut self, dependency: Dependency) {
        self.declared.push(dependency);
    }

    /// Declare an edge between canonical concepts.
    pub fn declare_resolved(&mut self, dependency: ConceptId, dependent: ConceptId) {
        if dependency != dependent {
            self.resolved.insert((dependency, dependent));
        }
    }

    /// Resolve declared edges against the store. Returns the ends that are
    /// still missing; those edges stay pending.
    pub fn resolve(&mut self, store: &ConceptStore<'_>) -> DefinitionResult<Vec<UnresolvedReference>> {
        let mut missing = Vec::new();
        let mut pending = Vec::new();

        for dependency in std::mem::take(&mut self.declared) {
            let before = lookup(store, &dependency.dependency)?;
            let after = lookup(store, &dependency.dependent)?;
            match (before, after) {
                (Ok(before), Ok(after)) => self.declare_resolved(before, after),
                (before, after) => {
                    if let Err(key) = &before {
                        missing.push(UnresolvedReference {
                            concept: after.as_ref().ok().copied(),
                            field: "<depends on>".to_string(),
                            missing_key: key.clone(),
                        });
                    }
                    if let Err(key) = &after {
                        missing.push(UnresolvedReference {
                            concept: before.as_ref().ok().copied(),
                            field: "<required by>".to_string(),
                            missing_key: key.clone(),
                        });
                    }
                    pending.push(dependency);
                }
            }
        }

        self.declared = pending;
        Ok(missing)
    }

    /// Declared edges whose ends are both canonical.
    pub fn declared_edges(&self) -> &BTreeSet<(ConceptId, ConceptId)> {
        &self.resolved
    }

    /// Intrinsic edges derived from canonical reference fields.
    pub fn intrinsic_edges(store: &ConceptStore<'_>) -> BTreeSet<(ConceptId, ConceptId)> {
        let identity = store.identity();
        store
            .iter()
            .flat_map(|(id, concept)| {
                identity
                    .direct_dependencies(concept)
                    .into_iter()
                    .filter(move |dep| *dep != id)
                    .map(move |dep| (dep, id))
            })
            .collect()
    }

    /// Intrinsic plus resolved declared edges.
    pub fn edges(&self, store: &ConceptStore<'_>) -> BTreeSet<(ConceptId, ConceptId)> {
        let mut edges = Self::intrinsic_edges(store);
        edges.extend(self.resolved.iter().copied());
        edges
    }

    /// Direct dependencies of a concept, intrinsic and declared.
    pub fn dependencies_of(&self, store: &ConceptStore<'_>, id: ConceptId) -> BTreeSet<ConceptId> {
        let mut deps = store
            .get(id)
            .map(|c| store.identity().direct_dependencies(c))
            .unwrap_or_default();
        deps.extend(
            self.resolved
                .iter()
                .filter(|(_, after)| *after == id)
                .map(|(before, _)| *before),
        );
        deps.remove(&id);
        deps
    }
}

/// Canonical handle for a reference, or the key that is missing.
fn lookup(store: &ConceptStore<'_>, reference: &Reference) -> DefinitionResult<Result<ConceptId, String>> {
    match reference {
        Reference::Canonical(id) => Ok(Ok(*id)),
        Reference::Stub(stub) => {
            let key = store.identity().stub_key(stub)?;
            Ok(store.try_get(&key).ok_or(key))
        }
    }
}
