//! Reference resolution: stub references replaced in place by canonical handles.
//!
//! Unresolved references are collected rather than reported immediately,
//! since macro expansion may still add the missing concept. They become an
//! error only when [`ReferenceResolver::finalize_or_fail`] is called.

use crate::store::ConceptStore;
use concord_core::{
    ConceptId, DefinitionError, DefinitionResult, MissingReference, Stub,
    UnresolvedReferenceError,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use thiserror::Error;

/// A reference that could not be matched to any stored concept (yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Concept holding the stub. `None` for a declared dependency whose both
    /// ends are missing.
    pub concept: Option<ConceptId>,
    /// Field holding the stub.
    pub field: String,
    /// Key that was looked up.
    pub missing_key: String,
}

/// Outcome of one resolution call.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Concepts whose references were examined by this call.
    pub visited: Vec<ConceptId>,
    /// References that are still stubs.
    pub unresolved: Vec<UnresolvedReference>,
}

/// Resolve the stub references of a concept against the store.
///
/// Every stub whose key is known is replaced by the canonical handle. The
/// freshly referenced concept is then resolved as well if it still holds
/// stubs; concepts already visited in this call are not revisited.
pub fn resolve_references(store: &mut ConceptStore<'_>, id: ConceptId) -> DefinitionResult<Resolution> {
    let mut resolution = Resolution::default();
    let mut visited = HashSet::new();
    let mut worklist = vec![id];

    while let Some(current) = worklist.pop() {
        if !visited.insert(current) {
            continue;
        }
        resolution.visited.push(current);

        let stubs: Vec<(String, Stub)> = match store.get(current) {
            Some(concept) => concept
                .stubs()
                .map(|(field, stub)| (field.to_string(), stub.clone()))
                .collect(),
            None => continue,
        };

        for (field, stub) in stubs {
            let key = store.identity().stub_key(&stub)?;
            match store.try_get(&key) {
                Some(target) => {
                    store.check_reference_type(current, &field, target)?;
                    store.set_reference(current, &field, target);
                    if store.get(target).is_some_and(|c| c.has_stubs()) {
                        worklist.push(target);
                    }
                }
                None => {
                    tracing::trace!(concept = %current, %field, missing = %key, "reference not resolved yet");
                    resolution.unresolved.push(UnresolvedReference {
                        concept: Some(current),
                        field,
                        missing_key: key,
                    });
                }
            }
        }
    }

    Ok(resolution)
}

/// Tracks unresolved references across the whole build.
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    pending: BTreeMap<ConceptId, Vec<UnresolvedReference>>,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a concept and record what is still missing.
    pub fn resolve(&mut self, store: &mut ConceptStore<'_>, id: ConceptId) -> DefinitionResult<usize> {
        let resolution = resolve_references(store, id)?;
        for visited in &resolution.visited {
            self.pending.remove(visited);
        }
        let remaining = resolution.unresolved.len();
        for record in resolution.unresolved {
            if let Some(concept) = record.concept {
                self.pending.entry(concept).or_default().push(record);
            }
        }
        Ok(remaining)
    }

    /// Retry every concept that still holds stubs. Returns how many
    /// references remain unresolved.
    pub fn retry_pending(&mut self, store: &mut ConceptStore<'_>) -> DefinitionResult<usize> {
        let ids: Vec<ConceptId> = self.pending.keys().copied().collect();
        for id in ids {
            if self.pending.contains_key(&id) {
                self.resolve(store, id)?;
            }
        }
        Ok(self.pending_count())
    }

    /// Number of references currently unresolved.
    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Currently unresolved references.
    pub fn records(&self) -> impl Iterator<Item = &UnresolvedReference> {
        self.pending.values().flatten()
    }

    /// Retry once more, then fail with every reference still missing.
    ///
    /// `extra` carries unresolved records from other sources, such as
    /// declared dependencies. `declared` holds the declared `(dependency,
    /// dependent)` edges between canonical concepts; dependents reached
    /// through them are reported alongside those reached by reference.
    pub fn finalize_or_fail(
        &mut self,
        store: &mut ConceptStore<'_>,
        extra: &[UnresolvedReference],
        declared: &BTreeSet<(ConceptId, ConceptId)>,
    ) -> Result<(), FinalizeError> {
        self.retry_pending(store)?;

        let records: Vec<&UnresolvedReference> = self
            .records()
            .chain(extra.iter())
            .filter(|r| store.try_get(&r.missing_key).is_none())
            .collect();
        if records.is_empty() {
            return Ok(());
        }

        let dependents_of = reverse_dependencies(store, declared);
        let mut by_key: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for record in records {
            let entry = by_key.entry(record.missing_key.clone()).or_default();
            if let Some(concept) = record.concept {
                for id in transitive_dependents(&dependents_of, concept) {
                    entry.insert(store.describe(id));
                }
            }
        }

        let missing = by_key
            .into_iter()
            .map(|(key, dependents)| MissingReference {
                key,
                dependents: dependents.into_iter().collect(),
            })
            .collect();
        Err(FinalizeError::Unresolved(UnresolvedReferenceError::new(missing)))
    }
}

/// Failure of [`ReferenceResolver::finalize_or_fail`].
#[derive(Debug, Error)]
pub enum FinalizeError {
    /// A retry hit a definition problem, such as a reference type mismatch.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    /// References that never resolved.
    #[error(transparent)]
    Unresolved(#[from] UnresolvedReferenceError),
}

/// For each concept, the concepts that reference it or declare it as a
/// dependency.
fn reverse_dependencies(
    store: &ConceptStore<'_>,
    declared: &BTreeSet<(ConceptId, ConceptId)>,
) -> HashMap<ConceptId, Vec<ConceptId>> {
    let mut reverse: HashMap<ConceptId, Vec<ConceptId>> = HashMap::new();
    for (id, concept) in store.iter() {
        for target in concept.canonical_references() {
            reverse.entry(target).or_default().push(id);
        }
    }
    for (dependency, dependent) in declared {
        reverse.entry(*dependency).or_default().push(*dependent);
    }
    reverse
}

/// The concept itself plus everything that depends on it, directly or not.
fn transitive_dependents(
    reverse: &HashMap<ConceptId, Vec<ConceptId>>,
    start: ConceptId,
) -> BTreeSet<ConceptId> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([start]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(sources) = reverse.get(&id) {
            queue.extend(sources.iter().copied());
        }
    }
    seen
}
