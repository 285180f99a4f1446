//! The closed, ordered model handed to generators.

use concord_core::{Concept, ConceptId, Value};
use concord_expand::ExpansionStats;
use concord_graph::{ConceptStore, DependencyTracker};
use std::collections::BTreeSet;

/// A fully resolved model in processing order. Read-only.
#[derive(Debug)]
pub struct Model<'r> {
    store: ConceptStore<'r>,
    order: Vec<ConceptId>,
    tracker: DependencyTracker,
    stats: ExpansionStats,
}

impl<'r> Model<'r> {
    pub(crate) fn new(
        store: ConceptStore<'r>,
        order: Vec<ConceptId>,
        tracker: DependencyTracker,
        stats: ExpansionStats,
    ) -> Self {
        Self {
            store,
            order,
            tracker,
            stats,
        }
    }

    pub fn store(&self) -> &ConceptStore<'r> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Handle of the concept with this key.
    pub fn id(&self, key: &str) -> Option<ConceptId> {
        self.store.try_get(key)
    }

    /// Concept with this key.
    pub fn get(&self, key: &str) -> Option<&Concept> {
        self.id(key).and_then(|id| self.store.get(id))
    }

    pub fn concept(&self, id: ConceptId) -> Option<&Concept> {
        self.store.get(id)
    }

    pub fn key_of(&self, id: ConceptId) -> Option<&str> {
        self.store.key_of(id)
    }

    pub fn describe(&self, id: ConceptId) -> String {
        self.store.describe(id)
    }

    /// Concepts of a type, refinements included, in processing order.
    pub fn concepts_of_type(&self, type_name: &str) -> Vec<ConceptId> {
        let members: BTreeSet<ConceptId> = self.store.of_type_name(type_name).into_iter().collect();
        self.order
            .iter()
            .copied()
            .filter(|id| members.contains(id))
            .collect()
    }

    /// Concepts of a type whose `field` references `target`, in processing order.
    pub fn find_by_reference(&self, type_name: &str, field: &str, target: ConceptId) -> Vec<ConceptId> {
        self.concepts_of_type(type_name)
            .into_iter()
            .filter(|id| self.store.referenced(*id, field) == Some(target))
            .collect()
    }

    /// Value of a field, `Value::Null` when unset.
    pub fn field(&self, id: ConceptId, name: &str) -> &Value {
        self.store.field(id, name)
    }

    /// Handles in processing order: dependencies before dependents.
    pub fn order(&self) -> &[ConceptId] {
        &self.order
    }

    /// Concepts in processing order.
    pub fn ordered(&self) -> impl Iterator<Item = (ConceptId, &Concept)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.store.get(*id).map(|c| (*id, c)))
    }

    /// Direct dependencies of a concept, from references and declared edges.
    pub fn dependencies_of(&self, id: ConceptId) -> BTreeSet<ConceptId> {
        self.tracker.dependencies_of(&self.store, id)
    }

    /// Transitive dependencies through reference fields, ordered by key.
    pub fn all_dependencies_of(&self, id: ConceptId) -> Vec<ConceptId> {
        self.store
            .get(id)
            .map(|c| self.store.identity().all_dependencies(c))
            .unwrap_or_default()
    }

    pub fn stats(&self) -> &ExpansionStats {
        &self.stats
    }
}
