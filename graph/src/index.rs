//! Indexes for concept lookups.

use concord_core::{ConceptId, TypeId};
use std::collections::{BTreeSet, HashMap};

/// Type index: TypeId -> Set<ConceptId>
///
/// Sets are ordered so that lookups enumerate concepts in insertion order.
#[derive(Debug, Default)]
pub struct TypeIndex {
    index: HashMap<TypeId, BTreeSet<ConceptId>>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_id: TypeId, concept_id: ConceptId) {
        self.index.entry(type_id).or_default().insert(concept_id);
    }

    pub fn remove(&mut self, type_id: TypeId, concept_id: ConceptId) {
        if let Some(set) = self.index.get_mut(&type_id) {
            set.remove(&concept_id);
            if set.is_empty() {
                self.index.remove(&type_id);
            }
        }
    }

    pub fn get(&self, type_id: TypeId) -> impl Iterator<Item = ConceptId> + '_ {
        self.index
            .get(&type_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Move a concept from one type bucket to another.
    pub fn retype(&mut self, from: TypeId, to: TypeId, concept_id: ConceptId) {
        self.remove(from, concept_id);
        self.insert(to, concept_id);
    }
}
