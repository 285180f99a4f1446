//! Topological sequencing of a closed concept model.

use crate::scc::strongly_connected_components;
use concord_core::{ConceptId, DefinitionError, DefinitionResult};
use concord_graph::{ConceptStore, DependencyTracker};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Orders concepts so every dependency precedes its dependents.
///
/// Nodes are kept sorted by key and every adjacency list in ascending node
/// order, so the depth-first walk breaks ties by key and the output is
/// identical across runs on the same model.
pub struct Sequencer<'s, 'r> {
    store: &'s ConceptStore<'r>,
    /// Concepts sorted by key. Positions in this list are the graph nodes.
    nodes: Vec<ConceptId>,
    /// For each node, its dependencies.
    adjacency: Vec<Vec<usize>>,
}

impl<'s, 'r> Sequencer<'s, 'r> {
    /// Build the graph from `(dependency, dependent)` edges. Edges naming
    /// concepts outside the store are ignored, and so are self-edges: a
    /// concept referencing itself is not a cycle.
    pub fn new(
        store: &'s ConceptStore<'r>,
        edges: impl IntoIterator<Item = (ConceptId, ConceptId)>,
    ) -> Self {
        let mut nodes: Vec<ConceptId> = store.ids().collect();
        nodes.sort_by(|a, b| store.key_of(*a).cmp(&store.key_of(*b)));

        let position: HashMap<ConceptId, usize> =
            nodes.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (dependency, dependent) in edges {
            if dependency == dependent {
                continue;
            }
            if let (Some(&before), Some(&after)) = (position.get(&dependency), position.get(&dependent)) {
                adjacency[after].push(before);
            }
        }
        for dependencies in &mut adjacency {
            dependencies.sort_unstable();
            dependencies.dedup();
        }

        Self {
            store,
            nodes,
            adjacency,
        }
    }

    /// The processing order, or a cycle error naming the concepts of the
    /// shortest cycle found.
    pub fn order(&self) -> DefinitionResult<Vec<ConceptId>> {
        if let Some(positions) = self.topological_positions() {
            return Ok(positions.into_iter().map(|p| self.nodes[p]).collect());
        }

        let concepts: Vec<String> = self
            .minimal_cycle()
            .unwrap_or_default()
            .into_iter()
            .map(|id| self.store.describe(id))
            .collect();
        tracing::warn!(concepts = ?concepts, "dependency cycle detected");
        Err(DefinitionError::dependency_cycle(concepts))
    }

    /// Post-order depth-first walk. `None` when a back edge is met.
    fn topological_positions(&self) -> Option<Vec<usize>> {
        let n = self.nodes.len();
        let mut marks = vec![Mark::Unvisited; n];
        let mut order = Vec::with_capacity(n);

        for root in 0..n {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::Visiting;
            let mut calls: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = calls.last_mut() {
                let node = frame.0;
                if let Some(&dependency) = self.adjacency[node].get(frame.1) {
                    frame.1 += 1;
                    match marks[dependency] {
                        Mark::Unvisited => {
                            marks[dependency] = Mark::Visiting;
                            calls.push((dependency, 0));
                        }
                        Mark::Visiting => return None,
                        Mark::Done => {}
                    }
                    continue;
                }

                calls.pop();
                marks[node] = Mark::Done;
                order.push(node);
            }
        }

        Some(order)
    }

    /// Every strongly connected component that contains a cycle.
    pub fn cycles(&self) -> Vec<Vec<ConceptId>> {
        strongly_connected_components(&self.adjacency)
            .into_iter()
            .filter(|c| c.len() > 1)
            .map(|c| c.into_iter().map(|p| self.nodes[p]).collect())
            .collect()
    }

    /// Shortest cycle through the smallest-key concept of the first cyclic
    /// component. Concepts that only lead into or out of the cycle are not
    /// part of the result.
    pub fn minimal_cycle(&self) -> Option<Vec<ConceptId>> {
        let component = strongly_connected_components(&self.adjacency)
            .into_iter()
            .find(|c| c.len() > 1)?;
        let start = component[0];
        let members: HashSet<usize> = component.into_iter().collect();

        let mut parent: HashMap<usize, usize> = HashMap::new();
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            for &next in &self.adjacency[node] {
                if !members.contains(&next) {
                    continue;
                }
                if next == start {
                    let mut path = vec![node];
                    let mut current = node;
                    while current != start {
                        match parent.get(&current) {
                            Some(&p) => current = p,
                            None => break,
                        }
                        path.push(current);
                    }
                    path.reverse();
                    return Some(path.into_iter().map(|p| self.nodes[p]).collect());
                }
                if seen.insert(next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }

        None
    }
}

/// Order a store using every edge the tracker knows about.
pub fn sequence(store: &ConceptStore<'_>, tracker: &DependencyTracker) -> DefinitionResult<Vec<ConceptId>> {
    Sequencer::new(store, tracker.edges(store)).order()
}
