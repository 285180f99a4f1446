//! Fixed-point macro expansion.
//!
//! One pass offers every macro whose view of the model is stale a turn.
//! Produced concepts go through the store and resolver exactly like parsed
//! ones. A pass that changes nothing closes the model.

use crate::capability::{CapabilityTable, MacroOutput};
use crate::error::{ExpandError, ExpandResult};
use crate::limits::ExpansionLimits;
use concord_core::{Concept, ConceptId, DefinitionError};
use concord_graph::{
    AddOutcome, ConceptStore, DependencyTracker, FinalizeError, ReferenceResolver,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Lifecycle of one model build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    /// Accepting parsed concepts.
    Loading,
    /// Running passes.
    Expanding,
    /// A pass produced nothing new.
    Closed,
}

/// Counters for one macro type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroStats {
    /// Number of times a macro of this type was invoked.
    pub invocations: usize,
    /// Concepts returned, duplicates included.
    pub produced: usize,
    /// Concepts that were new to the model.
    pub added: usize,
}

/// Statistics from an expansion run.
#[derive(Debug, Clone, Default)]
pub struct ExpansionStats {
    /// Number of passes run.
    pub passes: usize,
    /// Concepts added by macros.
    pub concepts_added: usize,
    /// Concepts replaced by a more derived description.
    pub concepts_refined: usize,
    /// Whether a fixed point was reached.
    pub converged: bool,
    /// Per macro type (or global macro name).
    pub macros: BTreeMap<String, MacroStats>,
}

/// Changes made by absorbing macro output.
#[derive(Debug, Default)]
struct Absorbed {
    added: usize,
    refined: usize,
}

/// Drives a model from loading to its fixed point.
pub struct ExpansionEngine<'c> {
    capabilities: &'c CapabilityTable,
    limits: ExpansionLimits,
    state: ExpansionState,
    resolver: ReferenceResolver,
    tracker: DependencyTracker,
    /// Concepts loaded and not yet resolved.
    loaded: Vec<ConceptId>,
    /// Bumped whenever a concept is added or refined.
    revision: usize,
    /// Model revision each macro concept last saw.
    seen_revision: HashMap<ConceptId, usize>,
    /// Model revision each global macro last saw, by position.
    global_seen_revision: Vec<Option<usize>>,
    stats: ExpansionStats,
}

impl<'c> ExpansionEngine<'c> {
    pub fn new(capabilities: &'c CapabilityTable, limits: ExpansionLimits) -> Self {
        Self {
            capabilities,
            limits,
            state: ExpansionState::Loading,
            resolver: ReferenceResolver::new(),
            tracker: DependencyTracker::new(),
            loaded: Vec::new(),
            revision: 0,
            seen_revision: HashMap::new(),
            global_seen_revision: vec![None; capabilities.globals().len()],
            stats: ExpansionStats::default(),
        }
    }

    pub fn state(&self) -> ExpansionState {
        self.state
    }

    pub fn stats(&self) -> &ExpansionStats {
        &self.stats
    }

    pub fn tracker(&self) -> &DependencyTracker {
        &self.tracker
    }

    /// References still unresolved.
    pub fn pending_references(&self) -> usize {
        self.resolver.pending_count()
    }

    pub fn into_parts(self) -> (DependencyTracker, ExpansionStats) {
        (self.tracker, self.stats)
    }

    fn expect_state(&self, expected: ExpansionState) -> ExpandResult<()> {
        if self.state != expected {
            return Err(ExpandError::invalid_state(expected, self.state));
        }
        Ok(())
    }

    // ==================== Loading ====================

    /// Add a parsed concept. References are resolved when expansion starts.
    pub fn load(&mut self, store: &mut ConceptStore<'_>, concept: Concept) -> ExpandResult<ConceptId> {
        self.expect_state(ExpansionState::Loading)?;
        match store.add_or_reconcile(concept)? {
            AddOutcome::Added(id) | AddOutcome::DuplicateIgnored { id, refined: true } => {
                self.revision += 1;
                self.loaded.push(id);
                Ok(id)
            }
            AddOutcome::DuplicateIgnored { id, .. } => Ok(id),
            AddOutcome::Conflict {
                key,
                existing,
                incoming,
            } => Err(store.conflict_error(&key, existing, &incoming).into()),
        }
    }

    /// Resolve the loaded batch best-effort and move to `Expanding`.
    pub fn start(&mut self, store: &mut ConceptStore<'_>) -> ExpandResult<()> {
        self.expect_state(ExpansionState::Loading)?;
        for id in std::mem::take(&mut self.loaded) {
            self.resolver.resolve(store, id)?;
        }
        self.resolver.retry_pending(store)?;

        tracing::info!(
            concepts = store.len(),
            unresolved = self.resolver.pending_count(),
            "loading finished, expanding"
        );
        self.state = ExpansionState::Expanding;
        Ok(())
    }

    // ==================== Expanding ====================

    /// Run passes until one changes nothing.
    pub fn expand(&mut self, store: &mut ConceptStore<'_>) -> ExpandResult<&ExpansionStats> {
        if self.state == ExpansionState::Loading {
            self.start(store)?;
        }
        self.expect_state(ExpansionState::Expanding)?;

        let pass_limit = self.limits.pass_limit(store.len());
        let mut producing = BTreeSet::new();

        loop {
            if self.stats.passes >= pass_limit {
                let macros: Vec<String> = producing.into_iter().collect();
                tracing::warn!(passes = self.stats.passes, macros = ?macros, "expansion did not converge");
                return Err(DefinitionError::infinite_loop(self.stats.passes, macros).into());
            }

            self.stats.passes += 1;
            let (absorbed, pass_producing) = self.run_pass(store)?;
            self.resolver.retry_pending(store)?;

            tracing::debug!(
                pass = self.stats.passes,
                added = absorbed.added,
                refined = absorbed.refined,
                concepts = store.len(),
                "expansion pass finished"
            );

            if absorbed.added == 0 && absorbed.refined == 0 {
                break;
            }
            producing = pass_producing;
        }

        self.stats.converged = true;
        self.state = ExpansionState::Closed;
        tracing::info!(
            passes = self.stats.passes,
            added = self.stats.concepts_added,
            unresolved = self.resolver.pending_count(),
            "expansion closed"
        );
        Ok(&self.stats)
    }

    /// One pass. Returns what changed and the macro names that added or
    /// refined something.
    fn run_pass(&mut self, store: &mut ConceptStore<'_>) -> ExpandResult<(Absorbed, BTreeSet<String>)> {
        let mut total = Absorbed::default();
        let mut producing = BTreeSet::new();
        let capabilities = self.capabilities;

        for (index, global) in capabilities.globals().iter().enumerate() {
            if self.global_seen_revision[index] == Some(self.revision) {
                continue;
            }
            self.global_seen_revision[index] = Some(self.revision);

            let output = global
                .create_new_concepts(store)
                .map_err(|source| ExpandError::macro_failed(global.name(), source))?;
            let absorbed = self.absorb(store, global.name(), output)?;
            if absorbed.added + absorbed.refined > 0 {
                producing.insert(global.name().to_string());
            }
            total.added += absorbed.added;
            total.refined += absorbed.refined;
        }

        let registry = store.registry();
        let candidates: Vec<ConceptId> = store.ids().collect();
        for id in candidates {
            let Some(concept) = store.get(id) else {
                continue;
            };
            let type_id = concept.type_id;
            let Some(expander) = capabilities.macro_for(registry, type_id) else {
                continue;
            };
            if self.seen_revision.get(&id) == Some(&self.revision) {
                continue;
            }
            self.seen_revision.insert(id, self.revision);

            let type_name = registry.type_name(type_id);
            let output = expander
                .create_new_concepts(id, store)
                .map_err(|source| ExpandError::macro_failed(store.describe(id), source))?;
            let absorbed = self.absorb(store, &type_name, output)?;
            if absorbed.added + absorbed.refined > 0 {
                producing.insert(type_name);
            }
            total.added += absorbed.added;
            total.refined += absorbed.refined;
        }

        Ok((total, producing))
    }

    /// Merge one macro's output into the model.
    fn absorb(
        &mut self,
        store: &mut ConceptStore<'_>,
        macro_name: &str,
        output: MacroOutput,
    ) -> ExpandResult<Absorbed> {
        let mut absorbed = Absorbed::default();
        let produced = output.concepts.len();

        for concept in output.concepts {
            match store.add_or_reconcile(concept)? {
                AddOutcome::Added(id) => {
                    if store.len() > self.limits.max_concepts {
                        tracing::warn!(limit = self.limits.max_concepts, macro_name, "concept limit reached");
                        return Err(DefinitionError::ConceptLimitExceeded {
                            limit: self.limits.max_concepts,
                            macros: vec![macro_name.to_string()],
                        }
                        .into());
                    }
                    absorbed.added += 1;
                    self.revision += 1;
                    self.resolver.resolve(store, id)?;
                }
                AddOutcome::DuplicateIgnored { id, refined: true } => {
                    absorbed.refined += 1;
                    self.revision += 1;
                    self.seen_revision.remove(&id);
                    self.resolver.resolve(store, id)?;
                }
                AddOutcome::DuplicateIgnored { .. } => {}
                AddOutcome::Conflict {
                    key,
                    existing,
                    incoming,
                } => return Err(store.conflict_error(&key, existing, &incoming).into()),
            }
        }

        for dependency in output.dependencies {
            self.tracker.declare(dependency);
        }

        let stats = self.stats.macros.entry(macro_name.to_string()).or_default();
        stats.invocations += 1;
        stats.produced += produced;
        stats.added += absorbed.added;
        self.stats.concepts_added += absorbed.added;
        self.stats.concepts_refined += absorbed.refined;

        Ok(absorbed)
    }

    // ==================== Closing ====================

    /// Fail with every reference, reference field or declared dependency,
    /// that never resolved.
    pub fn finalize(&mut self, store: &mut ConceptStore<'_>) -> Result<(), FinalizeError> {
        let missing = self.tracker.resolve(store)?;
        self.resolver
            .finalize_or_fail(store, &missing, self.tracker.declared_edges())
    }
}
