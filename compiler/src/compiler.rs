//! Model build pipeline.

use crate::config::BuildConfig;
use crate::error::{BuildError, BuildResult};
use crate::model::Model;
use crate::validator::validate_semantics;
use concord_core::Concept;
use concord_expand::{CapabilityTable, ExpansionEngine};
use concord_graph::ConceptStore;
use concord_order::sequence;
use concord_registry::Registry;

/// The Compiler turns parsed concepts into a closed, ordered model.
pub struct Compiler<'r, 'c> {
    registry: &'r Registry,
    capabilities: &'c CapabilityTable,
    config: BuildConfig,
}

impl<'r, 'c> Compiler<'r, 'c> {
    /// Create a compiler with the default configuration.
    pub fn new(registry: &'r Registry, capabilities: &'c CapabilityTable) -> Self {
        Self {
            registry,
            capabilities,
            config: BuildConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Fields of a concept type a parser should leave to the initializer.
    pub fn computed_fields(&self, type_name: &str) -> Vec<String> {
        self.registry
            .get_type_id(type_name)
            .map(|type_id| self.capabilities.computed_fields(self.registry, type_id))
            .unwrap_or_default()
    }

    /// Build a model from parsed concepts.
    ///
    /// Stages run in a fixed order: initializers, loading, expansion to a
    /// fixed point, the unresolved reference report, sequencing, semantic
    /// checks. Each stage fails before the next one starts.
    pub fn build(&self, concepts: Vec<Concept>) -> BuildResult<Model<'r>> {
        self.capabilities.validate(self.registry)?;

        let mut store = ConceptStore::new(self.registry);
        let mut engine = ExpansionEngine::new(self.capabilities, self.config.limits);

        // Loading
        let parsed = concepts.len();
        for concept in self.initialize(&store, concepts)? {
            engine.load(&mut store, concept)?;
        }
        tracing::debug!(parsed, loaded = store.len(), "parsed concepts loaded");

        // Expanding -> Closed
        engine.expand(&mut store)?;
        engine.finalize(&mut store)?;
        let (tracker, stats) = engine.into_parts();

        let order = sequence(&store, &tracker)?;

        if self.config.validate_semantics {
            let checked = validate_semantics(&store, &order, self.capabilities)?;
            tracing::debug!(checked, "semantic checks passed");
        }

        tracing::info!(
            concepts = store.len(),
            passes = stats.passes,
            generated = stats.concepts_added,
            "model built"
        );
        Ok(Model::new(store, order, tracker, stats))
    }

    /// Run initializers, appending the extra concepts each one returns
    /// right after the concept that produced them.
    fn initialize(&self, store: &ConceptStore<'_>, concepts: Vec<Concept>) -> BuildResult<Vec<Concept>> {
        let mut initialized = Vec::with_capacity(concepts.len());
        for mut concept in concepts {
            let Some(initializer) = self.capabilities.initializer_for(self.registry, concept.type_id) else {
                initialized.push(concept);
                continue;
            };
            let extra = initializer
                .initialize(&mut concept, self.registry)
                .map_err(|source| {
                    BuildError::initializer_failed(store.identity().describe(&concept), source)
                })?;
            initialized.push(concept);
            initialized.extend(extra);
        }
        Ok(initialized)
    }
}

/// Build a model with the default configuration.
pub fn build<'r>(
    registry: &'r Registry,
    capabilities: &CapabilityTable,
    concepts: Vec<Concept>,
) -> BuildResult<Model<'r>> {
    Compiler::new(registry, capabilities).build(concepts)
}
