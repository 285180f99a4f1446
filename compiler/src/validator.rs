//! Semantic validation of a closed model.

use concord_core::{ConceptId, SemanticValidationError};
use concord_expand::CapabilityTable;
use concord_graph::ConceptStore;

/// Run every self-check in processing order and stop at the first failure.
///
/// The error is returned exactly as the check produced it.
pub fn validate_semantics(
    store: &ConceptStore<'_>,
    order: &[ConceptId],
    capabilities: &CapabilityTable,
) -> Result<usize, SemanticValidationError> {
    let registry = store.registry();
    let mut checked = 0;

    for &id in order {
        let Some(concept) = store.get(id) else {
            continue;
        };
        let Some(check) = capabilities.check_for(registry, concept.type_id) else {
            continue;
        };
        if let Err(e) = check.check_semantics(id, store) {
            tracing::debug!(concept = %store.describe(id), error = %e, "semantic check failed");
            return Err(e);
        }
        checked += 1;
    }

    Ok(checked)
}
