//! Build configuration.

use concord_expand::ExpansionLimits;
use serde::{Deserialize, Serialize};

/// Settings for one model build. Every field has a default, so a partial
/// JSON document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Non-convergence guards for macro expansion.
    pub limits: ExpansionLimits,
    /// Run semantic checks on the closed model.
    pub validate_semantics: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            limits: ExpansionLimits::default(),
            validate_semantics: true,
        }
    }
}

impl BuildConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_limits(mut self, limits: ExpansionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn without_semantic_checks(mut self) -> Self {
        self.validate_semantics = false;
        self
    }
}
