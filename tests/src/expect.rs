//! Expectations on the outcome of a model build.

use concord_compiler::{BuildError, Model};

use crate::error::{ScenarioError, ScenarioResult};

/// What a scenario expects from its build.
#[derive(Default)]
pub struct Expect {
    // Success expectations
    pub count: Option<usize>,
    pub present: Vec<String>,
    pub absent: Vec<String>,
    pub order: Option<Vec<String>>,
    pub before: Vec<(String, String)>,
    pub passes_at_most: Option<usize>,

    // Failure expectations
    pub error: Option<String>,
    pub error_pattern: Option<String>,
    pub implicated: Option<Vec<String>>,
    pub not_implicated: Vec<String>,

    // Custom check on the built model
    #[allow(clippy::type_complexity)]
    pub custom: Option<Box<dyn Fn(&Model<'_>) -> Result<(), String>>>,
}

impl std::fmt::Debug for Expect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expect")
            .field("count", &self.count)
            .field("present", &self.present)
            .field("absent", &self.absent)
            .field("order", &self.order)
            .field("before", &self.before)
            .field("error", &self.error)
            .field("error_pattern", &self.error_pattern)
            .field("implicated", &self.implicated)
            .field("custom", &self.custom.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Expect {
    pub fn new() -> Self {
        Self::default()
    }

    fn expects_failure(&self) -> bool {
        self.error.is_some()
            || self.error_pattern.is_some()
            || self.implicated.is_some()
            || !self.not_implicated.is_empty()
    }

    // ==================== Builders ====================

    /// Exact number of concepts in the model.
    pub fn count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }

    /// A concept with this key exists.
    pub fn has(mut self, key: impl Into<String>) -> Self {
        self.present.push(key.into());
        self
    }

    /// No concept with this key exists.
    pub fn lacks(mut self, key: impl Into<String>) -> Self {
        self.absent.push(key.into());
        self
    }

    /// Exact processing order, by key.
    pub fn order(mut self, keys: &[&str]) -> Self {
        self.order = Some(keys.iter().map(|k| k.to_string()).collect());
        self
    }

    /// `first` is processed before `second`.
    pub fn before(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.before.push((first.into(), second.into()));
        self
    }

    pub fn passes_at_most(mut self, n: usize) -> Self {
        self.passes_at_most = Some(n);
        self
    }

    /// The build fails with a message containing `text`.
    pub fn error(mut self, text: impl Into<String>) -> Self {
        self.error = Some(text.into());
        self
    }

    /// The build fails with a message matching `pattern`.
    pub fn error_matches(mut self, pattern: impl Into<String>) -> Self {
        self.error_pattern = Some(pattern.into());
        self
    }

    /// The build fails naming exactly these concept descriptions.
    pub fn implicated(mut self, descriptions: &[&str]) -> Self {
        self.implicated = Some(descriptions.iter().map(|d| d.to_string()).collect());
        self
    }

    /// The build fails without naming any concept whose description
    /// contains `text`.
    pub fn not_implicating(mut self, text: impl Into<String>) -> Self {
        self.not_implicated.push(text.into());
        self
    }

    pub fn check(mut self, f: impl Fn(&Model<'_>) -> Result<(), String> + 'static) -> Self {
        self.custom = Some(Box::new(f));
        self
    }

    // ==================== Verification ====================

    /// Verify the expectations against a build result.
    pub fn verify(&self, scenario: &str, result: &Result<Model<'_>, BuildError>) -> ScenarioResult<()> {
        match result {
            Ok(_) if self.expects_failure() => Err(ScenarioError::unexpected_success(scenario)),
            Ok(model) => self.verify_model(scenario, model),
            Err(e) if self.expects_failure() => self.verify_error(scenario, e),
            Err(e) => Err(ScenarioError::unexpected_failure(scenario, e.to_string())),
        }
    }

    fn verify_error(&self, scenario: &str, error: &BuildError) -> ScenarioResult<()> {
        let message = error.to_string();
        let fail = |m: String| Err(ScenarioError::assertion_failed(scenario, m));

        if let Some(expected) = &self.error {
            if !message.contains(expected.as_str()) {
                return fail(format!("expected error containing '{}', got: {}", expected, message));
            }
        }

        if let Some(pattern) = &self.error_pattern {
            let re = regex_lite::Regex::new(pattern)
                .map_err(|e| ScenarioError::assertion_failed(scenario, format!("invalid regex pattern: {}", e)))?;
            if !re.is_match(&message) {
                return fail(format!("expected error matching '{}', got: {}", pattern, message));
            }
        }

        let implicated = error.implicated_concepts();
        if let Some(expected) = &self.implicated {
            if &implicated != expected {
                return fail(format!(
                    "expected implicated concepts {:?}, got {:?}",
                    expected, implicated
                ));
            }
        }
        for text in &self.not_implicated {
            if let Some(found) = implicated.iter().find(|d| d.contains(text.as_str())) {
                return fail(format!("'{}' should not be implicated, but found: {}", text, found));
            }
        }

        Ok(())
    }

    fn verify_model(&self, scenario: &str, model: &Model<'_>) -> ScenarioResult<()> {
        let fail = |m: String| Err(ScenarioError::assertion_failed(scenario, m));

        if let Some(expected) = self.count {
            if model.len() != expected {
                let keys: Vec<&str> = model.order().iter().filter_map(|id| model.key_of(*id)).collect();
                return fail(format!("expected {} concepts, got {}: {:?}", expected, model.len(), keys));
            }
        }

        for key in &self.present {
            if model.id(key).is_none() {
                return fail(format!("expected concept '{}' to exist", key));
            }
        }
        for key in &self.absent {
            if model.id(key).is_some() {
                return fail(format!("expected no concept '{}'", key));
            }
        }

        let order: Vec<&str> = model.order().iter().filter_map(|id| model.key_of(*id)).collect();
        if let Some(expected) = &self.order {
            if &order != expected {
                return fail(format!("expected order {:?}, got {:?}", expected, order));
            }
        }
        for (first, second) in &self.before {
            let position = |key: &str| order.iter().position(|k| *k == key);
            match (position(first), position(second)) {
                (Some(a), Some(b)) if a < b => {}
                _ => return fail(format!("expected '{}' before '{}' in {:?}", first, second, order)),
            }
        }

        if let Some(limit) = self.passes_at_most {
            if model.stats().passes > limit {
                return fail(format!(
                    "expected at most {} passes, took {}",
                    limit,
                    model.stats().passes
                ));
            }
        }

        if let Some(custom) = &self.custom {
            custom(model).map_err(|m| ScenarioError::assertion_failed(scenario, m))?;
        }

        Ok(())
    }
}
