//! Model registry owned by one reconciliation run. Filled by discovery or by direct registration.

use crate::config::ModelDeclaration;
use std::collections::BTreeMap;

/// A model that could not be loaded during discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedModel {
    /// Qualified name, or the file/archive path when no name could be derived.
    pub name: String,
    pub reason: String,
}

/// Declarations keyed by qualified model name (e.g. `models.test.Test2`). Iterates in name order.
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelDeclaration>,
    skipped: Vec<SkippedModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        ModelRegistry::default()
    }

    /// Registers a model. A later registration under the same name replaces the earlier one.
    pub fn register(&mut self, name: impl Into<String>, decl: ModelDeclaration) {
        let name = name.into();
        if self.models.insert(name.clone(), decl).is_some() {
            tracing::warn!(model = %name, "model registered twice, keeping the later declaration");
        }
    }

    pub fn skip(&mut self, name: impl Into<String>, reason: impl ToString) {
        let skipped = SkippedModel {
            name: name.into(),
            reason: reason.to_string(),
        };
        tracing::warn!(model = %skipped.name, reason = %skipped.reason, "skipping model");
        self.skipped.push(skipped);
    }

    pub fn get(&self, name: &str) -> Option<&ModelDeclaration> {
        self.models.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelDeclaration)> {
        self.models.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn skipped(&self) -> &[SkippedModel] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
