//! Reconciliation settings from environment: model namespace, search path, dry run.

use crate::error::ConfigError;
use regex::Regex;
use std::path::PathBuf;

pub const DEFAULT_NAMESPACE: &str = "models";
pub const DEFAULT_SEARCH_PATH: &str = "models_root";

const NAMESPACE_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileSettings {
    /// Dotted namespace under which model declarations live (e.g. `app.models`).
    pub namespace: String,
    /// Roots to search: directories or `.zip` archives.
    pub search_path: Vec<PathBuf>,
    /// Log the migration plan without executing it.
    pub dry_run: bool,
}

impl ReconcileSettings {
    pub fn new(namespace: impl Into<String>, search_path: Vec<PathBuf>) -> Result<Self, ConfigError> {
        let settings = ReconcileSettings {
            namespace: namespace.into(),
            search_path,
            dry_run: false,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// From `MODEL_NAMESPACE`, `MODEL_PATH` (`:`-separated) and `MODEL_STORE_DRY_RUN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let namespace = lookup("MODEL_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.into());
        let search_path = lookup("MODEL_PATH")
            .unwrap_or_else(|| DEFAULT_SEARCH_PATH.into())
            .split(':')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();
        let dry_run = lookup("MODEL_STORE_DRY_RUN")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let settings = ReconcileSettings {
            namespace,
            search_path,
            dry_run,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Namespace as a relative path prefix (`app.models` -> `app/models`).
    pub fn namespace_path(&self) -> String {
        self.namespace.replace('.', "/")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let re = Regex::new(NAMESPACE_PATTERN).map_err(|e| ConfigError::Settings(e.to_string()))?;
        if !re.is_match(&self.namespace) {
            return Err(ConfigError::Settings(format!(
                "invalid model namespace: {}",
                self.namespace
            )));
        }
        Ok(())
    }
}
