//! Startup reconciliation: discover models, resolve table specs, read the live schema, diff,
//! then apply the migration plan. All catalog reads finish before the first DDL statement.

use crate::catalog::SchemaCatalog;
use crate::config::{resolve_model, ReconcileSettings, TableSpec};
use crate::diff::{diff_table, ChangeSet};
use crate::discovery::discover;
use crate::error::{AppError, ConfigError};
use crate::migration::{dry_run, execute_plan, DdlExecutor, MigrationPlan, MigrationReport};
use crate::registry::{ModelRegistry, SkippedModel};
use sqlx::MySqlPool;
use std::collections::HashMap;

/// A model excluded from the run because its declaration is unusable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelError {
    pub model: String,
    pub error: ConfigError,
}

#[derive(Clone, Debug, Default)]
pub struct ReconcileReport {
    /// Tables checked against the live schema.
    pub tables: Vec<String>,
    pub config_errors: Vec<ModelError>,
    pub skipped_models: Vec<SkippedModel>,
    pub change_sets: Vec<ChangeSet>,
    pub plan: MigrationPlan,
    pub migration: MigrationReport,
}

impl ReconcileReport {
    /// No config errors and no failed statements. Skipped models do not count as failures.
    pub fn is_success(&self) -> bool {
        self.config_errors.is_empty() && self.migration.is_success()
    }
}

/// Resolve every registered model. Models with config errors are logged and left out.
pub fn resolve_all(registry: &ModelRegistry) -> (Vec<TableSpec>, Vec<ModelError>) {
    let mut specs = Vec::new();
    let mut errors = Vec::new();
    let mut declared_by: HashMap<String, String> = HashMap::new();

    for (model, decl) in registry.iter() {
        let result = resolve_model(model, decl).and_then(|spec| {
            if let Some(first) = declared_by.get(&spec.name) {
                return Err(ConfigError::DuplicateTable {
                    table: spec.name.clone(),
                    first: first.clone(),
                    second: model.to_string(),
                });
            }
            Ok(spec)
        });
        match result {
            Ok(spec) => {
                declared_by.insert(spec.name.clone(), model.to_string());
                specs.push(spec);
            }
            Err(error) => {
                tracing::error!(model, error = %error, "model excluded from reconciliation");
                errors.push(ModelError {
                    model: model.to_string(),
                    error,
                });
            }
        }
    }
    (specs, errors)
}

/// Read the live schema for each table and diff it. A database error aborts the whole run.
pub async fn plan_changes<C>(catalog: &C, specs: &[TableSpec]) -> Result<Vec<ChangeSet>, AppError>
where
    C: SchemaCatalog + ?Sized,
{
    let mut change_sets = Vec::with_capacity(specs.len());
    for spec in specs {
        let exists = catalog.table_exists(&spec.name).await?;
        let live = if exists {
            catalog.columns(&spec.name).await?
        } else {
            Vec::new()
        };
        let changes = diff_table(spec, exists, &live);
        tracing::debug!(
            table = %spec.name,
            create = changes.create.is_some(),
            add = changes.add.len(),
            drop = changes.drop.len(),
            modify = changes.modify.len(),
            drop_key = changes.drop_key.len(),
            rekey = changes.key.is_some(),
            "diffed"
        );
        for m in &changes.modify {
            tracing::debug!(table = %spec.name, column = %m.column.name, reason = %m.reason, "modify");
        }
        change_sets.push(changes);
    }
    Ok(change_sets)
}

/// Reconcile the registered models against the database behind `db`.
pub async fn reconcile<D>(
    db: &D,
    registry: &ModelRegistry,
    dry_run_only: bool,
) -> Result<ReconcileReport, AppError>
where
    D: SchemaCatalog + DdlExecutor + ?Sized,
{
    let (specs, config_errors) = resolve_all(registry);
    let change_sets = plan_changes(db, &specs).await?;
    let plan = MigrationPlan::build(&change_sets);

    let migration = if dry_run_only {
        dry_run(&plan)
    } else {
        execute_plan(db, &plan).await
    };

    let report = ReconcileReport {
        tables: specs.into_iter().map(|s| s.name).collect(),
        config_errors,
        skipped_models: registry.skipped().to_vec(),
        change_sets,
        plan,
        migration,
    };
    tracing::info!(
        tables = report.tables.len(),
        statements = report.plan.len(),
        applied = report.migration.applied.len(),
        failed = report.migration.failed.len(),
        config_errors = report.config_errors.len(),
        skipped_models = report.skipped_models.len(),
        "reconciliation finished"
    );
    Ok(report)
}

/// Discover models per `settings` and reconcile them against `pool`. Call once at startup.
pub async fn run(pool: &MySqlPool, settings: &ReconcileSettings) -> Result<ReconcileReport, AppError> {
    let registry = discover(settings);
    reconcile(pool, &registry, settings.dry_run).await
}
