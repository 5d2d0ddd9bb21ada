//! Model Store: reconcile a MySQL schema with declared models at startup.

pub mod catalog;
pub mod config;
pub mod diff;
pub mod discovery;
pub mod error;
pub mod migration;
pub mod reconcile;
pub mod registry;
pub mod sql;

pub use catalog::{LiveColumn, SchemaCatalog};
pub use config::{
    resolve_model, ColumnDeclaration, ColumnSpec, ModelDeclaration, ReconcileSettings, TableSpec,
};
pub use diff::{diff_table, ChangeSet, KeyChange, ModifyReason};
pub use discovery::discover;
pub use error::{AppError, ConfigError, DiscoveryError};
pub use migration::{execute_plan, DdlExecutor, MigrationPhase, MigrationPlan, MigrationReport};
pub use reconcile::{reconcile, run, ReconcileReport};
pub use registry::ModelRegistry;
