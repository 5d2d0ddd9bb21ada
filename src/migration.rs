//! Apply change sets to the database. Order is global across tables: create tables, drop primary
//! keys, add columns, drop columns, modify columns, add primary keys. Key drops must precede adds
//! and modifies that introduce a new key, or MySQL rejects the statement with "multiple primary
//! key defined". A table's key is dropped at most once and recreated at most once.

use crate::config::ColumnSpec;
use crate::diff::ChangeSet;
use crate::sql::ddl;
use async_trait::async_trait;
use sqlx::MySqlPool;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MigrationPhase {
    CreateTable,
    DropPrimaryKey,
    AddColumn,
    DropColumn,
    ModifyColumn,
    AddPrimaryKey,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MigrationPhase::CreateTable => "create table",
            MigrationPhase::DropPrimaryKey => "drop primary key",
            MigrationPhase::AddColumn => "add column",
            MigrationPhase::DropColumn => "drop column",
            MigrationPhase::ModifyColumn => "modify column",
            MigrationPhase::AddPrimaryKey => "add primary key",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationStep {
    pub phase: MigrationPhase,
    pub table: String,
    /// None for whole-table steps.
    pub column: Option<String>,
    pub sql: String,
}

/// Ordered DDL for one reconciliation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    pub steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    /// Flatten change sets into steps, phase by phase. Within a phase, tables keep the order of
    /// `change_sets` and columns keep their change-set order.
    pub fn build(change_sets: &[ChangeSet]) -> Self {
        let mut steps = Vec::new();

        for cs in change_sets {
            if let Some(spec) = &cs.create {
                steps.push(MigrationStep {
                    phase: MigrationPhase::CreateTable,
                    table: cs.table.clone(),
                    column: None,
                    sql: ddl::create_table(spec),
                });
            }
        }
        for cs in change_sets {
            if let Some(key) = cs.key.as_ref().filter(|k| k.drop_live_key) {
                steps.push(MigrationStep {
                    phase: MigrationPhase::DropPrimaryKey,
                    table: cs.table.clone(),
                    column: None,
                    sql: ddl::drop_primary_key(&cs.table, key.strip_auto_increment.as_ref()),
                });
            }
        }
        for cs in change_sets {
            let placement = KeyPlacement::of(cs);
            for col in &cs.add {
                steps.push(MigrationStep {
                    phase: MigrationPhase::AddColumn,
                    table: cs.table.clone(),
                    column: Some(col.name.clone()),
                    sql: ddl::add_column(
                        &cs.table,
                        col,
                        placement.auto_increment(col),
                        placement.is_inline(col),
                    ),
                });
            }
        }
        for cs in change_sets {
            for name in &cs.drop {
                steps.push(MigrationStep {
                    phase: MigrationPhase::DropColumn,
                    table: cs.table.clone(),
                    column: Some(name.clone()),
                    sql: ddl::drop_column(&cs.table, name),
                });
            }
        }
        for cs in change_sets {
            let placement = KeyPlacement::of(cs);
            for m in &cs.modify {
                steps.push(MigrationStep {
                    phase: MigrationPhase::ModifyColumn,
                    table: cs.table.clone(),
                    column: Some(m.column.name.clone()),
                    sql: ddl::modify_column(
                        &cs.table,
                        &m.column,
                        placement.auto_increment(&m.column),
                        placement.is_inline(&m.column),
                    ),
                });
            }
        }
        for cs in change_sets {
            if let (KeyPlacement::Separate, Some(key)) = (KeyPlacement::of(cs), &cs.key) {
                steps.push(MigrationStep {
                    phase: MigrationPhase::AddPrimaryKey,
                    table: cs.table.clone(),
                    column: None,
                    sql: ddl::add_primary_key(&cs.table, &key.new_key),
                });
            }
        }

        MigrationPlan { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// Where a table's declared key gets created during an alter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyPlacement<'a> {
    /// Live key already matches, or the table ends up without one.
    Unchanged,
    /// Single-column key declared on that column's own ADD or MODIFY.
    Inline(&'a str),
    /// `ADD PRIMARY KEY (..)` after every column change; AUTO_INCREMENT is restored there.
    Separate,
}

impl<'a> KeyPlacement<'a> {
    fn of(cs: &'a ChangeSet) -> Self {
        let Some(key) = &cs.key else {
            return KeyPlacement::Unchanged;
        };
        match key.new_key.as_slice() {
            [] => KeyPlacement::Unchanged,
            [col] if cs.add.iter().any(|c| c.name == col.name)
                || cs.modify.iter().any(|m| m.column.name == col.name) =>
            {
                KeyPlacement::Inline(&col.name)
            }
            _ => KeyPlacement::Separate,
        }
    }

    fn is_inline(self, col: &ColumnSpec) -> bool {
        matches!(self, KeyPlacement::Inline(name) if name == col.name)
    }

    /// AUTO_INCREMENT needs a key; key columns of a separately added key get it afterwards.
    fn auto_increment(self, col: &ColumnSpec) -> bool {
        col.is_auto_increment && !(self == KeyPlacement::Separate && col.is_key)
    }
}

/// Runs one DDL statement. Each statement is its own unit; MySQL DDL auto-commits.
#[async_trait]
pub trait DdlExecutor: Send + Sync {
    async fn execute_ddl(&self, sql: &str) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl DdlExecutor for MySqlPool {
    async fn execute_ddl(&self, sql: &str) -> Result<(), sqlx::Error> {
        sqlx::query(sql).execute(self).await?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepFailure {
    pub phase: MigrationPhase,
    pub table: String,
    pub column: Option<String>,
    pub sql: String,
    pub message: String,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(c) => write!(f, "{} {}.{}: {}", self.phase, self.table, c, self.message),
            None => write!(f, "{} {}: {}", self.phase, self.table, self.message),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: Vec<MigrationStep>,
    pub failed: Vec<StepFailure>,
    /// Steps not executed (dry run).
    pub skipped: Vec<MigrationStep>,
}

impl MigrationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Execute every step in order. A failing statement is logged and recorded; the rest still run.
pub async fn execute_plan<E>(executor: &E, plan: &MigrationPlan) -> MigrationReport
where
    E: DdlExecutor + ?Sized,
{
    let mut report = MigrationReport::default();
    for step in &plan.steps {
        let column = step.column.as_deref().unwrap_or("");
        tracing::info!(phase = %step.phase, table = %step.table, column, "start");
        match executor.execute_ddl(&step.sql).await {
            Ok(()) => {
                tracing::info!(phase = %step.phase, table = %step.table, column, "done");
                report.applied.push(step.clone());
            }
            Err(e) => {
                tracing::warn!(
                    phase = %step.phase,
                    table = %step.table,
                    column,
                    sql = %step.sql,
                    error = %e,
                    "ddl statement failed, continuing"
                );
                report.failed.push(StepFailure {
                    phase: step.phase,
                    table: step.table.clone(),
                    column: step.column.clone(),
                    sql: step.sql.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    report
}

/// Log the plan without executing it.
pub fn dry_run(plan: &MigrationPlan) -> MigrationReport {
    for step in &plan.steps {
        tracing::info!(phase = %step.phase, table = %step.table, sql = %step.sql, "dry run");
    }
    MigrationReport {
        skipped: plan.steps.clone(),
        ..MigrationReport::default()
    }
}
