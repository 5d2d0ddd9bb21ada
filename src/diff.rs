//! Schema diff: classify each column of a table spec against the live table.

use crate::catalog::LiveColumn;
use crate::config::{ColumnSpec, TableSpec};
use crate::sql::render_type;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// First attribute found to differ, checked in declaration order of the variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifyReason {
    TypeMismatch,
    LengthMismatch,
    KeyPromotion,
    AutoIncrementRemoved,
    DefaultMismatch,
    NullabilityMismatch,
}

impl fmt::Display for ModifyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModifyReason::TypeMismatch => "type",
            ModifyReason::LengthMismatch => "type length",
            ModifyReason::KeyPromotion => "key promotion",
            ModifyReason::AutoIncrementRemoved => "auto_increment removed",
            ModifyReason::DefaultMismatch => "default value",
            ModifyReason::NullabilityMismatch => "nullability",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnModification {
    pub column: ColumnSpec,
    pub reason: ModifyReason,
}

/// Rebuild of a table's primary key, present when the live key columns differ from the declared
/// ones. MySQL has one primary key per table, so it is dropped and recreated as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyChange {
    /// Table has a live key to drop before any column gains a key.
    pub drop_live_key: bool,
    /// Live key column carrying AUTO_INCREMENT; MySQL refuses the drop until it is stripped.
    pub strip_auto_increment: Option<LiveColumn>,
    /// Declared key columns, in declaration order. Empty when the table ends up without a key.
    pub new_key: Vec<ColumnSpec>,
}

/// Changes needed to bring one table in line with its spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeSet {
    pub table: String,
    /// Table is missing; create it wholesale from this spec.
    pub create: Option<TableSpec>,
    pub add: Vec<ColumnSpec>,
    pub drop: Vec<String>,
    pub modify: Vec<ColumnModification>,
    /// Columns that are primary key live but not declared as key.
    pub drop_key: Vec<ColumnSpec>,
    pub key: Option<KeyChange>,
}

impl ChangeSet {
    fn empty(table: &str) -> Self {
        ChangeSet {
            table: table.to_string(),
            create: None,
            add: Vec::new(),
            drop: Vec::new(),
            modify: Vec::new(),
            drop_key: Vec::new(),
            key: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.create.is_none()
            && self.add.is_empty()
            && self.drop.is_empty()
            && self.modify.is_empty()
            && self.drop_key.is_empty()
            && self.key.is_none()
    }
}

/// Diff one table. `live` is ignored when the table does not exist.
pub fn diff_table(spec: &TableSpec, exists: bool, live: &[LiveColumn]) -> ChangeSet {
    let mut changes = ChangeSet::empty(&spec.name);
    if !exists {
        changes.create = Some(spec.clone());
        return changes;
    }

    let live_by_name: HashMap<&str, &LiveColumn> =
        live.iter().map(|c| (c.name.as_str(), c)).collect();
    let spec_by_name: HashMap<&str, &ColumnSpec> =
        spec.columns.iter().map(|c| (c.name.as_str(), c)).collect();

    changes.add = spec
        .columns
        .iter()
        .filter(|c| !live_by_name.contains_key(c.name.as_str()))
        .cloned()
        .collect();

    changes.drop = live
        .iter()
        .filter(|c| !spec_by_name.contains_key(c.name.as_str()))
        .map(|c| c.name.clone())
        .collect();

    for live_col in live {
        let Some(&col) = spec_by_name.get(live_col.name.as_str()) else {
            continue;
        };
        if let Some(reason) = modify_reason(col, live_col) {
            changes.modify.push(ColumnModification {
                column: col.clone(),
                reason,
            });
        }
        if live_col.is_primary_key() && !col.is_key {
            changes.drop_key.push(col.clone());
        }
    }

    changes.key = key_change(spec, live);
    changes
}

/// Compares key column sets; order within the key is not checked.
fn key_change(spec: &TableSpec, live: &[LiveColumn]) -> Option<KeyChange> {
    let live_key: BTreeSet<&str> = live
        .iter()
        .filter(|c| c.is_primary_key())
        .map(|c| c.name.as_str())
        .collect();
    let spec_key: BTreeSet<&str> = spec.key_columns().map(|c| c.name.as_str()).collect();
    if live_key == spec_key {
        return None;
    }
    Some(KeyChange {
        drop_live_key: !live_key.is_empty(),
        strip_auto_increment: live
            .iter()
            .find(|c| c.is_primary_key() && c.is_auto_increment())
            .cloned(),
        new_key: spec.key_columns().cloned().collect(),
    })
}

/// First mismatch between a spec column and its live counterpart, or None when they agree.
pub fn modify_reason(col: &ColumnSpec, live: &LiveColumn) -> Option<ModifyReason> {
    if !live.data_type.eq_ignore_ascii_case(&col.type_name) {
        return Some(ModifyReason::TypeMismatch);
    }
    if !live.column_type.eq_ignore_ascii_case(&render_type(col)) {
        return Some(ModifyReason::LengthMismatch);
    }
    if !live.is_primary_key() && col.is_key {
        return Some(ModifyReason::KeyPromotion);
    }
    if live.is_auto_increment() && !col.is_auto_increment {
        return Some(ModifyReason::AutoIncrementRemoved);
    }
    match live.default_value() {
        None if col.has_default() => return Some(ModifyReason::DefaultMismatch),
        Some(d) if d != col.default_value => return Some(ModifyReason::DefaultMismatch),
        _ => {}
    }
    if live.nullable() != col.nullable {
        return Some(ModifyReason::NullabilityMismatch);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve_model, ColumnDeclaration, ModelDeclaration};
    use pretty_assertions::assert_eq;

    fn table(columns: Vec<ColumnDeclaration>) -> TableSpec {
        let decl = columns
            .into_iter()
            .fold(ModelDeclaration::new("test2"), |d, c| d.column(c));
        resolve_model("models.Test2", &decl).unwrap()
    }

    fn live(
        name: &str,
        data_type: &str,
        column_type: &str,
        key: &str,
        extra: &str,
        default: Option<&str>,
        nullable: &str,
    ) -> LiveColumn {
        LiveColumn {
            name: name.into(),
            data_type: data_type.into(),
            column_type: column_type.into(),
            column_key: key.into(),
            extra: extra.into(),
            default: default.map(String::from),
            is_nullable: nullable.into(),
        }
    }

    fn id_spec() -> ColumnDeclaration {
        ColumnDeclaration::new("id", "int")
            .length(11)
            .not_null()
            .key()
            .auto_increment()
    }

    fn id_live(column_type: &str) -> LiveColumn {
        live("id", "int", column_type, "PRI", "auto_increment", None, "NO")
    }

    #[test]
    fn missing_table_is_created_wholesale() {
        let spec = table(vec![id_spec(), ColumnDeclaration::new("name", "varchar")]);
        let changes = diff_table(&spec, false, &[id_live("int(10)")]);
        assert_eq!(changes.create.as_ref(), Some(&spec));
        assert!(changes.add.is_empty());
        assert!(changes.drop.is_empty());
        assert!(changes.modify.is_empty());
        assert!(changes.drop_key.is_empty());
    }

    #[test]
    fn identical_column_needs_no_change() {
        let spec = table(vec![id_spec()]);
        let changes = diff_table(&spec, true, &[id_live("int(11)")]);
        assert!(changes.is_empty(), "{changes:?}");
    }

    #[test]
    fn length_mismatch_is_modify() {
        let spec = table(vec![id_spec()]);
        let changes = diff_table(&spec, true, &[id_live("int(10)")]);
        assert_eq!(changes.modify.len(), 1);
        assert_eq!(changes.modify[0].column.name, "id");
        assert_eq!(changes.modify[0].reason, ModifyReason::LengthMismatch);
        assert!(changes.add.is_empty() && changes.drop.is_empty() && changes.drop_key.is_empty());
        assert!(changes.key.is_none());
    }

    #[test]
    fn missing_live_default_is_modify() {
        let spec = table(vec![ColumnDeclaration::new("name", "varchar")
            .length(100)
            .default_value("dsfw")]);
        let changes = diff_table(
            &spec,
            true,
            &[live("name", "varchar", "varchar(100)", "", "", None, "YES")],
        );
        assert_eq!(changes.modify.len(), 1);
        assert_eq!(changes.modify[0].reason, ModifyReason::DefaultMismatch);
    }

    #[test]
    fn differing_live_default_is_modify() {
        let spec = table(vec![ColumnDeclaration::new("name", "varchar")
            .length(100)
            .default_value("dsfw")]);
        let changes = diff_table(
            &spec,
            true,
            &[live("name", "varchar", "varchar(100)", "", "", Some("abc"), "YES")],
        );
        assert_eq!(changes.modify[0].reason, ModifyReason::DefaultMismatch);

        let spec = table(vec![ColumnDeclaration::new("name", "varchar").length(100)]);
        let changes = diff_table(
            &spec,
            true,
            &[live("name", "varchar", "varchar(100)", "", "", Some("abc"), "YES")],
        );
        assert_eq!(changes.modify[0].reason, ModifyReason::DefaultMismatch);
    }

    #[test]
    fn live_only_column_is_drop_only() {
        let spec = table(vec![id_spec()]);
        let changes = diff_table(
            &spec,
            true,
            &[
                id_live("int(11)"),
                live("legacy_flag", "char", "char(1)", "", "", None, "YES"),
            ],
        );
        assert_eq!(changes.drop, vec!["legacy_flag".to_string()]);
        assert!(changes.add.is_empty() && changes.modify.is_empty() && changes.drop_key.is_empty());
    }

    #[test]
    fn spec_only_column_is_add_only() {
        let spec = table(vec![id_spec(), ColumnDeclaration::new("lifecycle", "char").length(5)]);
        let changes = diff_table(&spec, true, &[id_live("int(11)")]);
        let added: Vec<_> = changes.add.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(added, vec!["lifecycle"]);
        assert!(changes.drop.is_empty() && changes.modify.is_empty() && changes.drop_key.is_empty());
    }

    #[test]
    fn decimal_with_two_parameters_matches_case_insensitively() {
        let spec = table(vec![ColumnDeclaration::new("amount", "decimal").decimal(10, 2)]);
        let changes = diff_table(
            &spec,
            true,
            &[live("amount", "DECIMAL", "DECIMAL(10,2)", "", "", None, "YES")],
        );
        assert!(changes.is_empty(), "{changes:?}");
    }

    #[test]
    fn type_mismatch_wins_over_later_checks() {
        let spec = table(vec![ColumnDeclaration::new("note", "text").not_null()]);
        let changes = diff_table(
            &spec,
            true,
            &[live("note", "varchar", "varchar(20)", "", "", Some("x"), "YES")],
        );
        assert_eq!(changes.modify[0].reason, ModifyReason::TypeMismatch);
    }

    #[test]
    fn key_promotion_is_modify_with_promotion() {
        let spec = table(vec![id_spec()]);
        let changes = diff_table(
            &spec,
            true,
            &[live("id", "int", "int(11)", "", "auto_increment", None, "NO")],
        );
        assert_eq!(changes.modify[0].reason, ModifyReason::KeyPromotion);
        let key = changes.key.unwrap();
        assert!(!key.drop_live_key);
        assert_eq!(key.strip_auto_increment, None);
        assert_eq!(key.new_key, spec.columns);
    }

    #[test]
    fn key_demotion_is_key_drop_even_when_also_modified() {
        let spec = table(vec![ColumnDeclaration::new("id", "int").length(11).not_null()]);
        let changes = diff_table(&spec, true, &[id_live("int(10)")]);
        assert_eq!(changes.modify.len(), 1);
        assert_eq!(changes.modify[0].reason, ModifyReason::LengthMismatch);
        assert_eq!(changes.drop_key.len(), 1);
        assert_eq!(changes.drop_key[0].name, "id");
        let key = changes.key.unwrap();
        assert!(key.drop_live_key);
        assert_eq!(key.strip_auto_increment, Some(id_live("int(10)")));
        assert!(key.new_key.is_empty());
    }

    #[test]
    fn key_demotion_alone_is_not_modify_reason() {
        let spec = table(vec![ColumnDeclaration::new("id", "int")
            .length(11)
            .not_null()
            .auto_increment()]);
        let changes = diff_table(&spec, true, &[id_live("int(11)")]);
        assert!(changes.modify.is_empty());
        assert_eq!(changes.drop_key.len(), 1);
        assert!(changes.key.is_some());
    }

    #[test]
    fn partial_demotion_of_composite_key_rebuilds_key_once() {
        let spec = table(vec![
            ColumnDeclaration::new("a", "int").length(11).not_null().key(),
            ColumnDeclaration::new("b", "int").length(11).not_null(),
            ColumnDeclaration::new("c", "int").length(11).not_null(),
        ]);
        let changes = diff_table(
            &spec,
            true,
            &[
                live("a", "int", "int(11)", "PRI", "", None, "NO"),
                live("b", "int", "int(11)", "PRI", "", None, "NO"),
                live("c", "int", "int(11)", "PRI", "", None, "NO"),
            ],
        );
        let demoted: Vec<_> = changes.drop_key.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(demoted, vec!["b", "c"]);
        assert!(changes.modify.is_empty());
        let key = changes.key.unwrap();
        assert!(key.drop_live_key);
        let new_key: Vec<_> = key.new_key.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(new_key, vec!["a"]);
    }

    #[test]
    fn dropped_live_key_column_rebuilds_key() {
        let spec = table(vec![ColumnDeclaration::new("uid", "bigint").length(20).not_null().key()]);
        let changes = diff_table(&spec, true, &[id_live("int(11)")]);
        assert_eq!(changes.drop, vec!["id".to_string()]);
        assert!(changes.drop_key.is_empty());
        let key = changes.key.unwrap();
        assert!(key.drop_live_key);
        assert_eq!(key.strip_auto_increment, Some(id_live("int(11)")));
        assert_eq!(key.new_key[0].name, "uid");
    }

    #[test]
    fn same_key_columns_need_no_key_change() {
        let spec = table(vec![
            ColumnDeclaration::new("b", "int").length(11).not_null().key(),
            ColumnDeclaration::new("a", "int").length(11).not_null().key(),
        ]);
        let changes = diff_table(
            &spec,
            true,
            &[
                live("a", "int", "int(11)", "PRI", "", None, "NO"),
                live("b", "int", "int(10)", "PRI", "", None, "NO"),
            ],
        );
        assert_eq!(changes.modify.len(), 1);
        assert!(changes.key.is_none());
    }

    #[test]
    fn removed_auto_increment_and_nullability_are_modify() {
        let spec = table(vec![ColumnDeclaration::new("id", "int").length(11).not_null().key()]);
        let changes = diff_table(&spec, true, &[id_live("int(11)")]);
        assert_eq!(changes.modify[0].reason, ModifyReason::AutoIncrementRemoved);

        let spec = table(vec![ColumnDeclaration::new("flag", "char").length(1)]);
        let changes = diff_table(
            &spec,
            true,
            &[live("flag", "char", "char(1)", "", "", None, "NO")],
        );
        assert_eq!(changes.modify[0].reason, ModifyReason::NullabilityMismatch);
    }

    #[test]
    fn diff_is_idempotent() {
        let spec = table(vec![
            id_spec(),
            ColumnDeclaration::new("name", "varchar").length(100).default_value("dsfw"),
        ]);
        let live_cols = vec![
            id_live("int(10)"),
            live("legacy_flag", "char", "char(1)", "", "", None, "YES"),
        ];
        assert_eq!(
            diff_table(&spec, true, &live_cols),
            diff_table(&spec, true, &live_cols)
        );
    }
}
