//! Resolve model declarations into table specs.

use crate::config::resolved::{ColumnSpec, TableSpec};
use crate::config::{table_name, validate, ColumnDeclaration, ModelDeclaration};
use crate::error::ConfigError;
use crate::sql::length_count;

/// Build the table spec for one declaration. `model` is the qualified model name, used in errors.
/// Columns keep declaration order; fields without column metadata are skipped.
pub fn resolve_model(model: &str, decl: &ModelDeclaration) -> Result<TableSpec, ConfigError> {
    validate(model, decl)?;
    let name = table_name(model, decl)?.to_string();
    let columns = decl
        .fields
        .iter()
        .filter_map(|f| f.column.as_ref())
        .map(resolve_column)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TableSpec { name, columns })
}

fn resolve_column(col: &ColumnDeclaration) -> Result<ColumnSpec, ConfigError> {
    let type_name = col.type_.to_lowercase();
    let length_count = length_count(&col.name, &type_name)?;
    Ok(ColumnSpec {
        name: col.name.clone(),
        type_name,
        length: col.length,
        decimal_length: col.decimal_length,
        length_count,
        nullable: col.nullable,
        is_key: col.key,
        is_auto_increment: col.auto_increment,
        default_value: col.default.clone(),
    })
}
