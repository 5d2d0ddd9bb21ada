//! Declaration validation: table name present, at least one column, identifiers usable, registered
//! types, unique columns.

use crate::config::ModelDeclaration;
use crate::error::ConfigError;
use crate::sql::lookup_length_count;
use std::collections::HashSet;

/// Identifiers are back-quoted in DDL; a back-quote or NUL inside one cannot be rendered safely.
/// MySQL limits identifiers to 64 characters, not bytes.
pub fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty()
        || name.contains('`')
        || name.contains('\0')
        || name.chars().count() > 64
    {
        return Err(ConfigError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Returns the table name of a declaration, or `MissingTableName` for `model`.
pub fn table_name<'a>(model: &str, decl: &'a ModelDeclaration) -> Result<&'a str, ConfigError> {
    decl.table
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingTableName {
            model: model.to_string(),
        })
}

pub fn validate(model: &str, decl: &ModelDeclaration) -> Result<(), ConfigError> {
    let table = table_name(model, decl)?;
    validate_identifier(table)?;

    let mut seen = HashSet::new();
    for col in decl.fields.iter().filter_map(|f| f.column.as_ref()) {
        validate_identifier(&col.name)?;
        if lookup_length_count(&col.type_).is_none() {
            return Err(ConfigError::UnknownType {
                column: col.name.clone(),
                type_name: col.type_.clone(),
            });
        }
        if !seen.insert(col.name.as_str()) {
            return Err(ConfigError::DuplicateColumn {
                table: table.to_string(),
                column: col.name.clone(),
            });
        }
    }
    if seen.is_empty() {
        return Err(ConfigError::NoColumns {
            model: model.to_string(),
        });
    }
    Ok(())
}
