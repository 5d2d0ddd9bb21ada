//! Column type policy: how many size parameters each supported MySQL type takes.

use crate::config::ColumnSpec;
use crate::error::ConfigError;

/// (type name, number of size parameters). 0 = `text`, 1 = `varchar(100)`, 2 = `decimal(10,2)`.
const TYPE_LENGTHS: &[(&str, u8)] = &[
    ("int", 1),
    ("varchar", 1),
    ("text", 0),
    ("datetime", 0),
    ("decimal", 2),
    ("double", 2),
    ("char", 1),
    ("bigint", 1),
    ("smallint", 1),
    ("tinyint", 1),
    ("date", 0),
    ("timestamp", 0),
    ("longtext", 0),
    ("float", 2),
];

/// Number of size parameters for `type_name` (case-insensitive), or None if unregistered.
pub fn lookup_length_count(type_name: &str) -> Option<u8> {
    TYPE_LENGTHS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(type_name))
        .map(|(_, count)| *count)
}

/// Like [`lookup_length_count`] but an unregistered type is a configuration error for `column`.
pub fn length_count(column: &str, type_name: &str) -> Result<u8, ConfigError> {
    lookup_length_count(type_name).ok_or_else(|| ConfigError::UnknownType {
        column: column.to_string(),
        type_name: type_name.to_string(),
    })
}

/// Renders `type`, `type(length)` or `type(length,decimal_length)` per the column's parameter count.
pub fn render_type(spec: &ColumnSpec) -> String {
    match spec.length_count {
        0 => spec.type_name.clone(),
        1 => format!("{}({})", spec.type_name, spec.length),
        _ => format!("{}({},{})", spec.type_name, spec.length, spec.decimal_length),
    }
}
