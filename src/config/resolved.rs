//! Resolved table model: declarations validated and normalized for diffing and DDL.

use crate::config::NO_DEFAULT;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    /// Lower-cased MySQL type name.
    pub type_name: String,
    pub length: u32,
    pub decimal_length: u32,
    /// Number of size parameters the type renders with (0, 1 or 2).
    pub length_count: u8,
    pub nullable: bool,
    pub is_key: bool,
    pub is_auto_increment: bool,
    /// Literal default, or [`NO_DEFAULT`].
    pub default_value: String,
}

impl ColumnSpec {
    pub fn has_default(&self) -> bool {
        self.default_value != NO_DEFAULT
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn key_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.is_key)
    }
}
