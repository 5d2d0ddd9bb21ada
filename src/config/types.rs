//! Raw model declarations as they appear in `*.model.json` files or are built in code.

use serde::{Deserialize, Serialize};

/// Default value sentinel meaning "the column has no default".
pub const NO_DEFAULT: &str = "NULL";

/// One declared model: a table name and its fields. Fields without a `column` are not persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDeclaration {
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    #[serde(default)]
    pub column: Option<ColumnDeclaration>,
}

/// Column metadata attached to a field. Omitted keys take the same defaults as the declaration
/// attribute they mirror.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default = "default_length")]
    pub length: u32,
    #[serde(default)]
    pub decimal_length: u32,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default = "default_value")]
    pub default: String,
}

fn default_length() -> u32 {
    255
}

fn default_true() -> bool {
    true
}

fn default_value() -> String {
    NO_DEFAULT.to_string()
}

impl ModelDeclaration {
    pub fn new(table: impl Into<String>) -> Self {
        ModelDeclaration {
            table: Some(table.into()),
            fields: Vec::new(),
        }
    }

    /// Adds a persisted field whose column has the same name.
    pub fn column(mut self, column: ColumnDeclaration) -> Self {
        self.fields.push(FieldDeclaration {
            name: column.name.clone(),
            column: Some(column),
        });
        self
    }

    /// Adds a field with no column metadata.
    pub fn transient(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDeclaration {
            name: name.into(),
            column: None,
        });
        self
    }
}

impl ColumnDeclaration {
    pub fn new(name: impl Into<String>, type_: impl Into<String>) -> Self {
        ColumnDeclaration {
            name: name.into(),
            type_: type_.into(),
            length: default_length(),
            decimal_length: 0,
            nullable: true,
            key: false,
            auto_increment: false,
            default: default_value(),
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn decimal(mut self, length: u32, decimal_length: u32) -> Self {
        self.length = length;
        self.decimal_length = decimal_length;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = value.into();
        self
    }
}
