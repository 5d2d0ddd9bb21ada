//! Typed errors for declaration resolution, discovery, and database access.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("model {model} has no table name")]
    MissingTableName { model: String },
    #[error("model {model} declares no columns")]
    NoColumns { model: String },
    #[error("unknown column type '{type_name}' on column {column}")]
    UnknownType { column: String, type_name: String },
    #[error("duplicate column {column} in table {table}")]
    DuplicateColumn { table: String, column: String },
    #[error("table {table} is declared by both {first} and {second}")]
    DuplicateTable {
        table: String,
        first: String,
        second: String,
    },
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    #[error("settings: {0}")]
    Settings(String),
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("io: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("archive {path}: {source}")]
    Archive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("parse {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}
