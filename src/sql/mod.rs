//! MySQL type policy and DDL rendering: identifiers from declarations only.

pub mod ddl;
mod types;
pub use types::*;
