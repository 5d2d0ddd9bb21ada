//! MySQL DDL rendering. Identifiers come from validated declarations only.

use crate::catalog::LiveColumn;
use crate::config::{ColumnSpec, TableSpec};
use crate::sql::render_type;

/// Back-quote an identifier for MySQL.
pub fn quote_ident(s: &str) -> String {
    format!("`{}`", s.replace('`', "``"))
}

/// Single-quoted string literal.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

/// `` `name` type(len) NULL|NOT NULL [AUTO_INCREMENT] [DEFAULT 'v'] ``
pub fn column_definition(col: &ColumnSpec) -> String {
    render_column(col, col.is_auto_increment)
}

fn render_column(col: &ColumnSpec, auto_increment: bool) -> String {
    let mut def = format!("{} {}", quote_ident(&col.name), render_type(col));
    def.push_str(if col.nullable { " NULL" } else { " NOT NULL" });
    if auto_increment {
        def.push_str(" AUTO_INCREMENT");
    }
    if col.has_default() {
        def.push_str(" DEFAULT ");
        def.push_str(&quote_literal(&col.default_value));
    }
    def
}

pub fn create_table(spec: &TableSpec) -> String {
    let mut defs: Vec<String> = spec.columns.iter().map(column_definition).collect();
    let keys: Vec<String> = spec.key_columns().map(|c| quote_ident(&c.name)).collect();
    if !keys.is_empty() {
        defs.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }
    format!(
        "CREATE TABLE {} (\n  {}\n)",
        quote_ident(&spec.name),
        defs.join(",\n  ")
    )
}

/// Live definition without AUTO_INCREMENT, for columns the declarations may no longer describe.
fn live_column_definition(col: &LiveColumn) -> String {
    let mut def = format!("{} {}", quote_ident(&col.name), col.column_type);
    def.push_str(if col.nullable() { " NULL" } else { " NOT NULL" });
    if let Some(d) = col.default_value() {
        def.push_str(" DEFAULT ");
        def.push_str(&quote_literal(d));
    }
    def
}

/// Drops the primary key. AUTO_INCREMENT must go first, since MySQL only allows it on a key column.
pub fn drop_primary_key(table: &str, strip_auto_increment: Option<&LiveColumn>) -> String {
    match strip_auto_increment {
        Some(col) => format!(
            "ALTER TABLE {} MODIFY {}, DROP PRIMARY KEY",
            quote_ident(table),
            live_column_definition(col)
        ),
        None => format!("ALTER TABLE {} DROP PRIMARY KEY", quote_ident(table)),
    }
}

/// Adds the primary key over `key`, then puts AUTO_INCREMENT back on key columns declaring it.
pub fn add_primary_key(table: &str, key: &[ColumnSpec]) -> String {
    let names: Vec<String> = key.iter().map(|c| quote_ident(&c.name)).collect();
    let mut sql = format!(
        "ALTER TABLE {} ADD PRIMARY KEY ({})",
        quote_ident(table),
        names.join(", ")
    );
    for col in key.iter().filter(|c| c.is_auto_increment) {
        sql.push_str(", MODIFY ");
        sql.push_str(&column_definition(col));
    }
    sql
}

pub fn add_column(table: &str, col: &ColumnSpec, auto_increment: bool, primary_key: bool) -> String {
    let key = if primary_key { " PRIMARY KEY" } else { "" };
    format!(
        "ALTER TABLE {} ADD {}{}",
        quote_ident(table),
        render_column(col, auto_increment),
        key
    )
}

pub fn drop_column(table: &str, column: &str) -> String {
    format!("ALTER TABLE {} DROP {}", quote_ident(table), quote_ident(column))
}

pub fn modify_column(
    table: &str,
    col: &ColumnSpec,
    auto_increment: bool,
    primary_key: bool,
) -> String {
    let key = if primary_key { " PRIMARY KEY" } else { "" };
    format!(
        "ALTER TABLE {} MODIFY {}{}",
        quote_ident(table),
        render_column(col, auto_increment),
        key
    )
}
