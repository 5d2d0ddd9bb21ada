//! Live schema reads from MySQL `information_schema`, scoped to the connection's current database.

use crate::error::AppError;
use async_trait::async_trait;
use sqlx::MySqlPool;

/// One column as currently defined in the database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveColumn {
    pub name: String,
    /// Bare type, e.g. `int`.
    pub data_type: String,
    /// Type with size parameters, e.g. `int(10)`.
    pub column_type: String,
    /// `PRI` for primary key columns.
    pub column_key: String,
    /// e.g. `auto_increment`.
    pub extra: String,
    pub default: Option<String>,
    /// `YES` or `NO`.
    pub is_nullable: String,
}

impl LiveColumn {
    pub fn is_primary_key(&self) -> bool {
        self.column_key == "PRI"
    }

    pub fn is_auto_increment(&self) -> bool {
        self.extra == "auto_increment"
    }

    pub fn nullable(&self) -> bool {
        self.is_nullable == "YES"
    }

    /// Default present and non-empty.
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref().filter(|d| !d.is_empty())
    }
}

/// Read access to the database catalog. Every call is a live read.
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    async fn table_exists(&self, table: &str) -> Result<bool, AppError>;

    /// Columns of `table` in ordinal order.
    async fn columns(&self, table: &str) -> Result<Vec<LiveColumn>, AppError>;
}

const TABLE_EXISTS_SQL: &str = "SELECT COUNT(*) FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?";

// information_schema columns come back as binary on some server versions; cast to text.
const COLUMNS_SQL: &str = "SELECT CAST(COLUMN_NAME AS CHAR), CAST(DATA_TYPE AS CHAR), \
     CAST(COLUMN_TYPE AS CHAR), CAST(COLUMN_KEY AS CHAR), CAST(EXTRA AS CHAR), \
     CAST(COLUMN_DEFAULT AS CHAR), CAST(IS_NULLABLE AS CHAR) \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
     ORDER BY ORDINAL_POSITION";

type ColumnRow = (String, String, String, String, String, Option<String>, String);

#[async_trait]
impl SchemaCatalog for MySqlPool {
    async fn table_exists(&self, table: &str) -> Result<bool, AppError> {
        tracing::debug!(sql = %TABLE_EXISTS_SQL, table, "query");
        let count: i64 = sqlx::query_scalar(TABLE_EXISTS_SQL)
            .bind(table)
            .fetch_one(self)
            .await?;
        Ok(count > 0)
    }

    async fn columns(&self, table: &str) -> Result<Vec<LiveColumn>, AppError> {
        tracing::debug!(sql = %COLUMNS_SQL, table, "query");
        let rows = sqlx::query_as::<_, ColumnRow>(COLUMNS_SQL)
            .bind(table)
            .fetch_all(self)
            .await?;
        Ok(rows
            .into_iter()
            .map(
                |(name, data_type, column_type, column_key, extra, default, is_nullable)| LiveColumn {
                    name,
                    data_type,
                    column_type,
                    column_key,
                    extra,
                    default,
                    is_nullable,
                },
            )
            .collect())
    }
}
