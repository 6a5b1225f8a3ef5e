//! Core traits for entity queries
//!
//! Entities implement [`DatabaseEntity`] to describe their table and
//! [`FromSqlRow`] to decode rows; filter inputs implement [`DatabaseFilter`].

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;

use super::predicate::Where;

/// Metadata about a database entity (table).
pub trait DatabaseEntity: Sized + Send + Sync + 'static {
    /// The SQL table name (e.g., "users")
    const TABLE_NAME: &'static str;

    /// The primary key column name (e.g., "id")
    const PRIMARY_KEY: &'static str;

    /// Default sort column for list queries (e.g., "name")
    const DEFAULT_SORT: &'static str;

    /// Default sort direction
    const DEFAULT_SORT_DIR: OrderDirection = OrderDirection::Asc;

    /// List of all column names in the table
    fn column_names() -> &'static [&'static str];

    /// Build a SELECT query for all columns
    fn select_sql() -> String {
        let columns = Self::column_names().join(", ");
        format!("SELECT {} FROM {}", columns, Self::TABLE_NAME)
    }
}

/// Trait for decoding a database row into an entity.
pub trait FromSqlRow: Sized {
    /// Decode a SQLite row into this entity type
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

/// Trait for turning a filter input into predicates.
///
/// The returned predicates are attached to the query joined by AND.
pub trait DatabaseFilter: Send + Sync {
    fn to_predicates(&self) -> Vec<Where>;

    /// Check if the filter has any conditions
    fn is_empty(&self) -> bool;
}

/// Sort direction for ORDER BY clauses.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending order (A-Z, 1-9, oldest-newest)
    #[default]
    Asc,
    /// Descending order (Z-A, 9-1, newest-oldest)
    Desc,
}

impl OrderDirection {
    /// Convert to SQL order string
    pub fn to_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Represents a SQL value that can be bound to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl SqlValue {
    /// Bind this value to a sqlx query builder
    pub fn bind_to_query<'q>(
        &'q self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        match self {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(if *b { 1i32 } else { 0i32 }),
            SqlValue::Null => query.bind(None::<String>),
        }
    }

    /// Bind this value to a scalar query (used for COUNT)
    pub fn bind_to_scalar<'q, O>(
        &'q self,
        query: sqlx::query::QueryScalar<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::QueryScalar<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>> {
        match self {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(if *b { 1i32 } else { 0i32 }),
            SqlValue::Null => query.bind(None::<String>),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Pagination input for offset-based pagination.
#[derive(Default, Clone, Debug, Serialize, Deserialize)]
pub struct PageInput {
    /// Maximum number of items to return
    pub limit: Option<i64>,

    /// Number of items to skip
    pub offset: Option<i64>,
}

impl PageInput {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Requested limit, defaulted and capped. Never below 1, even when
    /// `max` is.
    pub fn limit(&self, default: i64, max: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, max.max(1))
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
