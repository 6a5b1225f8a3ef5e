//! SQL Query Builder for entities
//!
//! [`EntityQuery`] owns the predicate tree, ordering and paging of one
//! query and compiles it to parameterized SQL. [`QueryBuilder`] is the
//! capability every builder type shares; specialized builders wrap an
//! `EntityQuery` and inherit all predicate methods from the trait.

use std::fmt;
use std::marker::PhantomData;

use sqlx::SqlitePool;

use super::predicate::{Boolean, Operator, Where, compile_wheres};
use super::traits::{DatabaseEntity, DatabaseFilter, FromSqlRow, OrderDirection, PageInput, SqlValue};
use crate::config::Config;
use crate::error::{Error, Result};

/// The generic query builder for an entity type.
///
/// Used directly when an entity declares no specialized builder, and wrapped
/// by every specialized one.
pub struct EntityQuery<E: DatabaseEntity> {
    _phantom: PhantomData<E>,
    config: Config,
    wheres: Vec<Where>,
    order_clauses: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl<E: DatabaseEntity> EntityQuery<E> {
    /// Create a new query builder with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            _phantom: PhantomData,
            config,
            wheres: Vec::new(),
            order_clauses: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// A fresh, empty query for the same entity sharing this query's config.
    ///
    /// Grouping operations build their sub-predicates in such a scope.
    pub fn detached(&self) -> Self {
        Self::with_config(self.config)
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// The top-level predicates, in insertion order.
    pub fn wheres(&self) -> &[Where] {
        &self.wheres
    }

    pub fn push_where(&mut self, node: Where) {
        self.wheres.push(node);
    }

    /// Consume the query, keeping only its predicate tree.
    pub fn into_wheres(self) -> Vec<Where> {
        self.wheres
    }

    pub fn order_clauses(&self) -> &[String] {
        &self.order_clauses
    }

    fn where_sql(&self, params: &mut Vec<SqlValue>) -> Option<String> {
        if self.wheres.is_empty() {
            return None;
        }
        Some(compile_wheres(&self.wheres, self.config.placeholder_style, params))
    }

    /// Build the SELECT statement and its bind values.
    pub fn build_sql(&self) -> (String, Vec<SqlValue>) {
        let mut values = Vec::new();
        let mut sql = E::select_sql();

        if let Some(conditions) = self.where_sql(&mut values) {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }

        if !self.order_clauses.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_clauses.join(", "));
        }

        let offset = self.offset.filter(|o| *o > 0);
        match (self.limit, offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", limit)),
            // SQLite only accepts OFFSET after a LIMIT
            (None, Some(_)) => sql.push_str(" LIMIT -1"),
            (None, None) => {}
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        (sql, values)
    }

    /// Build a COUNT statement over the same predicates.
    pub fn build_count_sql(&self) -> (String, Vec<SqlValue>) {
        let mut values = Vec::new();
        let mut sql = format!("SELECT COUNT(*) FROM {}", E::TABLE_NAME);
        if let Some(conditions) = self.where_sql(&mut values) {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }
        (sql, values)
    }

    /// Build a DELETE statement over the same predicates.
    pub fn build_delete_sql(&self) -> (String, Vec<SqlValue>) {
        let mut values = Vec::new();
        let mut sql = format!("DELETE FROM {}", E::TABLE_NAME);
        if let Some(conditions) = self.where_sql(&mut values) {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }
        (sql, values)
    }

    async fn load_all(&self, pool: &SqlitePool) -> Result<Vec<E>>
    where
        E: FromSqlRow,
    {
        let (sql, values) = self.build_sql();
        tracing::debug!(sql = %sql, params = values.len(), "Executing entity query");

        let mut query = sqlx::query(&sql);
        for value in &values {
            query = value.bind_to_query(query);
        }

        let rows = query.fetch_all(pool).await?;
        let entities = rows
            .iter()
            .map(E::from_row)
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;
        Ok(entities)
    }

    async fn load_count(&self, pool: &SqlitePool) -> Result<i64> {
        let (sql, values) = self.build_count_sql();
        tracing::debug!(sql = %sql, params = values.len(), "Executing count query");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in &values {
            query = value.bind_to_scalar(query);
        }

        Ok(query.fetch_one(pool).await?)
    }

    async fn execute_delete(&self, pool: &SqlitePool) -> Result<u64> {
        let (sql, values) = self.build_delete_sql();
        tracing::debug!(sql = %sql, params = values.len(), "Executing delete query");

        let mut query = sqlx::query(&sql);
        for value in &values {
            query = value.bind_to_query(query);
        }

        Ok(query.execute(pool).await?.rows_affected())
    }
}

impl<E: DatabaseEntity> Default for EntityQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DatabaseEntity> Clone for EntityQuery<E> {
    fn clone(&self) -> Self {
        Self {
            _phantom: PhantomData,
            config: self.config,
            wheres: self.wheres.clone(),
            order_clauses: self.order_clauses.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl<E: DatabaseEntity> fmt::Debug for EntityQuery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityQuery")
            .field("table", &E::TABLE_NAME)
            .field("wheres", &self.wheres)
            .field("order_clauses", &self.order_clauses)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}

/// Shared capability of every query builder for `E`.
///
/// Implementors only supply the four accessors; everything else is provided.
/// Predicate methods consume and return the builder so calls chain.
#[allow(async_fn_in_trait)]
pub trait QueryBuilder<E: DatabaseEntity>: Sized {
    /// Wrap an already-constructed query. This is the single constructor
    /// argument of every builder type.
    fn from_query(query: EntityQuery<E>) -> Self;

    fn query(&self) -> &EntityQuery<E>;

    fn query_mut(&mut self) -> &mut EntityQuery<E>;

    fn into_query(self) -> EntityQuery<E>;

    /// Append a predicate node to the tree.
    fn push_predicate(mut self, node: Where) -> Self {
        self.query_mut().push_where(node);
        self
    }

    fn where_op(self, column: &str, operator: Operator, value: impl Into<SqlValue>) -> Self {
        self.push_predicate(Where::Basic {
            column: column.to_string(),
            operator,
            value: value.into(),
            boolean: Boolean::And,
        })
    }

    fn where_eq(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.where_op(column, Operator::Eq, value)
    }

    fn or_where(self, column: &str, operator: Operator, value: impl Into<SqlValue>) -> Self {
        self.push_predicate(Where::Basic {
            column: column.to_string(),
            operator,
            value: value.into(),
            boolean: Boolean::Or,
        })
    }

    fn or_where_eq(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.or_where(column, Operator::Eq, value)
    }

    fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.push_predicate(Where::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
            boolean: Boolean::And,
        })
    }

    fn where_not_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.push_predicate(Where::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
            boolean: Boolean::And,
        })
    }

    fn where_null(self, column: &str) -> Self {
        self.push_predicate(Where::Null {
            column: column.to_string(),
            negated: false,
            boolean: Boolean::And,
        })
    }

    fn where_not_null(self, column: &str) -> Self {
        self.push_predicate(Where::Null {
            column: column.to_string(),
            negated: true,
            boolean: Boolean::And,
        })
    }

    /// Add a LIKE predicate with a caller-built pattern (no escaping).
    fn where_like(self, column: &str, pattern: &str) -> Self {
        self.push_predicate(Where::Like {
            column: column.to_string(),
            pattern: pattern.to_string(),
            negated: false,
            boolean: Boolean::And,
        })
    }

    /// Add a raw SQL condition; each bare `?` binds the next value.
    /// Use bare `?` only: `?N` and quoted `'?'` are not bound.
    fn where_raw(self, sql: &str, values: Vec<SqlValue>) -> Self {
        self.push_predicate(Where::Raw {
            sql: sql.to_string(),
            values,
            boolean: Boolean::And,
        })
    }

    /// Attach `predicates` as one nested group. Empty groups are dropped.
    fn attach_group(self, predicates: Vec<Where>, boolean: Boolean) -> Self {
        if predicates.is_empty() {
            return self;
        }
        self.push_predicate(Where::Nested {
            predicates,
            boolean,
        })
    }

    /// The grouped-predicate primitive.
    ///
    /// `f` receives a detached builder of the same type; whatever it adds is
    /// merged into this tree as one parenthesised group joined by `boolean`.
    /// The sub-predicates keep their own combinators.
    fn where_group_with<F>(self, f: F, boolean: Boolean) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        let scope = Self::from_query(self.query().detached());
        let captured = f(scope).into_query().into_wheres();
        self.attach_group(captured, boolean)
    }

    fn where_group<F>(self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.where_group_with(f, Boolean::And)
    }

    fn or_where_group<F>(self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.where_group_with(f, Boolean::Or)
    }

    /// Add every predicate produced by a filter input, joined by AND.
    fn filter<F: DatabaseFilter>(self, filter: &F) -> Self {
        if filter.is_empty() {
            return self;
        }
        filter
            .to_predicates()
            .into_iter()
            .fold(self, |builder, node| builder.push_predicate(node.with_boolean(Boolean::And)))
    }

    fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.query_mut()
            .order_clauses
            .push(format!("{} {}", column, direction.to_sql()));
        self
    }

    /// Add default sorting if no order is specified.
    fn default_order(mut self) -> Self {
        let query = self.query_mut();
        if query.order_clauses.is_empty() {
            query
                .order_clauses
                .push(format!("{} {}", E::DEFAULT_SORT, E::DEFAULT_SORT_DIR.to_sql()));
        }
        self
    }

    fn limit(mut self, limit: i64) -> Self {
        self.query_mut().limit = Some(limit);
        self
    }

    fn offset(mut self, offset: i64) -> Self {
        self.query_mut().offset = Some(offset);
        self
    }

    /// Apply offset-based pagination within the configured page sizes.
    fn paginate(mut self, page: &PageInput) -> Self {
        let query = self.query_mut();
        query.limit = Some(page.limit(
            query.config.default_page_size,
            query.config.max_page_size,
        ));
        query.offset = Some(page.offset());
        self
    }

    fn to_sql(&self) -> (String, Vec<SqlValue>) {
        self.query().build_sql()
    }

    fn to_count_sql(&self) -> (String, Vec<SqlValue>) {
        self.query().build_count_sql()
    }

    fn to_delete_sql(&self) -> (String, Vec<SqlValue>) {
        self.query().build_delete_sql()
    }

    /// Execute the query and return all matching entities.
    async fn fetch_all(self, pool: &SqlitePool) -> Result<Vec<E>>
    where
        E: FromSqlRow,
    {
        self.query().load_all(pool).await
    }

    /// Execute the query and return the first matching entity, if any.
    async fn fetch_optional(self, pool: &SqlitePool) -> Result<Option<E>>
    where
        E: FromSqlRow,
    {
        let results = self.limit(1).fetch_all(pool).await?;
        Ok(results.into_iter().next())
    }

    /// Like `fetch_optional`, but a miss is an error.
    async fn fetch_one(self, pool: &SqlitePool) -> Result<E>
    where
        E: FromSqlRow,
    {
        self.fetch_optional(pool)
            .await?
            .ok_or(Error::NotFound(E::TABLE_NAME))
    }

    /// Execute a COUNT over the current predicates.
    async fn count(&self, pool: &SqlitePool) -> Result<i64> {
        self.query().load_count(pool).await
    }

    /// Delete every row matching the current predicates.
    async fn delete(self, pool: &SqlitePool) -> Result<u64> {
        self.query().execute_delete(pool).await
    }
}

impl<E: DatabaseEntity> QueryBuilder<E> for EntityQuery<E> {
    fn from_query(query: EntityQuery<E>) -> Self {
        query
    }

    fn query(&self) -> &EntityQuery<E> {
        self
    }

    fn query_mut(&mut self) -> &mut EntityQuery<E> {
        self
    }

    fn into_query(self) -> EntityQuery<E> {
        self
    }
}
