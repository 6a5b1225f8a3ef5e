//! Per-model query builders for SQL entities.
//!
//! Every entity can declare its own builder type, which wraps the generic
//! [`EntityQuery`] and adds named filters on top of it. Builders that
//! implement [`ModelQueryExt`] also get `where_all`, `where_any` (OR'd
//! groups) and `field_contains` (escaped substring match).

pub mod config;
pub mod error;
pub mod orm;

pub use config::Config;
pub use error::{Error, Result};
pub use orm::{
    AnyQueryBuilder, BoolFilter, Boolean, BuilderRegistry, DatabaseEntity, DatabaseFilter,
    EntityQuery, FromSqlRow, IntFilter, ModelQueryExt, ModelQuerySupport, Operator,
    OrderDirection, PageInput, PlaceholderStyle, QueryBuilder, SqlValue, StringFilter, Where,
};

pub use model_query_macros::model_query;
