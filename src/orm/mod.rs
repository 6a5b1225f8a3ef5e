//! Entity query layer
//!
//! Provides the generic query builder, the extension predicates and the
//! per-entity builder selection:
//! - Predicate tree with AND/OR combinators and nested groups
//! - SQL compilation with configurable placeholder style
//! - Execution through sqlx (SQLite)
//! - Specialized builders chosen per entity type
//!
//! # Example
//!
//! ```rust,ignore
//! model_query!(pub UserQuery, User);
//!
//! impl UserQuery {
//!     pub fn search(self, term: &str) -> Self {
//!         self.where_any(|q| q.field_contains("name", term).field_contains("email", term))
//!     }
//! }
//!
//! impl ModelQuerySupport for User {
//!     type Builder = UserQuery;
//! }
//!
//! let users = User::query()
//!     .where_eq("active", true)
//!     .search("ann")
//!     .fetch_all(&pool)
//!     .await?;
//! ```

mod builder;
mod extension;
pub mod filters;
mod predicate;
mod selector;
mod traits;

pub use builder::*;
pub use extension::*;
pub use filters::{BoolFilter, IntFilter, StringFilter};
pub use predicate::*;
pub use selector::*;
pub use traits::*;
