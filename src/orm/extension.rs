//! Convenience predicates for specialized builders
//!
//! [`ModelQueryExt`] is opt-in: a builder type gains `where_all`, `where_any`
//! and `field_contains` by implementing it (the `model_query!` macro does).

use super::builder::QueryBuilder;
use super::predicate::{Boolean, Where, contains_pattern};
use super::traits::DatabaseEntity;

pub trait ModelQueryExt<E: DatabaseEntity>: QueryBuilder<E> {
    /// Group the predicates added by `f`, keeping their own combinators.
    ///
    /// Same as [`QueryBuilder::where_group_with`].
    fn where_all_with<F>(self, f: F, boolean: Boolean) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.where_group_with(f, boolean)
    }

    fn where_all<F>(self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.where_all_with(f, Boolean::And)
    }

    /// Group the predicates added by `f` so that they are OR'd together.
    ///
    /// Every top-level predicate produced by `f` is rewritten to `OR`
    /// regardless of how it was added; predicates nested deeper keep their
    /// combinators. The group itself is joined to the rest of the query by
    /// `boolean`.
    fn where_any_with<F>(self, f: F, boolean: Boolean) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        let scope = Self::from_query(self.query().detached());
        let captured = f(scope).into_query().into_wheres();
        let rewritten: Vec<Where> = captured
            .into_iter()
            .map(|node| node.with_boolean(Boolean::Or))
            .collect();
        self.attach_group(rewritten, boolean)
    }

    fn where_any<F>(self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.where_any_with(f, Boolean::And)
    }

    /// `field LIKE '%needle%'`, with `%` in `needle` matched literally.
    ///
    /// Only `%` is escaped. `_` stays a single-character wildcard, and a `\`
    /// in `needle` is read as the LIKE escape character, so it escapes the
    /// character after it instead of matching a backslash.
    ///
    /// Intended as a building block for a builder's own named filters.
    fn field_contains(self, field: &str, needle: &str) -> Self {
        self.push_predicate(Where::Like {
            column: field.to_string(),
            pattern: contains_pattern(needle),
            negated: false,
            boolean: Boolean::And,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::{EntityQuery, Operator, SqlValue};

    struct Article;

    impl DatabaseEntity for Article {
        const TABLE_NAME: &'static str = "articles";
        const PRIMARY_KEY: &'static str = "id";
        const DEFAULT_SORT: &'static str = "id";

        fn column_names() -> &'static [&'static str] {
            &["id", "field", "status"]
        }
    }

    struct ArticleQuery(EntityQuery<Article>);

    impl QueryBuilder<Article> for ArticleQuery {
        fn from_query(query: EntityQuery<Article>) -> Self {
            Self(query)
        }

        fn query(&self) -> &EntityQuery<Article> {
            &self.0
        }

        fn query_mut(&mut self) -> &mut EntityQuery<Article> {
            &mut self.0
        }

        fn into_query(self) -> EntityQuery<Article> {
            self.0
        }
    }

    impl ModelQueryExt<Article> for ArticleQuery {}

    fn base() -> ArticleQuery {
        ArticleQuery::from_query(EntityQuery::new()).where_eq("status", "active")
    }

    fn where_clause(query: &ArticleQuery) -> String {
        let (sql, _) = query.to_sql();
        sql.split(" WHERE ").nth(1).unwrap_or_default().to_string()
    }

    #[test]
    fn test_where_any_ors_siblings() {
        let query = base().where_any(|q| q.where_eq("field", "x").where_eq("field", "y"));
        assert_eq!(
            where_clause(&query),
            "status = ?1 AND (field = ?2 OR field = ?3)"
        );
        let (_, values) = query.to_sql();
        assert_eq!(
            values,
            vec![
                SqlValue::from("active"),
                SqlValue::from("x"),
                SqlValue::from("y")
            ]
        );
    }

    #[test]
    fn test_where_any_with_or_joins_group_by_or() {
        let query = base().where_any_with(
            |q| q.where_eq("field", "x").where_eq("field", "y"),
            Boolean::Or,
        );
        assert_eq!(
            where_clause(&query),
            "status = ?1 OR (field = ?2 OR field = ?3)"
        );
    }

    #[test]
    fn test_where_any_rewrites_only_top_level() {
        let query = base().where_any(|q| {
            q.where_op("id", Operator::Gt, 5)
                .where_group(|inner| inner.where_eq("field", "a").where_eq("field", "b"))
        });
        assert_eq!(
            where_clause(&query),
            "status = ?1 AND (id > ?2 OR (field = ?3 AND field = ?4))"
        );
    }

    #[test]
    fn test_where_any_merges_into_single_tree() {
        let query = base().where_any(|q| q.where_eq("field", "x"));
        let wheres = query.query().wheres();
        assert_eq!(wheres.len(), 2);
        match &wheres[1] {
            Where::Nested {
                predicates,
                boolean,
            } => {
                assert_eq!(*boolean, Boolean::And);
                assert_eq!(predicates.len(), 1);
                assert_eq!(predicates[0].boolean(), Boolean::Or);
            }
            other => panic!("expected nested group, got {:?}", other),
        }
    }

    #[test]
    fn test_where_any_with_empty_callback() {
        let query = base().where_any(|q| q);
        assert_eq!(query.query().wheres().len(), 1);
    }

    #[test]
    fn test_where_all_matches_where_group() {
        let via_all = base()
            .where_all(|q| q.where_eq("field", "x").or_where_eq("field", "y"))
            .to_sql();
        let via_group = base()
            .where_group(|q| q.where_eq("field", "x").or_where_eq("field", "y"))
            .to_sql();
        assert_eq!(via_all, via_group);

        let via_all = base().where_all_with(|q| q.where_eq("field", "x"), Boolean::Or);
        let via_group = base().where_group_with(|q| q.where_eq("field", "x"), Boolean::Or);
        assert_eq!(via_all.query().wheres(), via_group.query().wheres());
    }

    #[test]
    fn test_field_contains_escapes_percent() {
        let query = ArticleQuery::from_query(EntityQuery::new()).field_contains("name", "50% off");
        let (sql, values) = query.to_sql();
        assert!(sql.ends_with("WHERE name LIKE ?1 ESCAPE '\\'"));
        assert_eq!(values, vec![SqlValue::String("%50\\% off%".into())]);
    }

    #[test]
    fn test_field_contains_leaves_backslash_unescaped() {
        let query = ArticleQuery::from_query(EntityQuery::new())
            .field_contains("path", "C:\\")
            .field_contains("path", "a\\b");
        let (_, values) = query.to_sql();
        assert_eq!(
            values,
            vec![
                SqlValue::String("%C:\\%".into()),
                SqlValue::String("%a\\b%".into())
            ]
        );
    }

    #[test]
    fn test_field_contains_plain_term() {
        let query = ArticleQuery::from_query(EntityQuery::new()).field_contains("name", "bob");
        let (_, values) = query.to_sql();
        assert_eq!(values, vec![SqlValue::String("%bob%".into())]);
    }
}
