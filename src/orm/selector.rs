//! Per-entity builder selection
//!
//! An entity declares the builder its queries should use through the return
//! type of [`ModelQuerySupport::query`]. When the entity type is only known
//! at runtime, a [`BuilderRegistry`] built at startup maps entity types to
//! builder constructors and falls back to the generic [`EntityQuery`] for
//! anything it does not know.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

use super::builder::{EntityQuery, QueryBuilder};
use super::predicate::Where;
use super::traits::{DatabaseEntity, SqlValue};
use crate::config::Config;

/// Implemented by entities to choose the builder type of their queries.
///
/// ```rust,ignore
/// impl ModelQuerySupport for User {
///     type Builder = UserQuery;
/// }
///
/// let admins = User::query().where_eq("role", "admin");
/// ```
///
/// Entities without a specialized builder use `type Builder = EntityQuery<Self>;`.
pub trait ModelQuerySupport: DatabaseEntity {
    type Builder: QueryBuilder<Self>;

    /// Wrap an already-constructed query in the declared builder.
    /// Called once per query construction.
    fn new_query_builder(query: EntityQuery<Self>) -> Self::Builder {
        Self::Builder::from_query(query)
    }

    /// Start a new query using the default configuration.
    fn query() -> Self::Builder {
        Self::new_query_builder(EntityQuery::new())
    }

    fn query_with(config: Config) -> Self::Builder {
        Self::new_query_builder(EntityQuery::with_config(config))
    }
}

/// Object-safe view of a builder, used when the builder type is chosen at runtime.
pub trait AnyQueryBuilder<E: DatabaseEntity>: Send {
    /// Type name of the concrete builder.
    fn builder_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn predicates(&self) -> &[Where];

    fn add_predicate(&mut self, node: Where);

    /// Compile to the SELECT statement and its bind values.
    fn compile(&self) -> (String, Vec<SqlValue>);

    fn into_entity_query(self: Box<Self>) -> EntityQuery<E>;
}

impl<E, B> AnyQueryBuilder<E> for B
where
    E: DatabaseEntity,
    B: QueryBuilder<E> + Send + 'static,
{
    fn builder_name(&self) -> &'static str {
        type_name::<B>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn predicates(&self) -> &[Where] {
        self.query().wheres()
    }

    fn add_predicate(&mut self, node: Where) {
        self.query_mut().push_where(node);
    }

    fn compile(&self) -> (String, Vec<SqlValue>) {
        self.to_sql()
    }

    fn into_entity_query(self: Box<Self>) -> EntityQuery<E> {
        (*self).into_query()
    }
}

impl<E: DatabaseEntity> dyn AnyQueryBuilder<E> {
    pub fn is<B: 'static>(&self) -> bool {
        self.as_any().is::<B>()
    }

    pub fn downcast_ref<B: 'static>(&self) -> Option<&B> {
        self.as_any().downcast_ref::<B>()
    }

    /// Recover the concrete builder, or `None` if it is not a `B`.
    pub fn downcast<B: 'static>(self: Box<Self>) -> Option<B> {
        self.into_any().downcast::<B>().ok().map(|b| *b)
    }
}

type Construct<E> = fn(EntityQuery<E>) -> Box<dyn AnyQueryBuilder<E>>;

fn construct<E, B>(query: EntityQuery<E>) -> Box<dyn AnyQueryBuilder<E>>
where
    E: DatabaseEntity,
    B: QueryBuilder<E> + Send + 'static,
{
    Box::new(B::from_query(query))
}

struct Registration {
    builder: &'static str,
    /// Holds a `Construct<E>` for the entity the entry is keyed by
    construct: Box<dyn Any + Send + Sync>,
}

/// Startup-configured mapping from entity type to builder constructor.
pub struct BuilderRegistry {
    config: Config,
    builders: HashMap<TypeId, Registration>,
}

impl BuilderRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            builders: HashMap::new(),
        }
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Use `B` for every query on `E`. Replaces any earlier registration.
    pub fn register<E, B>(&mut self) -> &mut Self
    where
        E: DatabaseEntity,
        B: QueryBuilder<E> + Send + 'static,
    {
        let ctor: Construct<E> = construct::<E, B>;
        tracing::trace!(
            entity = type_name::<E>(),
            builder = type_name::<B>(),
            "Registering query builder"
        );
        self.builders.insert(
            TypeId::of::<E>(),
            Registration {
                builder: type_name::<B>(),
                construct: Box::new(ctor),
            },
        );
        self
    }

    /// Register the builder an entity declares through [`ModelQuerySupport`].
    pub fn register_model<E>(&mut self) -> &mut Self
    where
        E: ModelQuerySupport,
        E::Builder: Send + 'static,
    {
        self.register::<E, E::Builder>()
    }

    pub fn is_registered<E: DatabaseEntity>(&self) -> bool {
        self.builders.contains_key(&TypeId::of::<E>())
    }

    /// Type name of the builder `E` resolves to.
    pub fn builder_name<E: DatabaseEntity>(&self) -> &'static str {
        self.builders
            .get(&TypeId::of::<E>())
            .map(|r| r.builder)
            .unwrap_or_else(type_name::<EntityQuery<E>>)
    }

    /// Wrap `query` in the builder registered for `E`.
    ///
    /// Unknown entities, and entries whose constructor does not fit `E`,
    /// get the generic [`EntityQuery`].
    pub fn builder_for<E: DatabaseEntity>(
        &self,
        query: EntityQuery<E>,
    ) -> Box<dyn AnyQueryBuilder<E>> {
        let Some(registration) = self.builders.get(&TypeId::of::<E>()) else {
            tracing::debug!(
                entity = type_name::<E>(),
                "No query builder registered, using generic builder"
            );
            return Box::new(query);
        };

        match registration.construct.downcast_ref::<Construct<E>>() {
            Some(construct) => {
                tracing::trace!(
                    entity = type_name::<E>(),
                    builder = registration.builder,
                    "Selected query builder"
                );
                construct(query)
            }
            None => {
                tracing::debug!(
                    entity = type_name::<E>(),
                    builder = registration.builder,
                    "Registered query builder does not fit entity, using generic builder"
                );
                Box::new(query)
            }
        }
    }

    /// Start a new query for `E` using this registry's config.
    pub fn query<E: DatabaseEntity>(&self) -> Box<dyn AnyQueryBuilder<E>> {
        self.builder_for(EntityQuery::with_config(self.config))
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let builders: Vec<&str> = self.builders.values().map(|r| r.builder).collect();
        f.debug_struct("BuilderRegistry")
            .field("config", &self.config)
            .field("builders", &builders)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::{Boolean, ModelQueryExt, PlaceholderStyle};

    struct Order;

    impl DatabaseEntity for Order {
        const TABLE_NAME: &'static str = "orders";
        const PRIMARY_KEY: &'static str = "id";
        const DEFAULT_SORT: &'static str = "id";

        fn column_names() -> &'static [&'static str] {
            &["id", "reference"]
        }
    }

    struct OrderQuery(EntityQuery<Order>);

    impl QueryBuilder<Order> for OrderQuery {
        fn from_query(query: EntityQuery<Order>) -> Self {
            Self(query)
        }

        fn query(&self) -> &EntityQuery<Order> {
            &self.0
        }

        fn query_mut(&mut self) -> &mut EntityQuery<Order> {
            &mut self.0
        }

        fn into_query(self) -> EntityQuery<Order> {
            self.0
        }
    }

    impl ModelQueryExt<Order> for OrderQuery {}

    impl ModelQuerySupport for Order {
        type Builder = OrderQuery;
    }

    struct Invoice;

    impl DatabaseEntity for Invoice {
        const TABLE_NAME: &'static str = "invoices";
        const PRIMARY_KEY: &'static str = "id";
        const DEFAULT_SORT: &'static str = "id";

        fn column_names() -> &'static [&'static str] {
            &["id"]
        }
    }

    impl ModelQuerySupport for Invoice {
        type Builder = EntityQuery<Invoice>;
    }

    #[test]
    fn test_declared_builder_from_factory() {
        let query: OrderQuery = Order::query();
        let query = query.field_contains("reference", "A-1");
        assert_eq!(query.query().wheres().len(), 1);
    }

    #[test]
    fn test_registered_builder_is_exact_type() {
        let mut registry = BuilderRegistry::default();
        registry.register_model::<Order>();

        let builder = registry.query::<Order>();
        assert!(builder.is::<OrderQuery>());
        assert!(!builder.is::<EntityQuery<Order>>());
        assert_eq!(builder.builder_name(), type_name::<OrderQuery>());

        let concrete = builder.downcast::<OrderQuery>().unwrap();
        let concrete = concrete.where_any(|q| q.where_eq("id", 1).where_eq("id", 2));
        assert_eq!(concrete.query().wheres()[0].boolean(), Boolean::And);
    }

    #[test]
    fn test_generic_declaration_yields_default() {
        let mut registry = BuilderRegistry::default();
        registry.register_model::<Invoice>();
        assert!(registry.query::<Invoice>().is::<EntityQuery<Invoice>>());
    }

    #[test]
    fn test_miss_falls_back_to_default() {
        let registry = BuilderRegistry::default();
        assert!(!registry.is_registered::<Order>());
        let builder = registry.query::<Order>();
        assert!(builder.is::<EntityQuery<Order>>());
        assert_eq!(registry.builder_name::<Order>(), type_name::<EntityQuery<Order>>());
    }

    #[test]
    fn test_mismatched_constructor_falls_back_to_default() {
        let mut registry = BuilderRegistry::default();
        let wrong: Construct<Invoice> = construct::<Invoice, EntityQuery<Invoice>>;
        registry.builders.insert(
            TypeId::of::<Order>(),
            Registration {
                builder: "broken",
                construct: Box::new(wrong),
            },
        );
        let builder = registry.query::<Order>();
        assert!(builder.is::<EntityQuery<Order>>());
    }

    #[test]
    fn test_registry_config_reaches_builder() {
        let config = Config {
            placeholder_style: PlaceholderStyle::Dollar,
            ..Config::default()
        };
        let mut registry = BuilderRegistry::new(config);
        registry.register::<Order, OrderQuery>();

        let mut builder = registry.query::<Order>();
        builder.add_predicate(Where::Null {
            column: "reference".into(),
            negated: true,
            boolean: Boolean::And,
        });
        let (sql, values) = builder.compile();
        assert_eq!(sql, "SELECT id, reference FROM orders WHERE reference IS NOT NULL");
        assert!(values.is_empty());
        assert_eq!(builder.predicates().len(), 1);
        assert_eq!(builder.into_entity_query().config(), config);
    }
}
