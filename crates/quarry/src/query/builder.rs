//! Query struct and core implementation.

use tracing::trace;

use crate::config::RenderConfig;
use crate::field::FieldList;
use crate::metadata::{EntityRef, SharedResolver};
use crate::Result;

use super::condition::Condition;
use super::factory::ConditionFactory;
use super::helpers::normalize_alias;
use super::join::Join;
use super::types::{OrderDirection, UnionKind};

/// Value of `offset` / `limit` meaning "omit the clause".
pub const UNSET: i64 = -1;

/// A SELECT statement over one root entity.
///
/// The query exclusively owns its projection, joins and condition tree and
/// is mutated through `&mut self` until rendered. Rendering never mutates, so
/// rendering the same query twice yields identical text.
#[derive(Debug, Clone)]
pub struct Query {
    pub(crate) resolver: SharedResolver,
    pub(crate) config: RenderConfig,
    pub(crate) root: EntityRef,
    pub(crate) root_table: String,
    pub(crate) root_alias: Option<String>,
    pub(crate) distinct: bool,
    /// Explicit projection (empty means auto-expand columns)
    pub(crate) projection: FieldList,
    /// Joins in insertion order
    pub(crate) joins: Vec<Join>,
    /// Root of the WHERE condition tree
    pub(crate) where_root: Option<Condition>,
    pub(crate) group_by: FieldList,
    pub(crate) order_by: FieldList,
    pub(crate) order_direction: OrderDirection,
    pub(crate) offset: i64,
    pub(crate) limit: i64,
    /// Next query of a UNION chain
    pub(crate) union: Option<(Box<Query>, UnionKind)>,
}

impl Query {
    /// Creates a query rooted at `entity` with the default render config.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntity` if the resolver does not know the entity.
    pub fn new(resolver: SharedResolver, entity: impl Into<EntityRef>) -> Result<Self> {
        Self::with_config(resolver, entity, RenderConfig::default())
    }

    /// Creates a query rooted at `entity` with an explicit render config.
    pub fn with_config(
        resolver: SharedResolver,
        entity: impl Into<EntityRef>,
        config: RenderConfig,
    ) -> Result<Self> {
        let root = entity.into();
        let root_table = resolver.table_name(&root)?;
        Ok(Self {
            resolver,
            config,
            root,
            root_table,
            root_alias: None,
            distinct: false,
            projection: FieldList::default(),
            joins: Vec::new(),
            where_root: None,
            group_by: FieldList::default(),
            order_by: FieldList::default(),
            order_direction: OrderDirection::Asc,
            offset: UNSET,
            limit: UNSET,
            union: None,
        })
    }

    /// Sets the root alias and rebinds everything already attached that
    /// references the root entity.
    ///
    /// Projection, WHERE tree, GROUP BY, ORDER BY and ON conditions are
    /// rewritten for nodes whose entity is the root entity; joins starting
    /// from the root entity get the new starting alias. Joins starting from
    /// another entity are left alone. An empty alias removes it.
    pub fn set_root_alias(&mut self, alias: &str) -> Result<&mut Self> {
        let alias = normalize_alias(Some(alias))?;
        let root = self.root.clone();
        let new_alias = alias.as_deref();

        self.projection = std::mem::take(&mut self.projection).realias(&root, new_alias);
        self.group_by = std::mem::take(&mut self.group_by).realias(&root, new_alias);
        self.order_by = std::mem::take(&mut self.order_by).realias(&root, new_alias);
        self.where_root = self.where_root.take().map(|c| c.realias(&root, new_alias));

        let rebound = self.joins.iter().filter(|j| j.from == root).count();
        self.joins = std::mem::take(&mut self.joins)
            .into_iter()
            .map(|j| j.realias(&root, new_alias))
            .collect();

        trace!(entity = %root, alias = ?new_alias, rebound_joins = rebound, "Root alias propagated");
        self.root_alias = alias;
        Ok(self)
    }

    /// A condition factory bound to this query's resolver.
    pub fn conditions(&self) -> ConditionFactory {
        ConditionFactory::new(self.resolver.clone())
    }

    pub fn resolver(&self) -> &SharedResolver {
        &self.resolver
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn root(&self) -> &EntityRef {
        &self.root
    }

    pub fn root_table(&self) -> &str {
        &self.root_table
    }

    pub fn root_alias(&self) -> Option<&str> {
        self.root_alias.as_deref()
    }

    /// Alias of the root entity, or its table name.
    pub fn root_owner(&self) -> &str {
        self.root_alias.as_deref().unwrap_or(&self.root_table)
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn projection(&self) -> &FieldList {
        &self.projection
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn where_root(&self) -> Option<&Condition> {
        self.where_root.as_ref()
    }

    pub fn group_by_fields(&self) -> &FieldList {
        &self.group_by
    }

    pub fn order_by_fields(&self) -> &FieldList {
        &self.order_by
    }

    pub fn order_direction(&self) -> OrderDirection {
        self.order_direction
    }

    pub fn offset_value(&self) -> i64 {
        self.offset
    }

    pub fn limit_value(&self) -> i64 {
        self.limit
    }

    /// Next query of the UNION chain, with the set operation joining it.
    pub fn union_tail(&self) -> Option<(&Query, UnionKind)> {
        self.union.as_ref().map(|(q, kind)| (q.as_ref(), *kind))
    }
}
