//! JOIN clause types and utilities.

use crate::config::RenderConfig;
use crate::metadata::{EntityRef, MetadataResolver};
use crate::Result;

use super::condition::{render_conjunction, Condition, ConditionNode};
use super::factory::ConditionFactory;
use super::types::{JoinKind, Operator};

/// A join from one entity to another.
///
/// Once a column-to-column predicate is added, the ON conditions are
/// rendered verbatim, AND-joined in insertion order. Otherwise the join key
/// is inferred from the resolver at render time, through the navigation
/// property when one was given, and any filter conditions follow it.
#[derive(Debug, Clone)]
pub struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) from: EntityRef,
    pub(crate) from_table: String,
    pub(crate) from_alias: Option<String>,
    pub(crate) joined: EntityRef,
    pub(crate) joined_table: String,
    pub(crate) joined_alias: Option<String>,
    pub(crate) property: Option<String>,
    pub(crate) on: Vec<Condition>,
}

impl Join {
    /// Resolves both tables eagerly so unknown entities fail at construction.
    pub(crate) fn new(
        resolver: &dyn MetadataResolver,
        from: EntityRef,
        from_alias: Option<String>,
        joined: EntityRef,
        joined_alias: Option<String>,
        property: Option<String>,
        kind: JoinKind,
    ) -> Result<Self> {
        let from_table = resolver.table_name(&from)?;
        let joined_table = resolver.table_name(&joined)?;
        Ok(Self {
            kind,
            from,
            from_table,
            from_alias,
            joined,
            joined_table,
            joined_alias,
            property: property.filter(|p| !p.is_empty()),
            on: Vec::new(),
        })
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn from(&self) -> &EntityRef {
        &self.from
    }

    pub fn joined(&self) -> &EntityRef {
        &self.joined
    }

    pub fn from_alias(&self) -> Option<&str> {
        self.from_alias.as_deref()
    }

    pub fn joined_alias(&self) -> Option<&str> {
        self.joined_alias.as_deref()
    }

    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    pub fn on_conditions(&self) -> &[Condition] {
        &self.on
    }

    /// Alias of the starting side, or its table name.
    pub fn from_owner(&self) -> &str {
        self.from_alias.as_deref().unwrap_or(&self.from_table)
    }

    /// Alias of the joined side, or its table name.
    pub fn joined_owner(&self) -> &str {
        self.joined_alias.as_deref().unwrap_or(&self.joined_table)
    }

    pub(crate) fn realias(self, entity: &EntityRef, alias: Option<&str>) -> Self {
        let from_alias = if &self.from == entity {
            alias.map(str::to_string)
        } else {
            self.from_alias
        };
        Self {
            from_alias,
            on: self
                .on
                .into_iter()
                .map(|c| c.realias(entity, alias))
                .collect(),
            ..self
        }
    }

    /// `<kind> <table> [<alias>] ON <on-clause>`
    pub(crate) fn to_sql(&self, resolver: &dyn MetadataResolver, config: &RenderConfig) -> Result<String> {
        let table_ref = match &self.joined_alias {
            Some(alias) => format!("{} {}", self.joined_table, alias),
            None => self.joined_table.clone(),
        };
        Ok(format!(
            "{} {} ON {}",
            self.kind.to_sql(),
            table_ref,
            self.on_sql(resolver, config)?
        ))
    }

    fn on_sql(&self, resolver: &dyn MetadataResolver, config: &RenderConfig) -> Result<String> {
        if self.has_join_predicate() {
            return render_conjunction(None, &self.on, config);
        }
        let key = resolver.infer_join_key(&self.from, &self.joined, self.property.as_deref())?;
        let inferred = format!(
            "{}.{} = {}.{}",
            self.from_owner(),
            key.from_column,
            self.joined_owner(),
            key.joined_column
        );
        render_conjunction(Some(inferred), &self.on, config)
    }

    /// True once an explicit column-to-column predicate links both sides.
    pub fn has_join_predicate(&self) -> bool {
        self.on
            .iter()
            .any(|c| matches!(c.node(), ConditionNode::JoinPredicate { .. }))
    }
}

/// Mutable access to a join just attached to a query.
#[derive(Debug)]
pub struct JoinHandle<'q> {
    join: &'q mut Join,
    factory: ConditionFactory,
}

impl<'q> JoinHandle<'q> {
    pub(crate) fn new(join: &'q mut Join, factory: ConditionFactory) -> Self {
        Self { join, factory }
    }

    /// Adds `<from>.<from_property> <op> <joined>.<joined_property>` to the
    /// ON clause. Once such a predicate exists, inference is skipped.
    pub fn on(&mut self, operator: Operator, from_property: &str, joined_property: &str) -> Result<&mut Self> {
        let condition = self.factory.join_predicate(
            &self.join.from,
            self.join.from_alias.as_deref(),
            &self.join.joined,
            self.join.joined_alias.as_deref(),
            operator,
            from_property,
            joined_property,
        )?;
        self.join.on.push(condition);
        Ok(self)
    }

    /// Adds a filter condition to the ON clause, rendered after the join key.
    pub fn on_condition(&mut self, condition: Condition) -> &mut Self {
        self.join.on.push(condition);
        self
    }

    /// Owner (alias or table) used to qualify columns of the joined entity.
    pub fn joined_owner(&self) -> &str {
        self.join.joined_owner()
    }

    pub fn join(&self) -> &Join {
        self.join
    }
}
