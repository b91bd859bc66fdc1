//! SELECT building and rendering methods for Query.

use std::borrow::Cow;
use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::field::Field;
use crate::metadata::EntityRef;
use crate::types::Value;
use crate::{QuarryError, Result};

use super::builder::Query;
use super::condition::Condition;
use super::helpers::normalize_alias;
use super::join::{Join, JoinHandle};
use super::types::{ContainsPosition, JoinKind, Operator, OrderDirection, UnionKind};

impl Query {
    /// Toggles `SELECT DISTINCT`.
    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    /// Adds a column of the root entity to the projection.
    pub fn select(&mut self, field: &str) -> Result<&mut Self> {
        let field = self.root_field(field)?;
        self.projection.push(field);
        Ok(self)
    }

    /// Adds a column of any entity to the projection.
    ///
    /// # Arguments
    ///
    /// * `entity` - Entity owning the field
    /// * `alias` - Alias the entity is known by in this statement, if any
    /// * `field` - Field name, resolved to a column through the resolver
    pub fn select_of(
        &mut self,
        entity: impl Into<EntityRef>,
        alias: Option<&str>,
        field: &str,
    ) -> Result<&mut Self> {
        let field = self.foreign_field(entity.into(), alias, field)?;
        self.projection.push(field);
        Ok(self)
    }

    /// Empties the projection, re-enabling column auto-expansion.
    pub fn clear_select(&mut self) -> &mut Self {
        self.projection.clear();
        self
    }

    /// Replaces the WHERE condition.
    pub fn where_condition(&mut self, condition: Condition) -> &mut Self {
        self.where_root = Some(condition);
        self
    }

    /// ANDs `condition` onto the existing WHERE condition, or sets it.
    pub fn and_where(&mut self, condition: Condition) -> &mut Self {
        self.where_root = Some(match self.where_root.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Removes the WHERE condition.
    pub fn clear_where(&mut self) -> &mut Self {
        self.where_root = None;
        self
    }

    /// Replaces the WHERE condition with `<root>.<field> <op> <values>`.
    ///
    /// Shape rules are the factory's: `in` / `not in` take one list value,
    /// `between` two scalars, `=` / `<>` one scalar.
    pub fn where_op(&mut self, operator: Operator, field: &str, values: Vec<Value>) -> Result<&mut Self> {
        let condition = self.conditions().condition(
            &self.root,
            self.root_alias.as_deref(),
            operator,
            field,
            values,
        )?;
        Ok(self.where_condition(condition))
    }

    /// Shorthand for `where_op(Operator::Eq, field, vec![value])`.
    pub fn where_eq(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.where_op(Operator::Eq, field, vec![value.into()])
    }

    /// Replaces the WHERE condition with a LIKE / ILIKE match on a root field.
    pub fn where_contains(
        &mut self,
        position: ContainsPosition,
        operator: Operator,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        let condition = self.conditions().contains(
            &self.root,
            self.root_alias.as_deref(),
            position,
            operator,
            field,
            value.into(),
        )?;
        Ok(self.where_condition(condition))
    }

    /// Replaces the WHERE condition with `<root>.<field> <op> (<inner>)`.
    pub fn where_subselect(&mut self, operator: Operator, field: &str, inner: Query) -> Result<&mut Self> {
        let condition = self.conditions().subselect(
            &self.root,
            self.root_alias.as_deref(),
            field,
            operator,
            inner,
        )?;
        Ok(self.where_condition(condition))
    }

    /// Joins `joined` from the root entity.
    ///
    /// The join starts from the root under its current alias; a later
    /// [`set_root_alias`](Query::set_root_alias) rebinds it. Without explicit
    /// ON conditions the join key is inferred at render time, through
    /// `property` when given.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut query = Query::new(registry.shared(), "Person")?;
    /// query.add_join("Address", Some("a"), Some("address"), None)?;
    /// query.set_root_alias("p")?;
    /// // SELECT ... FROM person AS p INNER JOIN address a ON p.address_id = a.id
    /// ```
    pub fn add_join(
        &mut self,
        joined: impl Into<EntityRef>,
        alias: Option<&str>,
        property: Option<&str>,
        kind: Option<JoinKind>,
    ) -> Result<JoinHandle<'_>> {
        let from = self.root.clone();
        let from_alias = self.root_alias.clone();
        self.push_join(from, from_alias, joined.into(), alias, property, kind)
    }

    /// Joins `joined` from an entity other than the root, typically one that
    /// is already joined. Alias propagation never touches such joins.
    pub fn add_join_from(
        &mut self,
        from: impl Into<EntityRef>,
        from_alias: Option<&str>,
        joined: impl Into<EntityRef>,
        alias: Option<&str>,
        property: Option<&str>,
        kind: Option<JoinKind>,
    ) -> Result<JoinHandle<'_>> {
        let from_alias = normalize_alias(from_alias)?;
        self.push_join(from.into(), from_alias, joined.into(), alias, property, kind)
    }

    fn push_join(
        &mut self,
        from: EntityRef,
        from_alias: Option<String>,
        joined: EntityRef,
        alias: Option<&str>,
        property: Option<&str>,
        kind: Option<JoinKind>,
    ) -> Result<JoinHandle<'_>> {
        let joined_alias = normalize_alias(alias)?;
        let join = Join::new(
            self.resolver.as_ref(),
            from,
            from_alias,
            joined,
            joined_alias,
            property.map(str::to_string),
            kind.unwrap_or_default(),
        )?;
        debug!(from = %join.from, joined = %join.joined, kind = ?join.kind, "Join added");

        let factory = self.conditions();
        self.joins.push(join);
        let index = self.joins.len() - 1;
        Ok(JoinHandle::new(&mut self.joins[index], factory))
    }

    /// Adds a root field to GROUP BY.
    pub fn group_by(&mut self, field: &str) -> Result<&mut Self> {
        let field = self.root_field(field)?;
        self.group_by.push(field);
        Ok(self)
    }

    /// Adds a field of any entity to GROUP BY.
    pub fn group_by_of(
        &mut self,
        entity: impl Into<EntityRef>,
        alias: Option<&str>,
        field: &str,
    ) -> Result<&mut Self> {
        let field = self.foreign_field(entity.into(), alias, field)?;
        self.group_by.push(field);
        Ok(self)
    }

    /// Adds a root field to ORDER BY, optionally setting the direction.
    ///
    /// The direction applies to the whole ORDER BY list.
    pub fn order_by(&mut self, field: &str, direction: Option<OrderDirection>) -> Result<&mut Self> {
        let field = self.root_field(field)?;
        self.order_by.push(field);
        if let Some(direction) = direction {
            self.order_direction = direction;
        }
        Ok(self)
    }

    /// Adds a field of any entity to ORDER BY.
    pub fn order_by_of(
        &mut self,
        entity: impl Into<EntityRef>,
        alias: Option<&str>,
        field: &str,
    ) -> Result<&mut Self> {
        let field = self.foreign_field(entity.into(), alias, field)?;
        self.order_by.push(field);
        Ok(self)
    }

    pub fn set_order_direction(&mut self, direction: OrderDirection) -> &mut Self {
        self.order_direction = direction;
        self
    }

    /// Sets OFFSET; `-1` omits the clause.
    pub fn offset(&mut self, offset: i64) -> &mut Self {
        self.offset = offset;
        self
    }

    /// Sets LIMIT; `-1` omits the clause.
    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.limit = limit;
        self
    }

    /// Attaches `other` as the tail of this query, replacing any previous
    /// tail. `other` may carry its own tail.
    ///
    /// Each query owns its tail, so a chain cannot loop back on itself.
    pub fn union(&mut self, other: Query, kind: UnionKind) -> &mut Self {
        self.union = Some((Box::new(other), kind));
        self
    }

    /// Renders the statement, followed by the whole UNION chain.
    ///
    /// Rendering reads the query only: rendering twice without mutation in
    /// between produces identical text.
    ///
    /// # Errors
    ///
    /// Join-key inference runs here and fails with `NoRelationship` or
    /// `AmbiguousRelationship`.
    #[instrument(skip(self), fields(entity = %self.root))]
    pub fn render(&self) -> Result<String> {
        let mut sql = self.render_single()?;
        let mut tail = self.union.as_ref();
        while let Some((next, kind)) = tail {
            sql.push_str(kind.to_sql());
            sql.push_str(&next.render_single()?);
            tail = next.union.as_ref();
        }
        debug!(length = sql.len(), "Rendered SELECT statement");
        Ok(sql)
    }

    fn render_single(&self) -> Result<String> {
        let plan = self.plan()?;

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if self.projection.is_empty() {
            sql.push_str(&self.expanded_columns(&plan)?);
        } else {
            sql.push_str(&self.projection.to_sql());
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.root_table);
        if let Some(alias) = &self.root_alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }

        for join in plan.joins.iter() {
            sql.push(' ');
            sql.push_str(&join.to_sql(self.resolver.as_ref(), &self.config)?);
        }

        if let Some(condition) = &self.where_root {
            sql.push_str(" WHERE ");
            sql.push_str(&condition.to_sql(&self.config)?);
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.to_sql());
        }

        if !self.order_by.is_empty() {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                self.order_by.to_sql(),
                self.order_direction.to_sql()
            ));
        }

        if self.offset > -1 {
            sql.push_str(&format!(" OFFSET {}", self.offset));
        }
        if self.limit > -1 {
            sql.push_str(&format!(" LIMIT {}", self.limit));
        }

        Ok(sql)
    }

    /// Attached joins plus the supertype joins auto-expansion needs.
    ///
    /// With an empty projection, every level of the root's supertype chain
    /// gets an INNER join unless one from the same entity already exists.
    /// A supertype stored in the same table as its subtype is not joined;
    /// its columns are read through the subtype's owner instead.
    fn plan(&self) -> Result<RenderPlan<'_>> {
        let mut plan = RenderPlan {
            joins: Cow::Borrowed(self.joins.as_slice()),
            shared_table: Vec::new(),
        };
        if !self.projection.is_empty() {
            return Ok(plan);
        }

        let mut synthesized = Vec::new();
        let mut current = self.root.clone();
        let mut current_alias = self.root_alias.clone();
        let mut seen = HashSet::from([current.clone()]);

        while let Some(parent) = self.resolver.super_type_of(&current) {
            if !seen.insert(parent.clone()) {
                return Err(QuarryError::Schema(format!(
                    "Supertype chain of '{}' is cyclic at '{}'",
                    self.root, parent
                )));
            }
            let existing = self
                .joins
                .iter()
                .find(|j| j.from == current && j.joined == parent);
            let next_alias = match existing {
                Some(join) => join.joined_alias.clone(),
                None => {
                    let current_table = self.resolver.table_name(&current)?;
                    let parent_table = self.resolver.table_name(&parent)?;
                    if current_table == parent_table {
                        debug!(entity = %current, supertype = %parent, table = %parent_table,
                            "Supertype shares its table, no join needed");
                        let owner = current_alias.clone().unwrap_or(parent_table);
                        plan.shared_table.push((parent.clone(), owner));
                        current_alias.clone()
                    } else {
                        debug!(entity = %current, supertype = %parent, "Synthesizing supertype join");
                        synthesized.push(Join::new(
                            self.resolver.as_ref(),
                            current.clone(),
                            current_alias.clone(),
                            parent.clone(),
                            None,
                            None,
                            JoinKind::Inner,
                        )?);
                        None
                    }
                }
            };
            current = parent;
            current_alias = next_alias;
        }

        if !synthesized.is_empty() {
            let mut joins = self.joins.clone();
            joins.extend(synthesized);
            plan.joins = Cow::Owned(joins);
        }
        Ok(plan)
    }

    /// Root columns, then columns of same-table supertypes not already
    /// listed, then each joined entity's columns, qualified by their owners.
    fn expanded_columns(&self, plan: &RenderPlan<'_>) -> Result<String> {
        let mut parts = Vec::new();
        qualify(&mut parts, self.root_owner(), self.resolver.columns(&self.root)?);
        for (entity, owner) in &plan.shared_table {
            let columns: Vec<String> = self
                .resolver
                .columns(entity)?
                .into_iter()
                .filter(|c| !parts.contains(&format!("{}.{}", owner, c)))
                .collect();
            if !columns.is_empty() {
                qualify(&mut parts, owner, columns);
            }
        }
        for join in plan.joins.iter() {
            qualify(&mut parts, join.joined_owner(), self.resolver.columns(&join.joined)?);
        }
        Ok(parts.join(", "))
    }

    fn root_field(&self, name: &str) -> Result<Field> {
        Field::resolve(
            self.resolver.as_ref(),
            &self.root,
            self.root_alias.as_deref(),
            name,
        )
    }

    fn foreign_field(&self, entity: EntityRef, alias: Option<&str>, name: &str) -> Result<Field> {
        let alias = normalize_alias(alias)?;
        Field::resolve(self.resolver.as_ref(), &entity, alias.as_deref(), name)
    }
}

/// What a single statement renders, computed without touching the query.
struct RenderPlan<'q> {
    joins: Cow<'q, [Join]>,
    /// Supertypes sharing their subtype's table, with the owner qualifying
    /// their columns
    shared_table: Vec<(EntityRef, String)>,
}

fn qualify(parts: &mut Vec<String>, owner: &str, columns: Vec<String>) {
    if columns.is_empty() {
        parts.push(format!("{}.*", owner));
    } else {
        parts.extend(columns.into_iter().map(|c| format!("{}.{}", owner, c)));
    }
}
