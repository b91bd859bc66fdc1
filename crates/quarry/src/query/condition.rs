//! Filter conditions.
//!
//! A [`Condition`] is an immutable tree. Leaves compare a column with a
//! literal, a range, a pattern, another column or a nested query; boolean
//! nodes combine children with AND / OR in insertion order. Conditions are
//! only produced by [`ConditionFactory`](super::ConditionFactory), which
//! validates operator and arity up front.

use crate::config::{NestedBooleanStyle, RenderConfig};
use crate::field::Field;
use crate::metadata::EntityRef;
use crate::types::Value;
use crate::Result;

use super::builder::Query;
use super::types::{ContainsPosition, Operator};

/// The variants a condition can take.
#[derive(Debug, Clone)]
pub enum ConditionNode {
    /// `<field> <op> <value>` for =, <>, in, not in
    Simple {
        target: Field,
        operator: Operator,
        value: Value,
    },
    /// `<field> between <low> and <high>`
    Between { target: Field, low: Value, high: Value },
    /// `<field> like|ilike '<pattern>'`
    Contains {
        target: Field,
        operator: Operator,
        position: ContainsPosition,
        value: Value,
    },
    /// Children joined by AND / OR
    Boolean {
        operator: Operator,
        children: Vec<Condition>,
    },
    /// Column-to-column comparison used in ON clauses
    JoinPredicate {
        from: Field,
        operator: Operator,
        joined: Field,
    },
    /// `<field> <op> (<nested query>)`
    Subselect {
        target: Field,
        operator: Operator,
        inner: Box<Query>,
    },
}

/// A validated filter condition.
#[derive(Debug, Clone)]
pub struct Condition {
    node: ConditionNode,
}

impl Condition {
    pub(crate) fn new(node: ConditionNode) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &ConditionNode {
        &self.node
    }

    pub fn operator(&self) -> Operator {
        match &self.node {
            ConditionNode::Simple { operator, .. }
            | ConditionNode::Contains { operator, .. }
            | ConditionNode::Boolean { operator, .. }
            | ConditionNode::JoinPredicate { operator, .. }
            | ConditionNode::Subselect { operator, .. } => *operator,
            ConditionNode::Between { .. } => Operator::Between,
        }
    }

    /// Renders the condition as SQL text.
    pub fn to_sql(&self, config: &RenderConfig) -> Result<String> {
        self.render(config, None)
    }

    /// ANDs `other` onto this condition, extending an existing AND node
    /// instead of nesting a new one.
    pub(crate) fn and(self, other: Condition) -> Condition {
        match self.node {
            ConditionNode::Boolean {
                operator: Operator::And,
                mut children,
            } => {
                children.push(other);
                Condition::new(ConditionNode::Boolean {
                    operator: Operator::And,
                    children,
                })
            }
            node => Condition::new(ConditionNode::Boolean {
                operator: Operator::And,
                children: vec![Condition::new(node), other],
            }),
        }
    }

    /// Rebinds the alias of every node that references `entity`.
    ///
    /// Nested queries of subselects keep their own aliases; only the compared
    /// column is rebound. For join predicates only the starting side moves,
    /// the joined side belongs to the join.
    pub(crate) fn realias(self, entity: &EntityRef, alias: Option<&str>) -> Self {
        let node = match self.node {
            ConditionNode::Simple {
                target,
                operator,
                value,
            } => ConditionNode::Simple {
                target: target.realias(entity, alias),
                operator,
                value,
            },
            ConditionNode::Between { target, low, high } => ConditionNode::Between {
                target: target.realias(entity, alias),
                low,
                high,
            },
            ConditionNode::Contains {
                target,
                operator,
                position,
                value,
            } => ConditionNode::Contains {
                target: target.realias(entity, alias),
                operator,
                position,
                value,
            },
            ConditionNode::Boolean { operator, children } => ConditionNode::Boolean {
                operator,
                children: children
                    .into_iter()
                    .map(|c| c.realias(entity, alias))
                    .collect(),
            },
            ConditionNode::JoinPredicate {
                from,
                operator,
                joined,
            } => ConditionNode::JoinPredicate {
                from: from.realias(entity, alias),
                operator,
                joined,
            },
            ConditionNode::Subselect {
                target,
                operator,
                inner,
            } => ConditionNode::Subselect {
                target: target.realias(entity, alias),
                operator,
                inner,
            },
        };
        Self { node }
    }

    fn render(&self, config: &RenderConfig, parent: Option<Operator>) -> Result<String> {
        let sql = match &self.node {
            ConditionNode::Simple {
                target,
                operator,
                value,
            } => format!("{} {} {}", target.to_sql(), operator.to_sql(), value.to_sql()),
            ConditionNode::Between { target, low, high } => format!(
                "{} between {} and {}",
                target.to_sql(),
                low.to_sql(),
                high.to_sql()
            ),
            ConditionNode::Contains {
                target,
                operator,
                position,
                value,
            } => format!(
                "{} {} '{}'",
                target.to_sql(),
                operator.to_sql(),
                position.wrap(&value.raw_text())
            ),
            ConditionNode::Boolean { operator, children } => {
                let parts = children
                    .iter()
                    .map(|c| c.render(config, Some(*operator)))
                    .collect::<Result<Vec<_>>>()?;
                let joined = parts.join(&format!(" {} ", operator.to_sql()));
                if children.len() > 1 && needs_parens(config.nested_boolean, parent, *operator) {
                    format!("({})", joined)
                } else {
                    joined
                }
            }
            ConditionNode::JoinPredicate {
                from,
                operator,
                joined,
            } => format!("{} {} {}", from.to_sql(), operator.to_sql(), joined.to_sql()),
            ConditionNode::Subselect {
                target,
                operator,
                inner,
            } => format!("{} {} ({})", target.to_sql(), operator.to_sql(), inner.render()?),
        };
        Ok(sql)
    }
}

fn needs_parens(style: NestedBooleanStyle, parent: Option<Operator>, operator: Operator) -> bool {
    match (style, parent) {
        (_, None) => false,
        (NestedBooleanStyle::Always, Some(_)) => true,
        (NestedBooleanStyle::MixedOnly, Some(p)) => p != operator,
        (NestedBooleanStyle::Never, Some(_)) => false,
    }
}

/// Renders `leading` followed by `conditions`, joined by `and`, as for a
/// join's ON clause.
pub(crate) fn render_conjunction(
    leading: Option<String>,
    conditions: &[Condition],
    config: &RenderConfig,
) -> Result<String> {
    let count = conditions.len() + usize::from(leading.is_some());
    let parent = if count > 1 { Some(Operator::And) } else { None };
    let mut parts = Vec::with_capacity(count);
    parts.extend(leading);
    for condition in conditions {
        parts.push(condition.render(config, parent)?);
    }
    Ok(parts.join(" and "))
}
