//! Construction of validated conditions.

use crate::field::Field;
use crate::metadata::{EntityRef, SharedResolver};
use crate::types::Value;
use crate::{QuarryError, Result};

use super::builder::Query;
use super::condition::{Condition, ConditionNode};
use super::helpers::normalize_alias;
use super::types::{ContainsPosition, Operator};

fn shape_error(message: impl Into<String>) -> QuarryError {
    QuarryError::InvalidConditionShape(message.into())
}

/// Builds conditions, resolving field names through the shared resolver.
///
/// Every entry point validates operator and arity eagerly and fails with
/// `InvalidConditionShape`; unknown fields fail with `UnknownField`.
#[derive(Debug, Clone)]
pub struct ConditionFactory {
    resolver: SharedResolver,
}

impl ConditionFactory {
    pub fn new(resolver: SharedResolver) -> Self {
        Self { resolver }
    }

    /// Scalar entry point for `=`, `<>`, `in`, `not in` and `between`.
    ///
    /// `in` / `not in` take exactly one list value, `between` exactly two
    /// scalar values, the others exactly one scalar value.
    pub fn condition(
        &self,
        entity: &EntityRef,
        alias: Option<&str>,
        operator: Operator,
        field: &str,
        values: Vec<Value>,
    ) -> Result<Condition> {
        match operator {
            Operator::Eq | Operator::Ne | Operator::In | Operator::NotIn => {
                let value = single_value(operator, values)?;
                if operator.is_list() && !value.is_list() {
                    return Err(shape_error(format!(
                        "'{}' requires a list value, got {}",
                        operator,
                        value.kind_name()
                    )));
                }
                if matches!(&value, Value::List(items) if items.is_empty()) {
                    return Err(shape_error(format!(
                        "'{}' requires a non-empty list",
                        operator
                    )));
                }
                if !operator.is_list() && value.is_list() {
                    return Err(shape_error(format!(
                        "'{}' requires a scalar value, got a list",
                        operator
                    )));
                }
                let target = self.field(entity, alias, field)?;
                Ok(Condition::new(ConditionNode::Simple {
                    target,
                    operator,
                    value,
                }))
            }
            Operator::Between => {
                if values.len() != 2 {
                    return Err(shape_error(format!(
                        "'between' requires exactly two values, got {}",
                        values.len()
                    )));
                }
                if values.iter().any(Value::is_list) {
                    return Err(shape_error("'between' bounds must be scalar values"));
                }
                let mut values = values.into_iter();
                let (low, high) = match (values.next(), values.next()) {
                    (Some(low), Some(high)) => (low, high),
                    _ => return Err(shape_error("'between' requires exactly two values")),
                };
                let target = self.field(entity, alias, field)?;
                Ok(Condition::new(ConditionNode::Between { target, low, high }))
            }
            Operator::And | Operator::Or => Err(shape_error(format!(
                "'{}' conditions must be built with the boolean entry point",
                operator
            ))),
            Operator::Like | Operator::ILike => Err(shape_error(format!(
                "'{}' conditions must be built with the contains entry point",
                operator
            ))),
        }
    }

    /// Pattern-match entry point for `like` / `ilike`.
    pub fn contains(
        &self,
        entity: &EntityRef,
        alias: Option<&str>,
        position: ContainsPosition,
        operator: Operator,
        field: &str,
        value: Value,
    ) -> Result<Condition> {
        if !operator.is_pattern() {
            return Err(shape_error(format!(
                "The contains entry point only accepts 'like' and 'ilike', got '{}'",
                operator
            )));
        }
        if matches!(value, Value::List(_) | Value::Null) {
            return Err(shape_error(format!(
                "'{}' requires a single non-null value, got {}",
                operator,
                value.kind_name()
            )));
        }
        let target = self.field(entity, alias, field)?;
        Ok(Condition::new(ConditionNode::Contains {
            target,
            operator,
            position,
            value,
        }))
    }

    /// Boolean entry point: AND / OR over one or more children.
    pub fn boolean(&self, operator: Operator, children: Vec<Condition>) -> Result<Condition> {
        if !operator.is_boolean() {
            return Err(shape_error(format!(
                "The boolean entry point only accepts 'and' and 'or', got '{}'",
                operator
            )));
        }
        if children.is_empty() {
            return Err(shape_error(format!("'{}' requires at least one child", operator)));
        }
        Ok(Condition::new(ConditionNode::Boolean { operator, children }))
    }

    /// Shorthand for `boolean(Operator::And, children)`.
    pub fn and(&self, children: Vec<Condition>) -> Result<Condition> {
        self.boolean(Operator::And, children)
    }

    /// Shorthand for `boolean(Operator::Or, children)`.
    pub fn or(&self, children: Vec<Condition>) -> Result<Condition> {
        self.boolean(Operator::Or, children)
    }

    /// Column-to-column predicate for a join's ON clause.
    #[allow(clippy::too_many_arguments)]
    pub fn join_predicate(
        &self,
        from: &EntityRef,
        from_alias: Option<&str>,
        joined: &EntityRef,
        joined_alias: Option<&str>,
        operator: Operator,
        from_property: &str,
        joined_property: &str,
    ) -> Result<Condition> {
        if !matches!(operator, Operator::Eq | Operator::Ne) {
            return Err(shape_error(format!(
                "Join predicates only accept '=' and '<>', got '{}'",
                operator
            )));
        }
        let from = self.field(from, from_alias, from_property)?;
        let joined = self.field(joined, joined_alias, joined_property)?;
        Ok(Condition::new(ConditionNode::JoinPredicate {
            from,
            operator,
            joined,
        }))
    }

    /// Compares a column against the result of a nested query.
    pub fn subselect(
        &self,
        entity: &EntityRef,
        alias: Option<&str>,
        field: &str,
        operator: Operator,
        inner: Query,
    ) -> Result<Condition> {
        if !matches!(
            operator,
            Operator::Eq | Operator::Ne | Operator::In | Operator::NotIn
        ) {
            return Err(shape_error(format!(
                "Subselect conditions only accept '=', '<>', 'in' and 'not in', got '{}'",
                operator
            )));
        }
        let target = self.field(entity, alias, field)?;
        Ok(Condition::new(ConditionNode::Subselect {
            target,
            operator,
            inner: Box::new(inner),
        }))
    }

    fn field(&self, entity: &EntityRef, alias: Option<&str>, name: &str) -> Result<Field> {
        let alias = normalize_alias(alias)?;
        Field::resolve(self.resolver.as_ref(), entity, alias.as_deref(), name)
    }
}

fn single_value(operator: Operator, values: Vec<Value>) -> Result<Value> {
    let count = values.len();
    let mut values = values.into_iter();
    match (values.next(), values.next()) {
        (Some(value), None) => Ok(value),
        _ => Err(shape_error(format!(
            "'{}' requires exactly one value, got {}",
            operator, count
        ))),
    }
}
