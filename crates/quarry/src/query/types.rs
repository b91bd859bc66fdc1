//! Query builder types and enums.

use std::fmt;

/// Condition operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// IN list
    In,
    /// NOT IN list
    NotIn,
    /// Inclusive range
    Between,
    /// LIKE pattern matching
    Like,
    /// ILIKE case-insensitive pattern matching
    ILike,
    /// Logical conjunction
    And,
    /// Logical disjunction
    Or,
}

impl Operator {
    /// Returns the SQL operator string.
    pub fn to_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Between => "between",
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::And => "and",
            Operator::Or => "or",
        }
    }

    /// AND / OR
    pub fn is_boolean(&self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }

    /// IN / NOT IN
    pub fn is_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// LIKE / ILIKE
    pub fn is_pattern(&self) -> bool {
        matches!(self, Operator::Like | Operator::ILike)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

/// Where the wildcard goes around a LIKE value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainsPosition {
    /// Value at the start: `value%`
    Start,
    /// Value anywhere: `%value%`
    Any,
    /// Value at the end: `%value`
    End,
}

impl ContainsPosition {
    /// Wraps `value` with `%` markers.
    pub fn wrap(&self, value: &str) -> String {
        match self {
            ContainsPosition::Start => format!("{}%", value),
            ContainsPosition::Any => format!("%{}%", value),
            ContainsPosition::End => format!("%{}", value),
        }
    }
}

/// Sort order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order
    #[default]
    Asc,
    /// Descending order
    Desc,
}

impl OrderDirection {
    /// Returns the SQL order direction string.
    pub fn to_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Type of SQL JOIN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// INNER JOIN
    #[default]
    Inner,
    /// LEFT JOIN
    Left,
    /// RIGHT JOIN
    Right,
}

impl JoinKind {
    /// Returns the SQL JOIN type string.
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// Set operation combining two queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnionKind {
    /// UNION - combines results, removes duplicates
    #[default]
    Union,
    /// UNION ALL - combines results, keeps duplicates
    UnionAll,
}

impl UnionKind {
    /// Returns the SQL set operation string.
    pub fn to_sql(&self) -> &'static str {
        match self {
            UnionKind::Union => " UNION ",
            UnionKind::UnionAll => " UNION ALL ",
        }
    }
}
