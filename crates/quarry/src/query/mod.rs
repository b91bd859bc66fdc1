//! SELECT query builder.
//!
//! A [`Query`] is rooted at one entity and accumulates a projection, joins,
//! a condition tree, grouping, ordering, paging and a UNION tail. Field names
//! are resolved to columns through a [`MetadataResolver`](crate::MetadataResolver)
//! as they are added; join keys are inferred when the statement is rendered.
//!
//! # Examples
//!
//! ## Auto-expanded projection
//!
//! ```ignore
//! use quarry::{Query, SchemaRegistry, EntityDef};
//!
//! let registry = SchemaRegistry::builder()
//!     .entity(EntityDef::new("Person", "person").field("id").field("name")
//!         .relation("address", "Address", "address_id"))
//!     .entity(EntityDef::new("Address", "address").field("id").field("city"))
//!     .build()?
//!     .shared();
//!
//! let mut query = Query::new(registry, "Person")?;
//! query.add_join("Address", Some("a"), Some("address"), None)?;
//! query.where_eq("name", "Ana")?;
//! query.set_root_alias("p")?;
//!
//! let sql = query.render()?;
//! // SELECT p.id, p.name, a.id, a.city FROM person AS p
//! //   INNER JOIN address a ON p.address_id = a.id WHERE p.name = 'Ana'
//! ```
//!
//! ## Boolean conditions
//!
//! ```ignore
//! use quarry::{Operator, Value};
//!
//! let factory = query.conditions();
//! let ten = factory.condition(query.root(), None, Operator::Eq, "age", vec![Value::Int(10)])?;
//! let twenty = factory.condition(query.root(), None, Operator::Eq, "age", vec![Value::Int(20)])?;
//! query.where_condition(factory.or(vec![ten, twenty])?);
//! // ... WHERE person.age = 10 or person.age = 20
//! ```

mod types;
mod join;
pub(crate) mod helpers;
mod condition;
mod factory;
mod builder;
mod select;


// Re-export all public types
pub use types::{ContainsPosition, JoinKind, Operator, OrderDirection, UnionKind};
pub use join::{Join, JoinHandle};
pub use condition::{Condition, ConditionNode};
pub use factory::ConditionFactory;
pub use builder::{Query, UNSET};
pub use helpers::{validate_identifier, validate_identifier_part};
