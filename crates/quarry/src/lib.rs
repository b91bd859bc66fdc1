//! Programmatic SQL SELECT builder over a mapped entity model.
//!
//! Callers describe a statement in terms of entities and their fields; the
//! builder resolves tables, columns and join keys through a
//! [`MetadataResolver`] and renders a single SQL string.
//!
//! # Architecture
//!
//! ```text
//!   SchemaRegistry (TOML or builder)      RenderConfig (TOML)
//!           |                                    |
//!   Arc<dyn MetadataResolver>                    |
//!           |                                    |
//!   Query ── Join ── Condition tree ── Field ── Value
//!           |
//!        render() -> String
//! ```
//!
//! # Key Features
//!
//! - **Condition algebra**: equality, IN lists, ranges, LIKE / ILIKE with
//!   wildcard placement, AND / OR trees, column-to-column join predicates
//!   and nested subselects, all validated when built.
//! - **Join inference**: ON clauses come from explicit predicates or are
//!   inferred from the registered relations, optionally through a named
//!   navigation property.
//! - **Alias propagation**: setting the root alias late rebinds every
//!   element already attached that references the root entity.
//! - **Projection auto-expansion**: an empty projection lists every column
//!   of the root entity, its joins and its supertype chain.
//! - **Union chaining**: queries combine with UNION / UNION ALL.
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use quarry::{Query, SchemaRegistry};
//! use std::path::Path;
//!
//! let registry = SchemaRegistry::from_file(Path::new("schema.toml"))?.shared();
//! let mut query = Query::new(registry, "Person")?;
//! query.set_root_alias("p")?;
//! query.where_eq("name", "Ana")?;
//! query.limit(10);
//! println!("{}", query.render()?);
//! ```
//!
//! The generated text embeds literals verbatim. Escaping and parameter
//! binding are left to whatever executes the statement.

/// Rendering options loaded from TOML.
pub mod config;

/// Column references and ordered field lists.
pub mod field;

/// Entity identity and the metadata resolver seam.
pub mod metadata;

/// Query builder: conditions, joins, projection and rendering.
pub mod query;

/// Statically populated schema registry implementing the resolver.
///
/// Built once from a TOML document or programmatically, then shared
/// read-only between queries.
pub mod registry;

/// Literal values embedded in conditions.
pub mod types;

pub use config::{NestedBooleanStyle, RenderConfig};
pub use field::{Field, FieldList};
pub use metadata::{EntityRef, JoinKey, MetadataResolver, SharedResolver};
pub use query::{
    Condition, ConditionFactory, ConditionNode, ContainsPosition, Join, JoinHandle, JoinKind,
    Operator, OrderDirection, Query, UnionKind,
};
pub use registry::{EntityDef, FieldDef, RelationDef, SchemaBuilder, SchemaDef, SchemaRegistry};
pub use types::Value;

pub use quarry_common::{QuarryError, Result};
