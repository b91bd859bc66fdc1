//! Entity metadata lookup.
//!
//! The query layer never inspects entity types itself. Table names, column
//! names, supertypes and foreign-key pairs all come from a
//! [`MetadataResolver`], normally a [`SchemaRegistry`](crate::SchemaRegistry)
//! built once at startup and shared by reference.

use std::fmt;
use std::sync::Arc;

use crate::Result;

/// Opaque identity of a mapped entity type.
///
/// Cheap to clone; two refs are equal iff they name the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef(Arc<str>);

impl EntityRef {
    /// Creates an entity token from its registered name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The registered entity name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityRef {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&EntityRef> for EntityRef {
    fn from(entity: &EntityRef) -> Self {
        entity.clone()
    }
}

/// Column pair linking two entities in a join's ON clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKey {
    /// Column on the entity the join starts from
    pub from_column: String,
    /// Column on the joined entity
    pub joined_column: String,
}

impl JoinKey {
    pub fn new(from_column: impl Into<String>, joined_column: impl Into<String>) -> Self {
        Self {
            from_column: from_column.into(),
            joined_column: joined_column.into(),
        }
    }
}

/// Source of entity-to-table mapping information.
///
/// Implementations must be read-only once shared: several queries may render
/// concurrently against the same resolver.
pub trait MetadataResolver: Send + Sync + fmt::Debug {
    /// Table the entity is stored in.
    fn table_name(&self, entity: &EntityRef) -> Result<String>;

    /// Column backing `field` on `entity`.
    ///
    /// Fails with `UnknownField` when the field is not mapped.
    fn column_name(&self, entity: &EntityRef, field: &str) -> Result<String>;

    /// Every column of the entity's own table, in declaration order.
    fn columns(&self, entity: &EntityRef) -> Result<Vec<String>>;

    /// Columns joining `from` to `joined`, optionally through a named
    /// navigation property.
    ///
    /// Fails with `NoRelationship` or `AmbiguousRelationship` when no single
    /// relationship matches.
    fn infer_join_key(
        &self,
        from: &EntityRef,
        joined: &EntityRef,
        property: Option<&str>,
    ) -> Result<JoinKey>;

    /// Mapped supertype of the entity, if any.
    fn super_type_of(&self, entity: &EntityRef) -> Option<EntityRef>;
}

/// Resolver handle shared by queries, joins and condition factories.
pub type SharedResolver = Arc<dyn MetadataResolver>;
