//! Statically populated entity registry.
//!
//! A [`SchemaRegistry`] maps entity names to tables, fields to columns and
//! navigation properties to foreign-key pairs. It is built once, either from
//! [`EntityDef`] values or from a TOML schema document, and is immutable
//! afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry::{EntityDef, SchemaRegistry};
//!
//! let registry = SchemaRegistry::builder()
//!     .entity(EntityDef::new("Person", "person").field("id").field("name")
//!         .relation("address", "Address", "address_id"))
//!     .entity(EntityDef::new("Address", "address").field("id").field("city"))
//!     .build()?;
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::metadata::{EntityRef, JoinKey, MetadataResolver, SharedResolver};
use crate::query::helpers::{validate_identifier, validate_identifier_part};
use crate::{QuarryError, Result};

fn default_primary_key() -> String {
    "id".to_string()
}

/// A mapped field of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldDef {
    /// Field name used by callers
    pub name: String,
    /// Backing column (defaults to the field name)
    #[serde(default)]
    pub column: Option<String>,
}

/// A navigation property declared on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelationDef {
    /// Property name used to disambiguate joins
    pub property: String,
    /// Entity the property points to
    pub target: String,
    /// Foreign-key column on the declaring entity's table
    pub join_column: String,
    /// Referenced column on the target (defaults to the target primary key)
    #[serde(default)]
    pub referenced_column: Option<String>,
}

/// Definition of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityDef {
    pub name: String,
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Mapped supertype, stored in its own table
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default, rename = "relation")]
    pub relations: Vec<RelationDef>,
}

impl EntityDef {
    /// Starts an entity definition with an `id` primary key.
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            primary_key: default_primary_key(),
            extends: None,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Sets the primary-key column.
    pub fn primary_key(mut self, column: &str) -> Self {
        self.primary_key = column.to_string();
        self
    }

    /// Declares the mapped supertype.
    pub fn extends(mut self, entity: &str) -> Self {
        self.extends = Some(entity.to_string());
        self
    }

    /// Adds a field whose column has the same name.
    pub fn field(mut self, name: &str) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            column: None,
        });
        self
    }

    /// Adds a field stored under a different column name.
    pub fn field_as(mut self, name: &str, column: &str) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            column: Some(column.to_string()),
        });
        self
    }

    /// Adds a navigation property referencing the target's primary key.
    pub fn relation(mut self, property: &str, target: &str, join_column: &str) -> Self {
        self.relations.push(RelationDef {
            property: property.to_string(),
            target: target.to_string(),
            join_column: join_column.to_string(),
            referenced_column: None,
        });
        self
    }

    /// Adds a navigation property referencing an explicit target column.
    pub fn relation_to(
        mut self,
        property: &str,
        target: &str,
        join_column: &str,
        referenced_column: &str,
    ) -> Self {
        self.relations.push(RelationDef {
            property: property.to_string(),
            target: target.to_string(),
            join_column: join_column.to_string(),
            referenced_column: Some(referenced_column.to_string()),
        });
        self
    }
}

/// Top-level TOML schema document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDef {
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityDef>,
}

#[derive(Debug, Clone)]
struct Relation {
    property: String,
    target: EntityRef,
    join_column: String,
    referenced_column: String,
}

#[derive(Debug, Clone)]
struct EntityMeta {
    table: String,
    primary_key: String,
    supertype: Option<EntityRef>,
    /// (field name, column name) in declaration order
    fields: Vec<(String, String)>,
    relations: Vec<Relation>,
}

/// A candidate relationship found while inferring a join key.
struct Candidate {
    label: String,
    key: JoinKey,
}

/// Immutable registry of entity metadata.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: HashMap<EntityRef, EntityMeta>,
}

/// Collects entity definitions before validation.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    defs: Vec<EntityDef>,
}

impl SchemaBuilder {
    /// Adds an entity definition.
    pub fn entity(mut self, def: EntityDef) -> Self {
        self.defs.push(def);
        self
    }

    /// Validates every definition and freezes the registry.
    pub fn build(self) -> Result<SchemaRegistry> {
        SchemaRegistry::from_defs(self.defs)
    }
}

impl SchemaRegistry {
    /// Starts building a registry programmatically.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Parses and validates a TOML schema document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let schema: SchemaDef = toml::from_str(content)?;
        Self::from_defs(schema.entities)
    }

    /// Reads and validates a TOML schema file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Wraps the registry in a shareable resolver handle.
    pub fn shared(self) -> SharedResolver {
        Arc::new(self)
    }

    /// Returns true if the entity is registered.
    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity is registered.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn from_defs(defs: Vec<EntityDef>) -> Result<Self> {
        let names: HashSet<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        let primary_keys: HashMap<&str, &str> = defs
            .iter()
            .map(|d| (d.name.as_str(), d.primary_key.as_str()))
            .collect();

        let mut entities = HashMap::with_capacity(defs.len());
        for def in &defs {
            if def.name.is_empty() {
                return Err(QuarryError::Schema("Entity name cannot be empty".to_string()));
            }
            validate_identifier(&def.table)?;
            validate_identifier_part(&def.primary_key)?;

            if let Some(parent) = &def.extends {
                if !names.contains(parent.as_str()) {
                    return Err(QuarryError::Schema(format!(
                        "Entity '{}' extends unknown entity '{}'",
                        def.name, parent
                    )));
                }
            }

            let mut seen = HashSet::new();
            let mut fields = Vec::with_capacity(def.fields.len());
            for field in &def.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(QuarryError::Schema(format!(
                        "Entity '{}' declares field '{}' twice",
                        def.name, field.name
                    )));
                }
                let column = field.column.clone().unwrap_or_else(|| field.name.clone());
                validate_identifier_part(&column)?;
                fields.push((field.name.clone(), column));
            }

            let mut relations = Vec::with_capacity(def.relations.len());
            for rel in &def.relations {
                let target_pk = primary_keys.get(rel.target.as_str()).ok_or_else(|| {
                    QuarryError::Schema(format!(
                        "Relation '{}.{}' targets unknown entity '{}'",
                        def.name, rel.property, rel.target
                    ))
                })?;
                let referenced_column = rel
                    .referenced_column
                    .clone()
                    .unwrap_or_else(|| target_pk.to_string());
                validate_identifier_part(&rel.join_column)?;
                validate_identifier_part(&referenced_column)?;
                relations.push(Relation {
                    property: rel.property.clone(),
                    target: EntityRef::new(&rel.target),
                    join_column: rel.join_column.clone(),
                    referenced_column,
                });
            }

            let meta = EntityMeta {
                table: def.table.clone(),
                primary_key: def.primary_key.clone(),
                supertype: def.extends.as_deref().map(EntityRef::new),
                fields,
                relations,
            };
            if entities.insert(EntityRef::new(&def.name), meta).is_some() {
                return Err(QuarryError::Schema(format!(
                    "Entity '{}' is declared twice",
                    def.name
                )));
            }
        }

        let registry = Self { entities };
        registry.check_supertype_cycles()?;
        debug!(entities = registry.entities.len(), "Schema registry built");
        Ok(registry)
    }

    fn check_supertype_cycles(&self) -> Result<()> {
        for start in self.entities.keys() {
            let mut visited = HashSet::new();
            let mut current = Some(start.clone());
            while let Some(entity) = current {
                if !visited.insert(entity.clone()) {
                    return Err(QuarryError::Schema(format!(
                        "Supertype chain of '{}' is cyclic",
                        start
                    )));
                }
                current = self.entities.get(&entity).and_then(|m| m.supertype.clone());
            }
        }
        Ok(())
    }

    fn meta(&self, entity: &EntityRef) -> Result<&EntityMeta> {
        self.entities
            .get(entity)
            .ok_or_else(|| QuarryError::UnknownEntity(entity.name().to_string()))
    }

    /// Relations on `from` targeting `joined`, plus inverse relations declared
    /// on `joined` targeting `from`.
    fn candidates(
        &self,
        from: &EntityRef,
        from_meta: &EntityMeta,
        joined: &EntityRef,
        joined_meta: &EntityMeta,
        property: Option<&str>,
    ) -> Vec<Candidate> {
        let wanted = |p: &str| property.map_or(true, |name| name == p);

        let forward = from_meta
            .relations
            .iter()
            .filter(|r| &r.target == joined && wanted(&r.property))
            .map(|r| Candidate {
                label: r.property.clone(),
                key: JoinKey::new(&r.join_column, &r.referenced_column),
            });

        let inverse = joined_meta
            .relations
            .iter()
            .filter(|r| &r.target == from && wanted(&r.property))
            .map(|r| Candidate {
                label: format!("{}.{}", joined, r.property),
                key: JoinKey::new(&r.referenced_column, &r.join_column),
            });

        // A named property on the starting side wins over an inverse one.
        let forward: Vec<Candidate> = forward.collect();
        if property.is_some() && !forward.is_empty() {
            return forward;
        }
        forward.into_iter().chain(inverse).collect()
    }
}

impl MetadataResolver for SchemaRegistry {
    fn table_name(&self, entity: &EntityRef) -> Result<String> {
        Ok(self.meta(entity)?.table.clone())
    }

    fn column_name(&self, entity: &EntityRef, field: &str) -> Result<String> {
        self.meta(entity)?
            .fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, column)| column.clone())
            .ok_or_else(|| QuarryError::UnknownField {
                entity: entity.name().to_string(),
                field: field.to_string(),
            })
    }

    fn columns(&self, entity: &EntityRef) -> Result<Vec<String>> {
        Ok(self
            .meta(entity)?
            .fields
            .iter()
            .map(|(_, column)| column.clone())
            .collect())
    }

    fn infer_join_key(
        &self,
        from: &EntityRef,
        joined: &EntityRef,
        property: Option<&str>,
    ) -> Result<JoinKey> {
        let from_meta = self.meta(from)?;
        let joined_meta = self.meta(joined)?;

        if property.is_none() && from_meta.supertype.as_ref() == Some(joined) {
            let key = JoinKey::new(&from_meta.primary_key, &joined_meta.primary_key);
            debug!(%from, %joined, from_column = %key.from_column, joined_column = %key.joined_column,
                "Inferred supertype join key");
            return Ok(key);
        }

        let mut candidates = self.candidates(from, from_meta, joined, joined_meta, property);
        match candidates.len() {
            1 => {
                let key = candidates.remove(0).key;
                debug!(%from, %joined, ?property, from_column = %key.from_column,
                    joined_column = %key.joined_column, "Inferred join key");
                Ok(key)
            }
            0 => {
                warn!(%from, %joined, ?property, "No relationship found for join");
                Err(QuarryError::NoRelationship {
                    from: from.name().to_string(),
                    joined: joined.name().to_string(),
                    property: property.map(str::to_string),
                })
            }
            _ => {
                warn!(%from, %joined, count = candidates.len(), "Ambiguous relationship for join");
                Err(QuarryError::AmbiguousRelationship {
                    from: from.name().to_string(),
                    joined: joined.name().to_string(),
                    candidates: candidates.into_iter().map(|c| c.label).collect(),
                })
            }
        }
    }

    fn super_type_of(&self, entity: &EntityRef) -> Option<EntityRef> {
        self.entities.get(entity).and_then(|m| m.supertype.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .entity(
                EntityDef::new("Person", "person")
                    .field("id")
                    .field("name")
                    .relation("address", "Address", "address_id"),
            )
            .entity(EntityDef::new("Address", "address").field("id").field("city"))
            .entity(
                EntityDef::new("Order", "orders")
                    .field("id")
                    .relation("billing", "Address", "billing_address_id")
                    .relation("shipping", "Address", "shipping_address_id")
                    .relation("customer", "Person", "customer_id"),
            )
            .entity(EntityDef::new("Party", "party").primary_key("party_id").field("party_id"))
            .entity(EntityDef::new("Company", "company").extends("Party").field("id").field_as("legalName", "legal_name"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_table_and_columns() {
        let reg = registry();
        let person = EntityRef::new("Person");
        assert_eq!(reg.table_name(&person).unwrap(), "person");
        assert_eq!(reg.columns(&person).unwrap(), vec!["id", "name"]);
        assert_eq!(reg.column_name(&EntityRef::new("Company"), "legalName").unwrap(), "legal_name");
    }

    #[test]
    fn test_unknown_field_and_entity() {
        let reg = registry();
        assert_eq!(
            reg.column_name(&EntityRef::new("Person"), "age"),
            Err(QuarryError::UnknownField {
                entity: "Person".to_string(),
                field: "age".to_string()
            })
        );
        assert_eq!(
            reg.table_name(&EntityRef::new("Ghost")),
            Err(QuarryError::UnknownEntity("Ghost".to_string()))
        );
    }

    #[test]
    fn test_infer_by_property() {
        let reg = registry();
        let key = reg
            .infer_join_key(&EntityRef::new("Person"), &EntityRef::new("Address"), Some("address"))
            .unwrap();
        assert_eq!(key, JoinKey::new("address_id", "id"));
    }

    #[test]
    fn test_infer_single_default_relationship() {
        let reg = registry();
        let key = reg
            .infer_join_key(&EntityRef::new("Person"), &EntityRef::new("Address"), None)
            .unwrap();
        assert_eq!(key, JoinKey::new("address_id", "id"));
    }

    #[test]
    fn test_infer_inverse_relationship() {
        let reg = registry();
        let key = reg
            .infer_join_key(&EntityRef::new("Person"), &EntityRef::new("Order"), None)
            .unwrap();
        assert_eq!(key, JoinKey::new("id", "customer_id"));
    }

    #[test]
    fn test_infer_ambiguous_without_property() {
        let reg = registry();
        let err = reg
            .infer_join_key(&EntityRef::new("Order"), &EntityRef::new("Address"), None)
            .unwrap_err();
        match err {
            QuarryError::AmbiguousRelationship { candidates, .. } => {
                assert_eq!(candidates, vec!["billing", "shipping"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let key = reg
            .infer_join_key(&EntityRef::new("Order"), &EntityRef::new("Address"), Some("shipping"))
            .unwrap();
        assert_eq!(key, JoinKey::new("shipping_address_id", "id"));
    }

    #[test]
    fn test_infer_no_relationship() {
        let reg = registry();
        let err = reg
            .infer_join_key(&EntityRef::new("Address"), &EntityRef::new("Party"), None)
            .unwrap_err();
        assert!(matches!(err, QuarryError::NoRelationship { property: None, .. }));

        let err = reg
            .infer_join_key(&EntityRef::new("Person"), &EntityRef::new("Address"), Some("home"))
            .unwrap_err();
        assert!(matches!(err, QuarryError::NoRelationship { property: Some(_), .. }));
    }

    #[test]
    fn test_infer_supertype_key() {
        let reg = registry();
        let company = EntityRef::new("Company");
        assert_eq!(reg.super_type_of(&company), Some(EntityRef::new("Party")));
        let key = reg.infer_join_key(&company, &EntityRef::new("Party"), None).unwrap();
        assert_eq!(key, JoinKey::new("id", "party_id"));
    }

    #[test]
    fn test_rejects_duplicate_entity() {
        let err = SchemaRegistry::builder()
            .entity(EntityDef::new("A", "a"))
            .entity(EntityDef::new("A", "a2"))
            .build()
            .unwrap_err();
        assert!(matches!(err, QuarryError::Schema(_)));
    }

    #[test]
    fn test_rejects_dangling_references() {
        let err = SchemaRegistry::builder()
            .entity(EntityDef::new("A", "a").extends("Missing"))
            .build()
            .unwrap_err();
        assert!(matches!(err, QuarryError::Schema(_)));

        let err = SchemaRegistry::builder()
            .entity(EntityDef::new("A", "a").relation("b", "Missing", "b_id"))
            .build()
            .unwrap_err();
        assert!(matches!(err, QuarryError::Schema(_)));
    }

    #[test]
    fn test_rejects_supertype_cycle() {
        let err = SchemaRegistry::builder()
            .entity(EntityDef::new("A", "a").extends("B"))
            .entity(EntityDef::new("B", "b").extends("A"))
            .build()
            .unwrap_err();
        assert!(matches!(err, QuarryError::Schema(_)));
    }

    #[test]
    fn test_rejects_invalid_column() {
        let err = SchemaRegistry::builder()
            .entity(EntityDef::new("A", "a").field_as("x", "bad-column"))
            .build()
            .unwrap_err();
        assert!(matches!(err, QuarryError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_from_toml_str() {
        let reg = SchemaRegistry::from_toml_str(
            r#"
            [[entity]]
            name = "Person"
            table = "person"
            fields = [{ name = "id" }, { name = "fullName", column = "full_name" }]

            [[entity.relation]]
            property = "address"
            target = "Address"
            join_column = "address_id"

            [[entity]]
            name = "Address"
            table = "address"
            fields = [{ name = "id" }, { name = "city" }]
            "#,
        )
        .unwrap();

        assert_eq!(reg.len(), 2);
        let person = EntityRef::new("Person");
        assert_eq!(reg.columns(&person).unwrap(), vec!["id", "full_name"]);
        assert_eq!(
            reg.infer_join_key(&person, &EntityRef::new("Address"), None).unwrap(),
            JoinKey::new("address_id", "id")
        );
    }

    #[test]
    fn test_from_toml_str_parse_error() {
        let err = SchemaRegistry::from_toml_str("[[entity]]\nname = ").unwrap_err();
        assert!(matches!(err, QuarryError::Config(_)));
    }
}
