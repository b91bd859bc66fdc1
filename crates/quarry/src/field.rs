//! Column references.

use crate::metadata::{EntityRef, MetadataResolver};
use crate::Result;

/// A column of an entity, qualified by an alias or by the table name.
///
/// Fields are immutable; alias propagation produces new values through
/// [`Field::realias`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    entity: EntityRef,
    table: String,
    alias: Option<String>,
    column: String,
}

impl Field {
    /// Resolves `name` on `entity` to a column, failing with `UnknownField`
    /// when it is not mapped.
    pub fn resolve(
        resolver: &dyn MetadataResolver,
        entity: &EntityRef,
        alias: Option<&str>,
        name: &str,
    ) -> Result<Self> {
        let table = resolver.table_name(entity)?;
        let column = resolver.column_name(entity, name)?;
        Ok(Self::from_parts(entity.clone(), table, alias.map(str::to_string), column))
    }

    /// Builds a field from already-resolved names.
    pub(crate) fn from_parts(
        entity: EntityRef,
        table: String,
        alias: Option<String>,
        column: String,
    ) -> Self {
        Self {
            entity,
            table,
            alias: alias.filter(|a| !a.is_empty()),
            column,
        }
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Alias when set, table name otherwise.
    pub fn owner(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    /// `<owner>.<column>`
    pub fn to_sql(&self) -> String {
        format!("{}.{}", self.owner(), self.column)
    }

    /// Rebinds the alias if this field belongs to `entity`.
    pub(crate) fn realias(self, entity: &EntityRef, alias: Option<&str>) -> Self {
        if &self.entity == entity {
            Self {
                alias: alias.map(str::to_string),
                ..self
            }
        } else {
            self
        }
    }
}

/// Ordered list of fields rendered comma-separated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldList {
    fields: Vec<Field>,
}

impl FieldList {
    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub(crate) fn realias(self, entity: &EntityRef, alias: Option<&str>) -> Self {
        Self {
            fields: self
                .fields
                .into_iter()
                .map(|f| f.realias(entity, alias))
                .collect(),
        }
    }

    pub fn to_sql(&self) -> String {
        self.fields
            .iter()
            .map(Field::to_sql)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(entity: &str, table: &str, alias: Option<&str>, column: &str) -> Field {
        Field::from_parts(
            EntityRef::new(entity),
            table.to_string(),
            alias.map(str::to_string),
            column.to_string(),
        )
    }

    #[test]
    fn test_owner_falls_back_to_table() {
        assert_eq!(field("Person", "person", None, "name").to_sql(), "person.name");
        assert_eq!(field("Person", "person", Some(""), "name").to_sql(), "person.name");
        assert_eq!(field("Person", "person", Some("p"), "name").to_sql(), "p.name");
    }

    #[test]
    fn test_realias_is_entity_scoped() {
        let person = EntityRef::new("Person");
        let f = field("Person", "person", None, "name").realias(&person, Some("p"));
        assert_eq!(f.to_sql(), "p.name");

        let g = field("Address", "address", Some("a"), "city").realias(&person, Some("p"));
        assert_eq!(g.to_sql(), "a.city");
    }

    #[test]
    fn test_field_list_to_sql() {
        let mut list = FieldList::default();
        list.push(field("Person", "person", Some("p"), "id"));
        list.push(field("Person", "person", Some("p"), "name"));
        assert_eq!(list.len(), 2);
        assert_eq!(list.to_sql(), "p.id, p.name");
    }
}
