//! Entity schema: scalar fields plus relations.

use std::collections::HashSet;

use crate::error::FixtureError;

use super::field::FieldDef;
use super::relation::{RelationDef, RelationKind};

/// Entity schema: scalar fields plus relations.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    /// Entity type name
    pub name: String,
    /// Scalar fields in declaration order
    pub fields: Vec<FieldDef>,
    /// Relations in declaration order
    pub relations: Vec<RelationDef>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get_relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Returns `true` if `name` is a field or a relation of this schema.
    pub fn has_member(&self, name: &str) -> bool {
        self.get_field(name).is_some() || self.get_relation(name).is_some()
    }

    pub fn to_one_relations(&self) -> impl Iterator<Item = &RelationDef> {
        self.relations
            .iter()
            .filter(|r| r.kind == RelationKind::ToOne)
    }

    pub fn to_many_relations(&self) -> impl Iterator<Item = &RelationDef> {
        self.relations
            .iter()
            .filter(|r| r.kind == RelationKind::ToMany)
    }

    /// Checks the schema for internal consistency.
    ///
    /// Member names must be unique, and two to-many relations targeting the
    /// same type must be told apart by distinct inverse fields.
    pub fn validate(&self) -> Result<(), FixtureError> {
        let mut seen = HashSet::new();
        let names = self
            .fields
            .iter()
            .map(|f| &f.name)
            .chain(self.relations.iter().map(|r| &r.name));
        for name in names {
            if !seen.insert(name) {
                return Err(FixtureError::FieldAlreadyExists {
                    entity_type: self.name.clone(),
                    field: name.clone(),
                });
            }
        }

        let to_many: Vec<&RelationDef> = self.to_many_relations().collect();
        for (i, a) in to_many.iter().enumerate() {
            for b in &to_many[i + 1..] {
                if a.target == b.target && a.inverse.is_some() && a.inverse == b.inverse {
                    return Err(FixtureError::specification(
                        &self.name,
                        &b.name,
                        format!(
                            "shares target '{}' and inverse field with '{}'",
                            b.target, a.name
                        ),
                    ));
                }
            }
        }

        Ok(())
    }
}
