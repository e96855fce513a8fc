use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::FixtureError;

use super::relation::{RelationDef, RelationKind};
use super::schema::EntitySchema;

/// Registry for entity schemas.
///
/// Stores registered schemas with lookup by entity type name.
/// Provides thread-safe registration and retrieval.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<EntitySchema>>>,
}

impl SchemaRegistry {
    /// Creates a new empty schema registry.
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a schema.
    ///
    /// # Arguments
    /// * `schema` - Schema to register
    ///
    /// # Returns
    /// `Ok(())` if successful, `Err(FixtureError)` if already registered or invalid.
    pub fn register(&self, schema: EntitySchema) -> Result<(), FixtureError> {
        schema.validate()?;

        let mut schemas = self.schemas.write().map_err(|_| FixtureError::LockPoisoned)?;
        if schemas.contains_key(&schema.name) {
            return Err(FixtureError::SchemaAlreadyRegistered(schema.name));
        }

        tracing::debug!(entity_type = %schema.name, "registered schema");
        schemas.insert(schema.name.clone(), Arc::new(schema));
        Ok(())
    }

    /// Retrieves a schema by entity type name.
    pub fn get(&self, entity_type: &str) -> Result<Arc<EntitySchema>, FixtureError> {
        let schemas = self.schemas.read().map_err(|_| FixtureError::LockPoisoned)?;
        schemas
            .get(entity_type)
            .cloned()
            .ok_or_else(|| FixtureError::UnknownEntityType {
                entity_type: entity_type.to_string(),
            })
    }

    /// Checks if a schema is registered.
    pub fn contains(&self, entity_type: &str) -> bool {
        match self.schemas.read() {
            Ok(schemas) => schemas.contains_key(entity_type),
            Err(_) => false,
        }
    }

    /// Returns all registered entity type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.schemas.read() {
            Ok(schemas) => schemas.keys().cloned().collect(),
            Err(_) => return Vec::new(),
        };
        names.sort();
        names
    }

    /// Resolves the inverse side of `relation`, declared on `owner`.
    ///
    /// # Returns
    /// `Ok(None)` if the relation is unidirectional, the mirroring relation
    /// on the target otherwise. Fails if the target is unknown or the inverse
    /// field does not point back at `owner` with the opposite kind.
    pub fn inverse_of(
        &self,
        owner: &EntitySchema,
        relation: &RelationDef,
    ) -> Result<Option<RelationDef>, FixtureError> {
        let target = self.get(&relation.target)?;
        let Some(inverse_name) = &relation.inverse else {
            return Ok(None);
        };

        let inverse = target.get_relation(inverse_name).ok_or_else(|| {
            FixtureError::specification(
                &owner.name,
                &relation.name,
                format!("inverse '{}' is not a relation of '{}'", inverse_name, target.name),
            )
        })?;

        let expected_kind = match relation.kind {
            RelationKind::ToOne => RelationKind::ToMany,
            RelationKind::ToMany => RelationKind::ToOne,
        };
        if inverse.kind != expected_kind || inverse.target != owner.name {
            return Err(FixtureError::specification(
                &owner.name,
                &relation.name,
                format!(
                    "inverse '{}.{}' does not point back at '{}'",
                    target.name, inverse_name, owner.name
                ),
            ));
        }

        Ok(Some(inverse.clone()))
    }

    /// Validates every relation of every registered schema.
    pub fn validate(&self) -> Result<(), FixtureError> {
        let schemas: Vec<Arc<EntitySchema>> = {
            let schemas = self.schemas.read().map_err(|_| FixtureError::LockPoisoned)?;
            schemas.values().cloned().collect()
        };
        for schema in &schemas {
            for relation in &schema.relations {
                self.inverse_of(schema, relation)?;
            }
        }
        Ok(())
    }
}
