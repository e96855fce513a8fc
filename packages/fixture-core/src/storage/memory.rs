//! In-memory storage backend.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use parking_lot::Mutex;

use crate::entity::{Entity, EntityRef};
use crate::error::FixtureError;

use super::backend::StorageBackend;
use super::table::EntityTable;

/// In-memory [`StorageBackend`] holding one [`EntityTable`] per entity type.
///
/// Persisted entities wait in a staged unit of work until `flush`, which
/// checks referential integrity and then applies them table by table in
/// first-staged order.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// Map of entity type to table
    tables: RwLock<HashMap<String, EntityTable>>,
    /// Staged entities in persist order, unique by identity
    staged: Mutex<Vec<Entity>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of staged (not yet flushed) entities.
    pub fn staged_count(&self) -> usize {
        self.staged.lock().len()
    }

    /// Returns the entity type names that have a table, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.tables.read() {
            Ok(tables) => tables.keys().cloned().collect(),
            Err(_) => return Vec::new(),
        };
        names.sort();
        names
    }

    /// Serializes every committed row, grouped by entity type.
    pub fn dump(&self) -> Result<serde_json::Value, FixtureError> {
        let tables = self.tables.read().map_err(|_| FixtureError::LockPoisoned)?;
        let mut out = serde_json::Map::new();
        let mut names: Vec<&String> = tables.keys().collect();
        names.sort();
        for name in names {
            let rows = tables[name].rows();
            let rows = serde_json::to_value(rows.as_ref()).map_err(|e| {
                FixtureError::Serialization {
                    entity_type: name.clone(),
                    message: e.to_string(),
                }
            })?;
            out.insert(name.clone(), rows);
        }
        Ok(serde_json::Value::Object(out))
    }

    fn check_references(
        tables: &HashMap<String, EntityTable>,
        staged: &[Entity],
    ) -> Result<(), FixtureError> {
        let staged_refs: HashSet<&EntityRef> = staged.iter().map(Entity::reference).collect();
        for entity in staged {
            for reference in entity.references() {
                let stored = tables
                    .get(&reference.entity_type)
                    .is_some_and(|table| table.contains(reference.id));
                if !stored && !staged_refs.contains(reference) {
                    return Err(FixtureError::DanglingReference {
                        entity: entity.reference().to_string(),
                        missing: reference.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl StorageBackend for InMemoryStorage {
    fn next_id(&self, entity_type: &str) -> Result<u64, FixtureError> {
        {
            let tables = self.tables.read().map_err(|_| FixtureError::LockPoisoned)?;
            if let Some(table) = tables.get(entity_type) {
                return Ok(table.next_id());
            }
        }
        let mut tables = self.tables.write().map_err(|_| FixtureError::LockPoisoned)?;
        Ok(tables
            .entry(entity_type.to_string())
            .or_insert_with(|| EntityTable::new(entity_type.to_string()))
            .next_id())
    }

    fn persist(&self, entity: Entity) -> Result<(), FixtureError> {
        let mut staged = self.staged.lock();
        match staged.iter_mut().find(|e| e.same_identity(&entity)) {
            Some(existing) => *existing = entity,
            None => staged.push(entity),
        }
        Ok(())
    }

    fn flush(&self) -> Result<usize, FixtureError> {
        let staged = std::mem::take(&mut *self.staged.lock());
        if staged.is_empty() {
            return Ok(0);
        }

        let mut tables = self.tables.write().map_err(|_| FixtureError::LockPoisoned)?;
        if let Err(e) = Self::check_references(&tables, &staged) {
            tracing::warn!("Flush rejected, {} staged entities dropped: {}", staged.len(), e);
            return Err(e);
        }

        // Group per table, keeping first-staged order between tables
        let written = staged.len();
        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<Entity>> = HashMap::new();
        for entity in staged {
            let name = entity.entity_type().to_string();
            if !grouped.contains_key(&name) {
                order.push(name.clone());
            }
            grouped.entry(name).or_default().push(entity);
        }

        for name in order {
            let rows = grouped.remove(&name).unwrap_or_default();
            let table = tables
                .entry(name.clone())
                .or_insert_with(|| EntityTable::new(name));
            table.apply(rows);
        }

        tracing::debug!("Flushed {} entities", written);
        Ok(written)
    }

    fn rollback(&self) -> usize {
        let mut staged = self.staged.lock();
        let dropped = staged.len();
        staged.clear();
        if dropped > 0 {
            tracing::debug!("Rolled back {} staged entities", dropped);
        }
        dropped
    }

    fn count(&self, entity_type: &str) -> Result<usize, FixtureError> {
        let tables = self.tables.read().map_err(|_| FixtureError::LockPoisoned)?;
        Ok(tables.get(entity_type).map_or(0, EntityTable::row_count))
    }

    fn first(&self, entity_type: &str) -> Result<Option<Entity>, FixtureError> {
        let tables = self.tables.read().map_err(|_| FixtureError::LockPoisoned)?;
        Ok(tables.get(entity_type).and_then(EntityTable::first))
    }

    fn find(&self, reference: &EntityRef) -> Result<Option<Entity>, FixtureError> {
        if let Some(entity) = self
            .staged
            .lock()
            .iter()
            .find(|e| e.reference() == reference)
        {
            return Ok(Some(entity.clone()));
        }
        let tables = self.tables.read().map_err(|_| FixtureError::LockPoisoned)?;
        Ok(tables
            .get(&reference.entity_type)
            .and_then(|table| table.find(reference.id)))
    }

    fn all(&self, entity_type: &str) -> Result<Vec<Entity>, FixtureError> {
        let tables = self.tables.read().map_err(|_| FixtureError::LockPoisoned)?;
        Ok(tables
            .get(entity_type)
            .map(|table| table.rows().as_ref().clone())
            .unwrap_or_default())
    }

    fn reset(&self) -> Result<(), FixtureError> {
        self.staged.lock().clear();
        self.tables
            .write()
            .map_err(|_| FixtureError::LockPoisoned)?
            .clear();
        tracing::debug!("Storage reset");
        Ok(())
    }
}
