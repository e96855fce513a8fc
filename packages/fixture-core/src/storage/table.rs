//! Committed rows of one entity type.
//!
//! Each table has:
//! - Copy-on-write row snapshot, swapped atomically on commit
//! - Id sequence generator

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::entity::Entity;

/// Committed rows of one entity type.
#[derive(Debug)]
pub struct EntityTable {
    /// Entity type name
    pub name: String,
    /// Rows in insertion order; readers never block writers
    rows: ArcSwap<Vec<Entity>>,
    /// Next id to assign (atomic counter)
    next_id: AtomicU64,
}

impl EntityTable {
    pub fn new(name: String) -> Self {
        Self {
            name,
            rows: ArcSwap::from_pointee(Vec::new()),
            next_id: AtomicU64::new(1), // Start IDs at 1
        }
    }

    /// Atomically increments and returns the next id.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the current row snapshot.
    pub fn rows(&self) -> Arc<Vec<Entity>> {
        self.rows.load_full()
    }

    pub fn row_count(&self) -> usize {
        self.rows.load().len()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.rows.load().iter().any(|row| row.id() == id)
    }

    pub fn find(&self, id: u64) -> Option<Entity> {
        self.rows.load().iter().find(|row| row.id() == id).cloned()
    }

    pub fn first(&self) -> Option<Entity> {
        self.rows.load().first().cloned()
    }

    /// Upserts `entities` and publishes the new snapshot.
    ///
    /// # Returns
    /// Number of rows inserted (updates are not counted).
    pub fn apply(&self, entities: Vec<Entity>) -> usize {
        let mut rows = self.rows.load_full().as_ref().clone();
        let mut inserted = 0;
        for entity in entities {
            match rows.iter_mut().find(|row| row.same_identity(&entity)) {
                Some(row) => *row = entity,
                None => {
                    rows.push(entity);
                    inserted += 1;
                }
            }
        }
        self.rows.store(Arc::new(rows));
        inserted
    }
}
