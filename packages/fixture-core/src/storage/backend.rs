use std::fmt;

use crate::entity::{Entity, EntityRef};
use crate::error::FixtureError;

/// Persistence collaborator of the fixture engine.
///
/// `persist` only stages an entity (upserting by identity); nothing is
/// visible to `count`, `first` or `all` until `flush` commits the staged
/// unit of work. `find` sees staged rows as well.
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Allocates the next id for `entity_type`.
    fn next_id(&self, entity_type: &str) -> Result<u64, FixtureError>;

    /// Stages an entity for the next flush.
    fn persist(&self, entity: Entity) -> Result<(), FixtureError>;

    /// Commits every staged entity.
    ///
    /// # Returns
    /// Number of rows written. On error nothing is committed and the
    /// staged unit of work is dropped.
    fn flush(&self) -> Result<usize, FixtureError>;

    /// Drops staged entities without committing them.
    ///
    /// # Returns
    /// Number of entities discarded.
    fn rollback(&self) -> usize;

    /// Number of committed rows of `entity_type`.
    fn count(&self, entity_type: &str) -> Result<usize, FixtureError>;

    /// First committed row of `entity_type`, in insertion order.
    fn first(&self, entity_type: &str) -> Result<Option<Entity>, FixtureError>;

    /// Looks up a row by identity, staged rows first.
    fn find(&self, reference: &EntityRef) -> Result<Option<Entity>, FixtureError>;

    /// All committed rows of `entity_type`, in insertion order.
    fn all(&self, entity_type: &str) -> Result<Vec<Entity>, FixtureError>;

    /// Removes every row, staged entity and id sequence.
    fn reset(&self) -> Result<(), FixtureError>;
}
