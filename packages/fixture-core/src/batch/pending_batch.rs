use crate::entity::{Entity, EntityRef};
use crate::error::FixtureError;

/// Lifecycle of the deferred persistence batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Accumulating,
    Flushing,
    Discarded,
}

/// Entities queued inside a deferred flush scope.
///
/// Creation order is kept; re-queuing an entity replaces it in place.
#[derive(Debug, Default)]
pub struct PendingBatch {
    state: BatchState,
    entities: Vec<Entity>,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn is_accumulating(&self) -> bool {
        self.state == BatchState::Accumulating
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Opens a scope: `Idle -> Accumulating`.
    pub fn begin(&mut self) -> Result<(), FixtureError> {
        if self.state != BatchState::Idle {
            return Err(FixtureError::NestedScope);
        }
        self.state = BatchState::Accumulating;
        tracing::trace!("Batch accumulating");
        Ok(())
    }

    /// Queues an entity.
    pub fn push(&mut self, entity: Entity) -> Result<(), FixtureError> {
        if !self.is_accumulating() {
            return Err(FixtureError::ScopeNotActive);
        }
        match self.entities.iter_mut().find(|e| e.same_identity(&entity)) {
            Some(existing) => *existing = entity,
            None => self.entities.push(entity),
        }
        Ok(())
    }

    /// Returns a queued entity by identity.
    pub fn find(&self, reference: &EntityRef) -> Option<&Entity> {
        self.entities.iter().find(|e| e.reference() == reference)
    }

    /// Hands the queued entities over for flushing: `Accumulating -> Flushing`.
    pub fn start_flush(&mut self) -> Result<Vec<Entity>, FixtureError> {
        if !self.is_accumulating() {
            return Err(FixtureError::ScopeNotActive);
        }
        self.state = BatchState::Flushing;
        Ok(std::mem::take(&mut self.entities))
    }

    /// Completes a flush: `Flushing -> Idle`.
    pub fn finish_flush(&mut self) {
        self.state = BatchState::Idle;
        self.entities.clear();
    }

    /// Drops queued entities: `Accumulating | Flushing -> Discarded -> Idle`.
    ///
    /// # Returns
    /// Number of entities dropped.
    pub fn discard(&mut self) -> usize {
        if self.state == BatchState::Idle {
            return 0;
        }
        self.state = BatchState::Discarded;
        let dropped = self.entities.len();
        self.entities.clear();
        tracing::trace!("Batch discarded ({} entities)", dropped);
        self.state = BatchState::Idle;
        dropped
    }
}
