use crate::context::FixtureContext;
use crate::error::FixtureError;

/// RAII guard for a deferred flush scope with auto-discard on drop.
///
/// If the scope is not explicitly committed, its queued entities are
/// discarded when the guard is dropped, including during unwinding.
#[derive(Debug)]
pub struct DeferredFlush<'a> {
    /// Context owning the pending batch
    pub(crate) ctx: &'a FixtureContext,
    /// Whether to discard on drop
    pub(crate) auto_discard: bool,
}

impl<'a> DeferredFlush<'a> {
    pub(crate) fn new(ctx: &'a FixtureContext) -> Self {
        Self {
            ctx,
            auto_discard: true,
        }
    }

    /// Number of entities queued so far.
    pub fn pending(&self) -> usize {
        self.ctx.pending_count()
    }

    /// Persists every queued entity in creation order and flushes once.
    ///
    /// # Returns
    /// Number of rows written. On failure nothing is persisted and the
    /// error is a [`FixtureError::FlushAborted`].
    pub fn commit(mut self) -> Result<usize, FixtureError> {
        self.auto_discard = false;
        self.ctx.commit_batch()
    }

    /// Drops every queued entity.
    ///
    /// # Returns
    /// Number of entities dropped.
    pub fn discard(mut self) -> usize {
        self.auto_discard = false;
        self.ctx.discard_batch()
    }
}

impl Drop for DeferredFlush<'_> {
    fn drop(&mut self) {
        if self.auto_discard {
            let dropped = self.ctx.discard_batch();
            tracing::warn!("Deferred flush scope dropped without commit, {} entities discarded", dropped);
        }
    }
}
