//! Deferred persistence: pending batch state machine and its scope guard.

mod deferred_flush;
mod pending_batch;

pub use deferred_flush::DeferredFlush;
pub use pending_batch::{BatchState, PendingBatch};
