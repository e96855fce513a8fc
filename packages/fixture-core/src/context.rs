//! Fixture context owning storage, schemas and runtime state.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::batch::{BatchState, DeferredFlush, PendingBatch};
use crate::config::FixtureConfig;
use crate::entity::{Entity, EntityRef};
use crate::error::FixtureError;
use crate::factory::{Factory, Repository};
use crate::generator::{Generator, GeneratorSource, RandomSource};
use crate::registry::{GlobalRegistry, Proxy};
use crate::schema::{EntitySchema, SchemaRegistry};
use crate::storage::{InMemoryStorage, StorageBackend};

/// Container holding everything a fixture run needs.
///
/// Contexts are fully isolated from each other; there is no process-wide
/// state. Tests typically create one context per test or call
/// [`reset`](Self::reset) between tests.
pub struct FixtureContext {
    config: FixtureConfig,
    storage: Arc<dyn StorageBackend>,
    schemas: SchemaRegistry,
    generator: Mutex<Box<dyn GeneratorSource>>,
    registry: GlobalRegistry,
    /// Entities queued by the active deferred scope
    batch: Mutex<PendingBatch>,
}

impl FixtureContext {
    /// Creates a context backed by a fresh [`InMemoryStorage`].
    pub fn new(config: FixtureConfig) -> Self {
        Self::with_storage(config, Arc::new(InMemoryStorage::new()))
    }

    /// Creates a context on top of an existing storage backend.
    ///
    /// # Arguments
    /// * `config` - Context configuration
    /// * `storage` - Backend receiving persisted entities
    pub fn with_storage(config: FixtureConfig, storage: Arc<dyn StorageBackend>) -> Self {
        let generator = RandomSource::new(config.seed, config.text_length);
        Self {
            config,
            storage,
            schemas: SchemaRegistry::new(),
            generator: Mutex::new(Box::new(generator)),
            registry: GlobalRegistry::new(),
            batch: Mutex::new(PendingBatch::new()),
        }
    }

    /// Replaces the default generator source.
    pub fn with_generator(mut self, generator: impl GeneratorSource + 'static) -> Self {
        self.generator = Mutex::new(Box::new(generator));
        self
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn registry(&self) -> &GlobalRegistry {
        &self.registry
    }

    /// Registers an entity schema.
    pub fn register(&self, schema: EntitySchema) -> Result<(), FixtureError> {
        self.schemas.register(schema)
    }

    /// Produces one value for `field` through the generator source.
    pub fn generate(&self, field: &str, generator: &Generator) -> serde_json::Value {
        self.generator.lock().generate(field, generator)
    }

    /// Looks up an entity by identity, pending batch first, then storage.
    pub fn find(&self, reference: &EntityRef) -> Result<Option<Entity>, FixtureError> {
        let queued = self.batch.lock().find(reference).cloned();
        match queued {
            Some(entity) => Ok(Some(entity)),
            None => self.storage.find(reference),
        }
    }

    /// Factory for `entity_type` with no default attributes.
    pub fn factory(&self, entity_type: impl Into<String>) -> Factory {
        Factory::new(entity_type)
    }

    /// Repository view over the committed rows of `entity_type`.
    pub fn repository(&self, entity_type: impl Into<String>) -> Repository<'_> {
        Repository::new(self, entity_type)
    }

    /// Resolves the global fixture bound to `key`.
    ///
    /// See [`GlobalRegistry::resolve`].
    pub fn global(&self, key: &str, factory: &Factory) -> Result<Entity, FixtureError> {
        self.registry.resolve(self, key, factory)
    }

    /// Resolves the global fixture bound to `key` as a lazy proxy.
    pub fn global_proxy(&self, key: &str, factory: &Factory) -> Result<Proxy, FixtureError> {
        self.registry.resolve_as_proxy(self, key, factory)
    }

    /// Opens a deferred flush scope.
    ///
    /// Until the returned guard is committed, every entity created through
    /// this context (global fixtures excepted) is queued instead of being
    /// persisted. Dropping the guard without committing discards the queue.
    ///
    /// # Returns
    /// The scope guard, or `NestedScope` if a scope is already active.
    pub fn begin_deferred(&self) -> Result<DeferredFlush<'_>, FixtureError> {
        self.batch.lock().begin()?;
        tracing::debug!("Deferred flush scope opened");
        Ok(DeferredFlush::new(self))
    }

    /// Runs `f` inside a deferred flush scope.
    ///
    /// Entities created by `f` are persisted together, in creation order,
    /// when it returns `Ok`. If `f` fails, nothing it queued is persisted
    /// and the error is returned as a [`FixtureError::FlushAborted`].
    ///
    /// # Arguments
    /// * `f` - Closure creating entities through the context
    ///
    /// # Returns
    /// Whatever `f` returned.
    pub fn with_deferred_flush<F, R>(&self, f: F) -> Result<R, FixtureError>
    where
        F: FnOnce(&FixtureContext) -> Result<R, FixtureError>,
    {
        let scope = self.begin_deferred()?;
        match f(self) {
            Ok(value) => {
                scope.commit()?;
                Ok(value)
            }
            Err(e) => {
                let dropped = scope.discard();
                tracing::warn!("Deferred flush scope failed, {} entities discarded: {}", dropped, e);
                Err(e.into_aborted())
            }
        }
    }

    /// Returns `true` while a deferred scope is accumulating.
    pub fn is_deferred(&self) -> bool {
        self.batch.lock().is_accumulating()
    }

    pub fn batch_state(&self) -> BatchState {
        self.batch.lock().state()
    }

    /// Commits entities staged in storage outside any deferred scope.
    ///
    /// Only needed with `auto_flush` disabled; the pending batch of an
    /// active scope is left alone.
    pub fn flush(&self) -> Result<usize, FixtureError> {
        self.storage.flush()
    }

    /// Restores a pristine state: empty storage, no globals, no pending
    /// batch, reseeded generator. Schemas stay registered.
    pub fn reset(&self) -> Result<(), FixtureError> {
        self.batch.lock().discard();
        self.storage.reset()?;
        self.registry.reset();
        self.generator.lock().reset();
        tracing::debug!("Fixture context reset");
        Ok(())
    }

    /// Hands built entities over to persistence.
    ///
    /// Queued into the pending batch while a scope is accumulating, unless
    /// `bypass_batch` is set; written through to storage otherwise.
    pub(crate) fn persist_entities(
        &self,
        entities: Vec<Entity>,
        bypass_batch: bool,
    ) -> Result<(), FixtureError> {
        if entities.is_empty() {
            return Ok(());
        }
        if !bypass_batch {
            let mut batch = self.batch.lock();
            if batch.is_accumulating() {
                let queued = entities.len();
                for entity in entities {
                    batch.push(entity)?;
                }
                tracing::trace!("Queued {} entities, {} pending", queued, batch.len());
                return Ok(());
            }
        }
        self.write_through(entities, bypass_batch || self.config.auto_flush)
    }

    /// Commits the pending batch: `Accumulating -> Flushing -> Idle`.
    pub(crate) fn commit_batch(&self) -> Result<usize, FixtureError> {
        let mut batch = self.batch.lock();
        let entities = batch.start_flush()?;
        if entities.is_empty() {
            batch.finish_flush();
            tracing::debug!("Deferred flush scope closed with an empty batch");
            return Ok(0);
        }

        let written = entities.len();
        match self.write_through(entities, true) {
            Ok(()) => {
                batch.finish_flush();
                tracing::debug!("Deferred flush committed {} entities", written);
                Ok(written)
            }
            Err(e) => {
                self.storage.rollback();
                batch.discard();
                tracing::warn!("Deferred flush of {} entities failed: {}", written, e);
                Err(e.into_aborted())
            }
        }
    }

    pub(crate) fn discard_batch(&self) -> usize {
        self.batch.lock().discard()
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.batch.lock().len()
    }

    fn write_through(&self, entities: Vec<Entity>, flush: bool) -> Result<(), FixtureError> {
        for entity in entities {
            if let Err(e) = self.storage.persist(entity) {
                self.storage.rollback();
                return Err(e);
            }
        }
        if flush {
            self.storage.flush()?;
        }
        Ok(())
    }
}

impl Default for FixtureContext {
    fn default() -> Self {
        Self::new(FixtureConfig::default())
    }
}

impl fmt::Debug for FixtureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureContext")
            .field("config", &self.config)
            .field("storage", &self.storage)
            .field("schemas", &self.schemas.names())
            .field("globals", &self.registry.keys())
            .field("batch_state", &self.batch_state())
            .finish_non_exhaustive()
    }
}
