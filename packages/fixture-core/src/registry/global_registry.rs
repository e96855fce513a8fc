use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use parking_lot::ReentrantMutex;

use crate::context::FixtureContext;
use crate::entity::{Entity, EntityRef};
use crate::error::FixtureError;
use crate::factory::Factory;

use super::proxy::Proxy;

#[derive(Debug, Default)]
struct RegistryState {
    /// Map of global key to the identity created for it
    entries: HashMap<String, EntityRef>,
    /// Keys whose factory is currently running
    resolving: HashSet<String>,
}

/// Shared fixtures: each key maps to exactly one persisted entity.
///
/// The lock is re-entrant so a global factory may resolve other globals
/// on the same thread; other threads wait until creation completes.
#[derive(Debug, Default)]
pub struct GlobalRegistry {
    state: ReentrantMutex<RefCell<RegistryState>>,
}

impl GlobalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entity bound to `key`, creating it through `factory` on first use.
    ///
    /// # Arguments
    /// * `ctx` - Context providing storage and schemas
    /// * `key` - Global key
    /// * `factory` - Factory used on first resolution
    ///
    /// # Returns
    /// The current row for `key`. Fails with `DuplicateGlobalKey` if `key`
    /// is bound to another entity type.
    pub fn resolve(
        &self,
        ctx: &FixtureContext,
        key: &str,
        factory: &Factory,
    ) -> Result<Entity, FixtureError> {
        let reference = self.reference_for(ctx, key, factory)?;
        ctx.find(&reference)?
            .ok_or_else(|| FixtureError::EntityNotFound {
                reference: reference.to_string(),
            })
    }

    /// Same as [`resolve`](Self::resolve), returned as a lazy [`Proxy`].
    pub fn resolve_as_proxy(
        &self,
        ctx: &FixtureContext,
        key: &str,
        factory: &Factory,
    ) -> Result<Proxy, FixtureError> {
        self.reference_for(ctx, key, factory).map(Proxy::Lazy)
    }

    fn reference_for(
        &self,
        ctx: &FixtureContext,
        key: &str,
        factory: &Factory,
    ) -> Result<EntityRef, FixtureError> {
        let guard = self.state.lock();
        {
            let mut state = guard.borrow_mut();
            if let Some(reference) = state.entries.get(key) {
                if reference.entity_type != factory.entity_type() {
                    return Err(FixtureError::DuplicateGlobalKey {
                        key: key.to_string(),
                        registered: reference.entity_type.clone(),
                        requested: factory.entity_type().to_string(),
                    });
                }
                tracing::trace!(key, %reference, "global fixture hit");
                return Ok(reference.clone());
            }
            if !state.resolving.insert(key.to_string()) {
                return Err(FixtureError::specification(
                    factory.entity_type(),
                    key,
                    "is a global key resolved recursively by its own factory",
                ));
            }
        }

        // The RefCell borrow is released; the factory may re-enter the registry.
        let created = factory.create_global(ctx);

        let mut state = guard.borrow_mut();
        state.resolving.remove(key);
        let reference = created?.reference().clone();
        tracing::debug!(key, %reference, "global fixture created");
        state.entries.insert(key.to_string(), reference.clone());
        Ok(reference)
    }

    /// Returns the identity bound to `key`, if any.
    pub fn get(&self, key: &str) -> Option<EntityRef> {
        let guard = self.state.lock();
        let reference = guard.borrow().entries.get(key).cloned();
        reference
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        let guard = self.state.lock();
        let len = guard.borrow().entries.len();
        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all bound keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let guard = self.state.lock();
        let mut keys: Vec<String> = guard.borrow().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Forgets every binding. Stored rows are left untouched.
    pub fn reset(&self) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.entries.clear();
        state.resolving.clear();
    }
}
