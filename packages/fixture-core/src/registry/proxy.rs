use crate::context::FixtureContext;
use crate::entity::{Entity, EntityRef};
use crate::error::FixtureError;

/// Handle on an entity, either holding a snapshot or only its identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Proxy {
    /// Snapshot taken when the proxy was created
    Direct(Entity),
    /// Identity only; re-fetched on every resolve
    Lazy(EntityRef),
}

impl Proxy {
    /// Returns the identity without touching storage.
    pub fn reference(&self) -> &EntityRef {
        match self {
            Proxy::Direct(entity) => entity.reference(),
            Proxy::Lazy(reference) => reference,
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Proxy::Lazy(_))
    }

    /// Returns `true` if the proxy denotes `entity`'s row.
    pub fn same_identity(&self, entity: &Entity) -> bool {
        self.reference() == entity.reference()
    }

    /// Resolves the proxy to an entity.
    ///
    /// `Direct` returns its snapshot, `Lazy` fetches the current row
    /// (pending batch first, then storage).
    pub fn resolve(&self, ctx: &FixtureContext) -> Result<Entity, FixtureError> {
        match self {
            Proxy::Direct(entity) => Ok(entity.clone()),
            Proxy::Lazy(_) => self.resolve_current(ctx),
        }
    }

    /// Re-fetches the row and keeps it as a `Direct` snapshot.
    pub fn refresh(&mut self, ctx: &FixtureContext) -> Result<(), FixtureError> {
        let entity = self.resolve_current(ctx)?;
        *self = Proxy::Direct(entity);
        Ok(())
    }

    fn resolve_current(&self, ctx: &FixtureContext) -> Result<Entity, FixtureError> {
        let reference = self.reference();
        ctx.find(reference)?
            .ok_or_else(|| FixtureError::EntityNotFound {
                reference: reference.to_string(),
            })
    }

    /// Detaches the proxy, keeping only the identity.
    pub fn detach(&mut self) {
        let reference = self.reference().clone();
        *self = Proxy::Lazy(reference);
    }
}

impl From<Entity> for Proxy {
    fn from(entity: Entity) -> Self {
        Proxy::Direct(entity)
    }
}
