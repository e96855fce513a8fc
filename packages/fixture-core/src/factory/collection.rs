use crate::context::FixtureContext;
use crate::entity::Entity;
use crate::error::FixtureError;
use crate::spec::Specification;

use super::factory::Factory;

/// `count` independent entities described by one factory.
///
/// Used as a to-many attribute (`factory.many(2)`) or created directly.
#[derive(Debug, Clone)]
pub struct FactoryCollection {
    factory: Factory,
    count: usize,
}

impl FactoryCollection {
    pub fn new(factory: Factory, count: usize) -> Self {
        Self { factory, count }
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Creates every entity of the collection.
    pub fn create(&self, ctx: &FixtureContext) -> Result<Vec<Entity>, FixtureError> {
        self.factory.create_many(ctx, self.count, Specification::new())
    }
}
