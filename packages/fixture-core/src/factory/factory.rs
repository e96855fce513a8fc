use crate::builder::GraphBuilder;
use crate::context::FixtureContext;
use crate::entity::Entity;
use crate::error::FixtureError;
use crate::registry::Proxy;
use crate::spec::{Attribute, BuildPlan, Specification};

use super::collection::FactoryCollection;
use super::repository::Repository;

/// Specification-driven builder for one entity type.
///
/// A factory is a cheap, cloneable description: default attributes plus a
/// persistence mode. Nothing happens until one of the `create*` methods is
/// called with a [`FixtureContext`].
#[derive(Debug, Clone)]
pub struct Factory {
    entity_type: String,
    defaults: Specification,
    persist: bool,
}

impl Factory {
    /// Creates a persisting factory with no default attributes.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            defaults: Specification::new(),
            persist: true,
        }
    }

    /// Returns a copy with one default attribute overridden.
    pub fn with(mut self, name: impl Into<String>, attribute: impl Into<Attribute>) -> Self {
        self.defaults = self.defaults.with(name, attribute);
        self
    }

    /// Returns a copy with `overrides` merged over the defaults.
    pub fn with_spec(mut self, overrides: &Specification) -> Self {
        self.defaults = self.defaults.merged(overrides);
        self
    }

    /// Returns a copy whose entities are built but never persisted.
    pub fn without_persisting(mut self) -> Self {
        self.persist = false;
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn defaults(&self) -> &Specification {
        &self.defaults
    }

    pub fn persists(&self) -> bool {
        self.persist
    }

    /// Describes `count` independent entities from this factory.
    pub fn many(&self, count: usize) -> FactoryCollection {
        FactoryCollection::new(self.clone(), count)
    }

    /// Creates one entity from the defaults.
    pub fn create(&self, ctx: &FixtureContext) -> Result<Entity, FixtureError> {
        self.create_with(ctx, Specification::new())
    }

    /// Creates one entity with `overrides` applied over the defaults.
    pub fn create_with(
        &self,
        ctx: &FixtureContext,
        overrides: Specification,
    ) -> Result<Entity, FixtureError> {
        let plan = BuildPlan::one(&self.entity_type, self.defaults.merged(&overrides));
        let created = GraphBuilder::new(ctx).realize(plan, self.persist)?;
        self.single(created)
    }

    /// Creates one entity and wraps it in a [`Proxy`].
    pub fn create_proxy(
        &self,
        ctx: &FixtureContext,
        overrides: Specification,
    ) -> Result<Proxy, FixtureError> {
        self.create_with(ctx, overrides).map(Proxy::Direct)
    }

    /// Creates `count` independent entities sharing `overrides`.
    pub fn create_many(
        &self,
        ctx: &FixtureContext,
        count: usize,
        overrides: Specification,
    ) -> Result<Vec<Entity>, FixtureError> {
        let plan = BuildPlan::many(&self.entity_type, self.defaults.merged(&overrides), count);
        GraphBuilder::new(ctx).realize(plan, self.persist)
    }

    /// Builds one entity without persisting it, whatever the factory's mode.
    pub fn build(
        &self,
        ctx: &FixtureContext,
        overrides: Specification,
    ) -> Result<Entity, FixtureError> {
        let plan = BuildPlan::one(&self.entity_type, self.defaults.merged(&overrides));
        let built = GraphBuilder::new(ctx).realize(plan, false)?;
        self.single(built)
    }

    /// Creates and flushes immediately, outside any deferred scope.
    pub(crate) fn create_global(&self, ctx: &FixtureContext) -> Result<Entity, FixtureError> {
        let plan = BuildPlan::one(&self.entity_type, self.defaults.clone());
        let created = GraphBuilder::new(ctx).bypass_batch().realize(plan, true)?;
        self.single(created)
    }

    /// Repository view over this factory's entity type.
    pub fn repository<'a>(&self, ctx: &'a FixtureContext) -> Repository<'a> {
        Repository::new(ctx, &self.entity_type)
    }

    fn single(&self, created: Vec<Entity>) -> Result<Entity, FixtureError> {
        created
            .into_iter()
            .next()
            .ok_or_else(|| FixtureError::specification(&self.entity_type, "*", "built no entity"))
    }
}
