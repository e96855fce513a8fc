//! Realizes build plans into entity graphs.
//!
//! Each entity is built in three passes:
//! - Scalar fields from values, generators or schema defaults
//! - To-one relations, creating nested targets first
//! - To-many relations, creating members after the owner has an id

use std::slice;

use crate::context::FixtureContext;
use crate::entity::{Entity, EntityRef, FieldValue};
use crate::error::FixtureError;
use crate::factory::Factory;
use crate::relation::RelationshipResolver;
use crate::schema::{Cardinality, EntitySchema, RelationDef};
use crate::spec::{Attribute, BuildPlan, Specification};

use super::graph::Graph;

/// Owner a to-many member is built for.
#[derive(Debug, Clone)]
struct ParentLink {
    /// To-one field on the member pointing at the owner
    field: String,
    owner: EntityRef,
}

/// Per-entity build settings.
#[derive(Debug, Clone)]
struct BuildScope {
    persist: bool,
    depth: usize,
    link: Option<ParentLink>,
    /// To-many relation whose cardinality is checked once the caller attaches to it
    pending_inverse: Option<String>,
}

impl BuildScope {
    fn root(persist: bool) -> Self {
        Self {
            persist,
            depth: 0,
            link: None,
            pending_inverse: None,
        }
    }

    fn nested(&self, persist: bool) -> Self {
        Self {
            persist,
            depth: self.depth + 1,
            link: None,
            pending_inverse: None,
        }
    }
}

/// Builds entity graphs from [`BuildPlan`]s and hands them to persistence.
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    ctx: &'a FixtureContext,
    resolver: RelationshipResolver,
    bypass_batch: bool,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(ctx: &'a FixtureContext) -> Self {
        Self {
            ctx,
            resolver: RelationshipResolver::new(),
            bypass_batch: false,
        }
    }

    /// Persists immediately even while a deferred scope is active.
    pub fn bypass_batch(mut self) -> Self {
        self.bypass_batch = true;
        self
    }

    /// Builds every entity of `plan` and persists the resulting graph.
    ///
    /// # Arguments
    /// * `plan` - What to build, consumed
    /// * `persist` - Whether the plan's own entities are persisted
    ///
    /// # Returns
    /// The built root entities, in order.
    pub fn realize(&self, plan: BuildPlan, persist: bool) -> Result<Vec<Entity>, FixtureError> {
        let count = plan.multiplicity.count();
        self.check_collection_size(&plan.entity_type, "*", count)?;

        let mut graph = Graph::default();
        let mut roots = Vec::with_capacity(count);
        for _ in 0..count {
            let root = self.build_entity(
                &plan.entity_type,
                &plan.specification,
                BuildScope::root(persist),
                &mut graph,
            )?;
            roots.push(root.reference().clone());
        }

        let roots: Vec<Entity> = roots
            .iter()
            .filter_map(|reference| graph.get(reference).cloned())
            .collect();
        let built = graph.len();
        let entities = graph.into_persisted();
        tracing::debug!(
            entity_type = %plan.entity_type,
            count,
            built,
            persisted = entities.len(),
            "realized build plan"
        );
        self.ctx.persist_entities(entities, self.bypass_batch)?;
        Ok(roots)
    }

    fn build_entity(
        &self,
        entity_type: &str,
        spec: &Specification,
        scope: BuildScope,
        graph: &mut Graph,
    ) -> Result<Entity, FixtureError> {
        let max_depth = self.ctx.config().max_nesting_depth;
        if scope.depth > max_depth {
            return Err(FixtureError::specification(
                entity_type,
                "*",
                format!("is nested deeper than {} levels", max_depth),
            ));
        }

        let schema = self.ctx.schemas().get(entity_type)?;
        if let Some(unknown) = spec.names().find(|name| !schema.has_member(name)) {
            return Err(FixtureError::specification(
                entity_type,
                unknown,
                "is not a field or relation",
            ));
        }

        let id = self.ctx.storage().next_id(entity_type)?;
        let mut entity = Entity::new(EntityRef::new(entity_type, id));

        self.resolve_fields(&schema, spec, &mut entity)?;
        let syncs = self.resolve_to_one(&schema, spec, &scope, &mut entity, graph)?;

        // Owner goes in before its members
        graph.upsert(entity.clone(), scope.persist);

        for (relation, target) in syncs {
            self.sync_to_one_inverse(&schema, &relation, &target, &entity, &scope, graph)?;
        }
        self.resolve_to_many(&schema, spec, &scope, &mut entity, graph)?;
        self.resolver.ensure_disjoint(&entity, &schema)?;

        graph.upsert(entity.clone(), scope.persist);
        Ok(entity)
    }

    fn resolve_fields(
        &self,
        schema: &EntitySchema,
        spec: &Specification,
        entity: &mut Entity,
    ) -> Result<(), FixtureError> {
        for field in &schema.fields {
            let value = match spec.get(&field.name) {
                Some(Attribute::Value(value)) => Some(value.clone()),
                Some(Attribute::Generate(generator)) => {
                    Some(self.ctx.generate(&field.name, generator))
                }
                Some(_) => {
                    return Err(FixtureError::specification(
                        &schema.name,
                        &field.name,
                        "expects a value or a generator",
                    ))
                }
                None => field
                    .default
                    .as_ref()
                    .map(|generator| self.ctx.generate(&field.name, generator)),
            };

            match value {
                Some(value) => {
                    entity.set(&field.name, FieldValue::Scalar(value));
                }
                None if field.required => {
                    return Err(FixtureError::specification(
                        &schema.name,
                        &field.name,
                        "is required and has no default generator",
                    ))
                }
                None => {
                    entity.set(&field.name, FieldValue::Null);
                }
            }
        }
        Ok(())
    }

    /// Resolves to-one relations.
    ///
    /// # Returns
    /// Relations whose target must mirror `entity` once it is in the graph.
    fn resolve_to_one(
        &self,
        schema: &EntitySchema,
        spec: &Specification,
        scope: &BuildScope,
        entity: &mut Entity,
        graph: &mut Graph,
    ) -> Result<Vec<(RelationDef, EntityRef)>, FixtureError> {
        let mut syncs = Vec::new();
        for relation in schema.to_one_relations() {
            if let Some(link) = &scope.link {
                if link.field == relation.name {
                    entity.set(&relation.name, FieldValue::One(link.owner.clone()));
                    continue;
                }
            }

            let target = match spec.get(&relation.name) {
                None => None,
                Some(Attribute::Entity(reference)) => Some(reference.clone()),
                Some(Attribute::Proxy(proxy)) => Some(proxy.reference().clone()),
                Some(Attribute::Global { key, factory }) => {
                    Some(self.ctx.global(key, factory)?.reference().clone())
                }
                Some(Attribute::Factory(factory)) => {
                    let persist =
                        self.resolver
                            .persists_related(relation, scope.persist, factory.persists());
                    let mut nested = scope.nested(persist);
                    nested.pending_inverse = relation.inverse.clone();
                    let target =
                        self.build_entity(factory.entity_type(), factory.defaults(), nested, graph)?;
                    Some(target.reference().clone())
                }
                Some(_) => {
                    return Err(FixtureError::specification(
                        &schema.name,
                        &relation.name,
                        "expects an entity, a proxy, a global or a factory",
                    ))
                }
            };

            if target.is_none() && relation.mandatory {
                return Err(FixtureError::specification(
                    &schema.name,
                    &relation.name,
                    "is a mandatory relation and has no value",
                ));
            }
            if let (Some(target), Some(_)) = (&target, &relation.inverse) {
                syncs.push((relation.clone(), target.clone()));
            }
            self.resolver
                .attach(entity, relation, target.into_iter().collect())?;
        }
        Ok(syncs)
    }

    /// Adds `entity` to the inverse collection of its to-one `target`.
    fn sync_to_one_inverse(
        &self,
        schema: &EntitySchema,
        relation: &RelationDef,
        target: &EntityRef,
        entity: &Entity,
        scope: &BuildScope,
        graph: &mut Graph,
    ) -> Result<(), FixtureError> {
        let Some(inverse) = self.ctx.schemas().inverse_of(schema, relation)? else {
            return Ok(());
        };

        let (mut related, in_graph) = match graph.get(target) {
            Some(related) => (related.clone(), true),
            None => (self.lookup(target)?, false),
        };
        // A stored row must not point at an entity that is never stored
        let related_persists = !in_graph || graph.persists(target);
        if related_persists && !scope.persist {
            return Ok(());
        }

        if self
            .resolver
            .sync_inverse(&mut related, &inverse, entity.reference())
        {
            self.resolver.check_cardinality(
                related.entity_type(),
                &inverse,
                related.many(&inverse.name).len(),
            )?;
            graph.upsert(related, !in_graph);
        }
        Ok(())
    }

    fn resolve_to_many(
        &self,
        schema: &EntitySchema,
        spec: &Specification,
        scope: &BuildScope,
        entity: &mut Entity,
        graph: &mut Graph,
    ) -> Result<(), FixtureError> {
        for relation in schema.to_many_relations() {
            let inverse = self.ctx.schemas().inverse_of(schema, relation)?;
            let inverse = inverse.as_ref();

            let members = match spec.get(&relation.name) {
                None => Vec::new(),
                Some(Attribute::Collection(collection)) => self.build_members(
                    relation,
                    inverse,
                    collection.factory(),
                    collection.count(),
                    scope,
                    entity,
                    graph,
                )?,
                Some(Attribute::Factory(factory)) => {
                    self.build_members(relation, inverse, factory, 1, scope, entity, graph)?
                }
                Some(Attribute::Entities(references)) => {
                    self.adopt_members(relation, inverse, references, scope, entity, graph)?
                }
                Some(Attribute::Entity(reference)) => self.adopt_members(
                    relation,
                    inverse,
                    slice::from_ref(reference),
                    scope,
                    entity,
                    graph,
                )?,
                Some(Attribute::Proxy(proxy)) => self.adopt_members(
                    relation,
                    inverse,
                    slice::from_ref(proxy.reference()),
                    scope,
                    entity,
                    graph,
                )?,
                Some(_) => {
                    return Err(FixtureError::specification(
                        &schema.name,
                        &relation.name,
                        "expects factories, entities or proxies",
                    ))
                }
            };

            if scope.pending_inverse.as_deref() == Some(relation.name.as_str()) {
                // The entity under construction completes this collection
                let relaxed = RelationDef {
                    cardinality: Cardinality::Any,
                    ..relation.clone()
                };
                self.resolver.attach(entity, &relaxed, members)?;
            } else {
                self.resolver.attach(entity, relation, members)?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn build_members(
        &self,
        relation: &RelationDef,
        inverse: Option<&RelationDef>,
        factory: &Factory,
        count: usize,
        scope: &BuildScope,
        owner: &Entity,
        graph: &mut Graph,
    ) -> Result<Vec<EntityRef>, FixtureError> {
        if factory.entity_type() != relation.target {
            return Err(FixtureError::specification(
                owner.entity_type(),
                &relation.name,
                format!(
                    "expects a '{}' factory, got '{}'",
                    relation.target,
                    factory.entity_type()
                ),
            ));
        }
        self.check_collection_size(owner.entity_type(), &relation.name, count)?;

        // Members pointing back at an owner that is never stored stay unstored too
        let persist = self
            .resolver
            .persists_related(relation, scope.persist, factory.persists())
            && (scope.persist || inverse.is_none());
        let link = inverse.map(|inverse| ParentLink {
            field: inverse.name.clone(),
            owner: owner.reference().clone(),
        });

        let mut members = Vec::with_capacity(count);
        for _ in 0..count {
            let mut member_scope = scope.nested(persist);
            member_scope.link = link.clone();
            let member =
                self.build_entity(factory.entity_type(), factory.defaults(), member_scope, graph)?;
            members.push(member.reference().clone());
        }
        Ok(members)
    }

    /// Attaches already existing entities, pointing their inverse field at `owner`.
    ///
    /// A member moving away from another owner is removed from that owner's
    /// collection.
    fn adopt_members(
        &self,
        relation: &RelationDef,
        inverse: Option<&RelationDef>,
        references: &[EntityRef],
        scope: &BuildScope,
        owner: &Entity,
        graph: &mut Graph,
    ) -> Result<Vec<EntityRef>, FixtureError> {
        if let Some(inverse) = inverse {
            for reference in references {
                let (mut member, in_graph) = match graph.get(reference) {
                    Some(member) => (member.clone(), true),
                    None => (self.lookup(reference)?, false),
                };
                let member_persists = !in_graph || graph.persists(reference);
                if member_persists && !scope.persist {
                    continue;
                }
                let previous = member
                    .one(&inverse.name)
                    .filter(|previous| *previous != owner.reference())
                    .cloned();
                if self
                    .resolver
                    .sync_inverse(&mut member, inverse, owner.reference())
                {
                    graph.upsert(member, !in_graph);
                }
                if let Some(previous) = previous {
                    self.release_member(relation, &previous, reference, graph)?;
                }
            }
        }
        Ok(references.to_vec())
    }

    /// Removes `member` from the collection of the owner it moved away from.
    fn release_member(
        &self,
        relation: &RelationDef,
        previous: &EntityRef,
        member: &EntityRef,
        graph: &mut Graph,
    ) -> Result<(), FixtureError> {
        let (mut previous_owner, in_graph) = match graph.get(previous) {
            Some(previous_owner) => (previous_owner.clone(), true),
            None => (self.lookup(previous)?, false),
        };
        if self.resolver.detach(&mut previous_owner, relation, member)? {
            graph.upsert(previous_owner, !in_graph);
        }
        Ok(())
    }

    fn lookup(&self, reference: &EntityRef) -> Result<Entity, FixtureError> {
        self.ctx
            .find(reference)?
            .ok_or_else(|| FixtureError::EntityNotFound {
                reference: reference.to_string(),
            })
    }

    fn check_collection_size(
        &self,
        entity_type: &str,
        field: &str,
        count: usize,
    ) -> Result<(), FixtureError> {
        let limit = self.ctx.config().max_collection_size;
        if count > limit {
            return Err(FixtureError::specification(
                entity_type,
                field,
                format!("requests {} entities, limit is {}", count, limit),
            ));
        }
        Ok(())
    }
}
