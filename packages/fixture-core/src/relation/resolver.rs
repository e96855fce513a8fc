use std::collections::{HashMap, HashSet};

use crate::entity::{Entity, EntityRef, FieldValue};
use crate::error::FixtureError;
use crate::schema::{EntitySchema, RelationDef, RelationKind};

/// Applies cardinality and ownership rules when attaching related entities.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelationshipResolver;

impl RelationshipResolver {
    pub fn new() -> Self {
        Self
    }

    /// Attaches `related` to `owner` through `relation`.
    ///
    /// # Arguments
    /// * `owner` - Entity declaring the relation
    /// * `relation` - Relation metadata from the owner's schema
    /// * `related` - Identities to attach, in order
    ///
    /// # Returns
    /// `Err(FixtureError::Cardinality)` if the count does not satisfy the
    /// declared cardinality, `Err(FixtureError::Specification)` on a target
    /// type mismatch or a duplicate member.
    pub fn attach(
        &self,
        owner: &mut Entity,
        relation: &RelationDef,
        related: Vec<EntityRef>,
    ) -> Result<(), FixtureError> {
        let mut seen = HashSet::new();
        for reference in &related {
            if reference.entity_type != relation.target {
                return Err(FixtureError::specification(
                    owner.entity_type(),
                    &relation.name,
                    format!("expects '{}', got {}", relation.target, reference),
                ));
            }
            if !seen.insert(reference) {
                return Err(FixtureError::specification(
                    owner.entity_type(),
                    &relation.name,
                    format!("attaches {} twice", reference),
                ));
            }
        }

        match relation.kind {
            RelationKind::ToOne => {
                if related.len() > 1 || (relation.mandatory && related.is_empty()) {
                    return Err(FixtureError::Cardinality {
                        entity_type: owner.entity_type().to_string(),
                        relation: relation.name.clone(),
                        expected: if relation.mandatory {
                            "exactly 1".to_string()
                        } else {
                            "at most 1".to_string()
                        },
                        actual: related.len(),
                    });
                }
                let value = related
                    .into_iter()
                    .next()
                    .map_or(FieldValue::Null, FieldValue::One);
                owner.set(&relation.name, value);
            }
            RelationKind::ToMany => {
                self.check_cardinality(owner.entity_type(), relation, related.len())?;
                owner.set(&relation.name, FieldValue::Many(related));
            }
        }
        Ok(())
    }

    /// Checks `actual` against the relation's declared cardinality.
    pub fn check_cardinality(
        &self,
        entity_type: &str,
        relation: &RelationDef,
        actual: usize,
    ) -> Result<(), FixtureError> {
        if relation.cardinality.accepts(actual) {
            Ok(())
        } else {
            Err(FixtureError::Cardinality {
                entity_type: entity_type.to_string(),
                relation: relation.name.clone(),
                expected: relation.cardinality.to_string(),
                actual,
            })
        }
    }

    /// Mirrors `owner` into the inverse field of `related`.
    ///
    /// # Returns
    /// `true` if `related` changed.
    pub fn sync_inverse(&self, related: &mut Entity, inverse: &RelationDef, owner: &EntityRef) -> bool {
        match inverse.kind {
            RelationKind::ToOne => {
                if related.one(&inverse.name) == Some(owner) {
                    return false;
                }
                if let Some(previous) = related.one(&inverse.name) {
                    tracing::debug!(
                        "Moving {} from {} to {} through '{}'",
                        related.reference(),
                        previous,
                        owner,
                        inverse.name
                    );
                }
                related.set(&inverse.name, FieldValue::One(owner.clone()));
                true
            }
            RelationKind::ToMany => related.push_many(&inverse.name, owner.clone()),
        }
    }

    /// Takes `member` out of `owner`'s to-many `relation` after it moved elsewhere.
    ///
    /// # Returns
    /// `true` if the collection changed. Fails with `FixtureError::Cardinality`
    /// if the remaining members no longer satisfy the relation.
    pub fn detach(
        &self,
        owner: &mut Entity,
        relation: &RelationDef,
        member: &EntityRef,
    ) -> Result<bool, FixtureError> {
        if !owner.remove_many(&relation.name, member) {
            return Ok(false);
        }
        tracing::debug!(
            "Detached {} from '{}' of {}",
            member,
            relation.name,
            owner.reference()
        );
        self.check_cardinality(owner.entity_type(), relation, owner.many(&relation.name).len())?;
        Ok(true)
    }

    /// Checks that to-many collections sharing a target type have no common member.
    pub fn ensure_disjoint(&self, owner: &Entity, schema: &EntitySchema) -> Result<(), FixtureError> {
        let mut claimed: HashMap<&EntityRef, &str> = HashMap::new();
        for relation in schema.to_many_relations() {
            for member in owner.many(&relation.name) {
                if let Some(first) = claimed.insert(member, &relation.name) {
                    return Err(FixtureError::OverlappingRelations {
                        entity_type: owner.entity_type().to_string(),
                        first: first.to_string(),
                        second: relation.name.clone(),
                        entity: member.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Decides whether a related entity is persisted.
    ///
    /// Standard relations defer to the related entity's own factory; cascade
    /// relations follow the owner.
    pub fn persists_related(
        &self,
        relation: &RelationDef,
        owner_persists: bool,
        related_persists: bool,
    ) -> bool {
        if relation.is_cascade() {
            owner_persists
        } else {
            related_persists
        }
    }
}
