use std::collections::HashMap;

use crate::entity::{Entity, EntityRef};

/// Entity produced during one build, and whether it gets persisted.
#[derive(Debug)]
struct Node {
    entity: Entity,
    persist: bool,
}

/// Entities touched while realizing one plan, in first-touch order.
///
/// First-touch order is dependency order: to-one targets are touched
/// before their owner, the owner before its to-many members.
#[derive(Debug, Default)]
pub(crate) struct Graph {
    nodes: Vec<Node>,
    index: HashMap<EntityRef, usize>,
}

impl Graph {
    /// Inserts or replaces an entity in place. `persist` is sticky.
    pub(crate) fn upsert(&mut self, entity: Entity, persist: bool) {
        match self.index.get(entity.reference()) {
            Some(&slot) => {
                let node = &mut self.nodes[slot];
                node.persist |= persist;
                node.entity = entity;
            }
            None => {
                self.index.insert(entity.reference().clone(), self.nodes.len());
                self.nodes.push(Node { entity, persist });
            }
        }
    }

    pub(crate) fn get(&self, reference: &EntityRef) -> Option<&Entity> {
        self.index
            .get(reference)
            .map(|&slot| &self.nodes[slot].entity)
    }

    /// Returns `true` if the entity is in the graph and marked for persistence.
    pub(crate) fn persists(&self, reference: &EntityRef) -> bool {
        self.index
            .get(reference)
            .is_some_and(|&slot| self.nodes[slot].persist)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Consumes the graph, keeping the entities to persist.
    pub(crate) fn into_persisted(self) -> Vec<Entity> {
        self.nodes
            .into_iter()
            .filter(|node| node.persist)
            .map(|node| node.entity)
            .collect()
    }
}
