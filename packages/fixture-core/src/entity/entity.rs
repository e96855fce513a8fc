use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::{EntityRef, FieldValue};

/// Domain object produced by a factory.
///
/// Identity is the [`EntityRef`]; two entities with the same reference are
/// the same row, whatever their field snapshots say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    reference: EntityRef,
    fields: BTreeMap<String, FieldValue>,
}

impl Entity {
    /// Creates an entity with no fields set.
    pub fn new(reference: EntityRef) -> Self {
        Self {
            reference,
            fields: BTreeMap::new(),
        }
    }

    pub fn reference(&self) -> &EntityRef {
        &self.reference
    }

    pub fn id(&self) -> u64 {
        self.reference.id
    }

    pub fn entity_type(&self) -> &str {
        &self.reference.entity_type
    }

    /// Returns `true` if both entities denote the same persisted row.
    pub fn same_identity(&self, other: &Entity) -> bool {
        self.reference == other.reference
    }

    /// Returns the raw field value, `None` if the field was never set.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(field.into(), value)
    }

    /// Returns a scalar field value.
    pub fn scalar(&self, field: &str) -> Option<&serde_json::Value> {
        match self.fields.get(field) {
            Some(FieldValue::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns the target of a to-one relation.
    pub fn one(&self, field: &str) -> Option<&EntityRef> {
        match self.fields.get(field) {
            Some(FieldValue::One(reference)) => Some(reference),
            _ => None,
        }
    }

    /// Returns the members of a to-many relation (empty if unset).
    pub fn many(&self, field: &str) -> &[EntityRef] {
        match self.fields.get(field) {
            Some(FieldValue::Many(references)) => references,
            _ => &[],
        }
    }

    /// Appends `reference` to a to-many relation unless already present.
    ///
    /// # Returns
    /// `true` if the collection changed.
    pub fn push_many(&mut self, field: &str, reference: EntityRef) -> bool {
        let slot = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| FieldValue::Many(Vec::new()));
        match slot {
            FieldValue::Many(references) => {
                if references.contains(&reference) {
                    false
                } else {
                    references.push(reference);
                    true
                }
            }
            other => {
                *other = FieldValue::Many(vec![reference]);
                true
            }
        }
    }

    /// Removes `reference` from a to-many relation.
    ///
    /// # Returns
    /// `true` if the collection changed.
    pub fn remove_many(&mut self, field: &str, reference: &EntityRef) -> bool {
        match self.fields.get_mut(field) {
            Some(FieldValue::Many(references)) => {
                let before = references.len();
                references.retain(|r| r != reference);
                references.len() != before
            }
            _ => false,
        }
    }

    /// Iterates over `(field, value)` pairs in field-name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns every entity this one references through its relations.
    pub fn references(&self) -> Vec<&EntityRef> {
        self.fields
            .values()
            .flat_map(|value| value.references())
            .collect()
    }
}
