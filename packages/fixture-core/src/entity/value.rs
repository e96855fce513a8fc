use std::fmt;

use serde::{Deserialize, Serialize};

/// Persisted identity of an entity: its type plus a per-type id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity type name
    pub entity_type: String,
    /// Id allocated by the storage sequence for this type
    pub id: u64,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, id: u64) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.id)
    }
}

/// Value held by one field of an entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Unset field
    #[default]
    Null,
    /// Scalar value
    Scalar(serde_json::Value),
    /// To-one relation
    One(EntityRef),
    /// To-many relation, in attachment order
    Many(Vec<EntityRef>),
}

impl FieldValue {
    /// Returns every entity referenced by this value.
    pub fn references(&self) -> Vec<&EntityRef> {
        match self {
            FieldValue::One(reference) => vec![reference],
            FieldValue::Many(references) => references.iter().collect(),
            FieldValue::Null | FieldValue::Scalar(_) => Vec::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}
