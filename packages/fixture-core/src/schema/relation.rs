//! Relation between entity types.

use std::fmt;

/// Whether a relation points at one entity or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    ToOne,
    ToMany,
}

/// How related entities are persisted relative to their owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ownership {
    /// Related entities are persisted on their own
    #[default]
    Standard,
    /// Persisting the owner persists the related entities
    Cascade,
}

/// Number of related entities a to-many relation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cardinality {
    #[default]
    Any,
    Exactly(usize),
    AtLeast(usize),
}

impl Cardinality {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Cardinality::Any => true,
            Cardinality::Exactly(n) => count == n,
            Cardinality::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Any => f.write_str("any number of"),
            Cardinality::Exactly(n) => write!(f, "exactly {}", n),
            Cardinality::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Relation from one entity type to another.
#[derive(Debug, Clone)]
pub struct RelationDef {
    /// Field name in the owning schema
    pub name: String,
    /// Name of the target entity type
    pub target: String,
    /// To-one or to-many
    pub kind: RelationKind,
    /// Field on the target mirroring this relation
    pub inverse: Option<String>,
    /// Whether the relation must be populated
    pub mandatory: bool,
    /// Accepted number of related entities (to-many only)
    pub cardinality: Cardinality,
    /// Persistence mode of related entities
    pub ownership: Ownership,
}

impl RelationDef {
    pub fn to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, RelationKind::ToOne)
    }

    pub fn to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, RelationKind::ToMany)
    }

    fn new(name: impl Into<String>, target: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind,
            inverse: None,
            mandatory: false,
            cardinality: Cardinality::Any,
            ownership: Ownership::Standard,
        }
    }

    /// Declares the mirroring field on the target.
    pub fn inversed_by(mut self, field: impl Into<String>) -> Self {
        self.inverse = Some(field.into());
        self
    }

    /// Marks the relation mandatory; a to-many relation then needs at least one member.
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        if self.cardinality == Cardinality::Any {
            self.cardinality = Cardinality::AtLeast(1);
        }
        self
    }

    pub fn exactly(mut self, count: usize) -> Self {
        self.cardinality = Cardinality::Exactly(count);
        self
    }

    pub fn at_least(mut self, count: usize) -> Self {
        self.cardinality = Cardinality::AtLeast(count);
        self
    }

    pub fn cascade(mut self) -> Self {
        self.ownership = Ownership::Cascade;
        self
    }

    pub fn is_to_many(&self) -> bool {
        self.kind == RelationKind::ToMany
    }

    pub fn is_cascade(&self) -> bool {
        self.ownership == Ownership::Cascade
    }
}
