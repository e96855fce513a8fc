use super::specification::Specification;

/// Number of entities a plan realizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    One,
    Many(usize),
}

impl Multiplicity {
    pub fn count(&self) -> usize {
        match *self {
            Multiplicity::One => 1,
            Multiplicity::Many(n) => n,
        }
    }
}

/// One factory invocation: what to build and how many times.
///
/// Consumed by value when realized.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub entity_type: String,
    pub specification: Specification,
    pub multiplicity: Multiplicity,
}

impl BuildPlan {
    pub fn one(entity_type: impl Into<String>, specification: Specification) -> Self {
        Self {
            entity_type: entity_type.into(),
            specification,
            multiplicity: Multiplicity::One,
        }
    }

    pub fn many(entity_type: impl Into<String>, specification: Specification, count: usize) -> Self {
        Self {
            entity_type: entity_type.into(),
            specification,
            multiplicity: Multiplicity::Many(count),
        }
    }
}
