//! Fixture error types.

use thiserror::Error;

/// Fixture building, resolution and persistence errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FixtureError {
    /// Attribute or field could not be resolved
    #[error("Cannot build '{entity_type}': field '{field}' {reason}")]
    Specification {
        entity_type: String,
        field: String,
        reason: String,
    },

    /// Related entity count does not satisfy the declared cardinality
    #[error("Relation '{relation}' of '{entity_type}' expects {expected} related entities, got {actual}")]
    Cardinality {
        entity_type: String,
        relation: String,
        expected: String,
        actual: usize,
    },

    /// Same entity attached to two collections that must stay disjoint
    #[error("Entity {entity} appears in both '{first}' and '{second}' of '{entity_type}'")]
    OverlappingRelations {
        entity_type: String,
        first: String,
        second: String,
        entity: String,
    },

    /// Deferred scope failed; nothing queued inside it was persisted
    #[error("Deferred flush aborted: {source}")]
    FlushAborted { source: Box<FixtureError> },

    /// Deferred scope entered while another one is active
    #[error("Deferred flush scope already active")]
    NestedScope,

    /// Commit or discard requested with no active scope
    #[error("No deferred flush scope is active")]
    ScopeNotActive,

    /// Global key already bound to another entity type
    #[error("Global key '{key}' is bound to '{registered}', cannot resolve it as '{requested}'")]
    DuplicateGlobalKey {
        key: String,
        registered: String,
        requested: String,
    },

    /// Entity type has no registered schema
    #[error("Entity type '{entity_type}' is not registered")]
    UnknownEntityType { entity_type: String },

    /// Schema registered twice
    #[error("Schema for '{0}' already registered")]
    SchemaAlreadyRegistered(String),

    /// Field or relation declared twice in one schema
    #[error("Field '{field}' already exists in '{entity_type}'")]
    FieldAlreadyExists { entity_type: String, field: String },

    /// Entity not found in storage
    #[error("Entity {reference} not found")]
    EntityNotFound { reference: String },

    /// Flushed entity references a row that is neither stored nor staged
    #[error("Entity {entity} references missing entity {missing}")]
    DanglingReference { entity: String, missing: String },

    /// Repository assertion did not hold
    #[error("Assertion failed for '{entity_type}': {message}")]
    AssertionFailed {
        entity_type: String,
        message: String,
    },

    /// Stored rows could not be serialized
    #[error("Cannot serialize '{entity_type}' rows: {message}")]
    Serialization {
        entity_type: String,
        message: String,
    },

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,
}

impl FixtureError {
    /// Shorthand for a [`FixtureError::Specification`].
    pub fn specification(
        entity_type: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Specification {
            entity_type: entity_type.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wraps `self` into a [`FixtureError::FlushAborted`], unless it already is one.
    pub fn into_aborted(self) -> Self {
        match self {
            aborted @ Self::FlushAborted { .. } => aborted,
            other => Self::FlushAborted {
                source: Box::new(other),
            },
        }
    }
}
