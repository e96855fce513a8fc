//! Relationship resolution: cardinality, ownership and bidirectional sync.

mod resolver;

pub use resolver::RelationshipResolver;
