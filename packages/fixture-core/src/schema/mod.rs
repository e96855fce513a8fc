//! Entity schemas, field definitions, and relation metadata.

mod field;
mod relation;
#[allow(clippy::module_inception)]
mod schema;
mod schema_registry;

pub use field::FieldDef;
pub use relation::{Cardinality, Ownership, RelationDef, RelationKind};
pub use schema::EntitySchema;
pub use schema_registry::SchemaRegistry;
