//! Entities, identities and field values.

#[allow(clippy::module_inception)]
mod entity;
mod value;

pub use entity::Entity;
pub use value::{EntityRef, FieldValue};
