//! Declarative entity specifications and build plans.

mod attribute;
mod build_plan;
mod specification;

pub use attribute::Attribute;
pub use build_plan::{BuildPlan, Multiplicity};
pub use specification::Specification;
