//! Default value generation for unspecified fields.

#[allow(clippy::module_inception)]
mod generator;
mod random_source;

pub use generator::{Generator, GeneratorFn};
pub use random_source::{GeneratorSource, RandomSource};
