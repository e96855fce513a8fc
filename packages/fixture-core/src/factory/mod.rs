//! Factories, factory collections and repository views.

mod collection;
#[allow(clippy::module_inception)]
mod factory;
mod repository;

pub use collection::FactoryCollection;
pub use factory::Factory;
pub use repository::Repository;
