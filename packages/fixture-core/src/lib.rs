//! Fixture engine for building related test entities.
//!
//! Provides specification-driven factories, relationship resolution with
//! standard and cascade ownership, a global fixture registry, and deferred
//! persistence scopes on top of a pluggable storage backend.

pub mod batch;
pub mod builder;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod factory;
pub mod generator;
pub mod registry;
pub mod relation;
pub mod schema;
pub mod spec;
pub mod storage;

pub use config::FixtureConfig;
pub use context::FixtureContext;
pub use error::FixtureError;
