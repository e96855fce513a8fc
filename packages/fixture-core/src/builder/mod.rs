//! Object graph building from specifications.

mod graph;
mod graph_builder;

pub use graph_builder::GraphBuilder;
