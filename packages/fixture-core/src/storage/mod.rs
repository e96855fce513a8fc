//! Storage backend interface and the in-memory implementation.

mod backend;
mod memory;
mod table;

pub use backend::StorageBackend;
pub use memory::InMemoryStorage;
pub use table::EntityTable;
