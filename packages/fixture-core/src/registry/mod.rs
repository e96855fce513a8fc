//! Global fixtures and entity proxies.

mod global_registry;
mod proxy;

pub use global_registry::GlobalRegistry;
pub use proxy::Proxy;
