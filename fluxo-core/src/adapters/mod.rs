//! Port implementations

pub mod memory;

pub use memory::InMemoryBackend;
