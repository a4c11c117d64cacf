//! Space memory implementations for Weaver.

pub mod in_memory;

pub use in_memory::InMemorySpaceMemory;
