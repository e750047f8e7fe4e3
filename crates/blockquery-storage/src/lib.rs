//! blockquery-storage — block sources that live outside any node.
//!
//! Backends:
//! - [`memory`] — in-memory synthetic chain (dev/testing, no persistence)

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::InMemoryBlockSource;
