//! Sync state storage
//!
//! The pipeline loads state once at the start of a run and saves it once at
//! the end. The trait-based design allows swapping the JSON file store for
//! the in-memory one in tests.

mod json;
mod memory;
mod traits;

pub use json::JsonStateStore;
pub use memory::InMemoryStateStore;
pub use traits::StateStore;
