//! adaptest-store: store implementations for adaptest.
//!
//! Implements the `AttemptStore`, `ItemStore`, and `ProfileStore` traits over
//! an in-memory snapshot that can be loaded from and saved to a JSON file.

pub mod memory;
pub mod snapshot;

pub use memory::InMemoryStore;
pub use snapshot::{Snapshot, SnapshotWarning};
