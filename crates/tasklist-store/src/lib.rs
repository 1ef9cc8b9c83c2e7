//! Store adapter for the shared task list.
//!
//! Defines the [`TreeStore`] contract (subscribe, write, push, update, remove,
//! read-once over slash-delimited paths) and [`MemoryStore`], an in-process
//! implementation that can mirror its tree to a JSON file.

pub mod adapter;
pub mod error;
pub mod memory;
pub mod path;

pub use adapter::{Subscription, TreeStore};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use path::StorePath;
