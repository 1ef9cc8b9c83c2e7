//! Domain types and the pure view-model builder for the shared task list.

/// Local mirror of the active task subtree.
pub mod collection;
/// Identifier types.
pub mod id;
/// Task payloads and input validation.
pub mod task;
/// Derived, render-ready projection.
pub mod view;

pub use collection::{MalformedEntry, MalformedReason, TaskCollection};
pub use id::{InvalidTaskId, TaskId};
pub use task::{EmptyTaskText, Task, TaskRecord, TaskText};
pub use view::{ViewModel, build_view_model, percent};
