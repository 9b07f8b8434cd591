//! Deferred resolution: units postponed at bind time and the queue that completes them.

mod ordering;
pub mod passes;
mod queue;
mod retry;
mod unit;

pub use ordering::{DependencyNode, DependencyOrderer};
pub use queue::{DeferredWorkQueue, QueueReport};
pub use retry::{RetryReport, RetryResolver};
pub use unit::{DeferredUnit, GenericPass, UnitKind, ValuePath};
