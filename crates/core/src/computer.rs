//! The remote execution contract.

use async_trait::async_trait;

use crate::{Result, Task};

/// Name under which a compute node answers lookups.
pub const SERVICE_NAME: &str = "Computer";

/// Port a compute node listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 1099;

/// Something that executes tasks and hands back their results.
///
/// Each call runs the task exactly once and blocks the caller until it
/// finishes. Calls share no mutable state and may run concurrently.
#[async_trait]
pub trait Computer: Send + Sync {
    /// Execute `task` and return its output unchanged.
    async fn execute<T: Task>(&self, task: T) -> Result<T::Output>;
}
