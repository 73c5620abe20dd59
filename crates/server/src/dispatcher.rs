//! Task dispatch.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use compute_core::{Computer, ComputeError, Result, ResultEnvelope, Task, TaskEnvelope};
use tracing::{debug, info, warn};

use crate::TaskRegistry;

/// Runs sealed tasks through the registry.
///
/// Stateless apart from the read-only registry: every call decodes its own
/// task and runs it on a blocking worker, so concurrent calls never touch
/// each other.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<TaskRegistry>,
}

impl Dispatcher {
    /// Dispatcher over `registry`.
    pub fn new(registry: TaskRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Execute one task exactly once and wrap its output.
    pub async fn dispatch(&self, envelope: TaskEnvelope) -> Result<ResultEnvelope> {
        let request_id = envelope.request_id;
        let kind = envelope.kind.clone();

        let handler = self
            .registry
            .handler(&kind)
            .ok_or_else(|| ComputeError::UnsupportedTask(kind.clone()))?;

        let result_type = handler.result_type();
        debug!("Dispatching {} ({})", request_id, kind);
        let start = Instant::now();

        let outcome = tokio::task::spawn_blocking(move || handler.run(&envelope))
            .await
            .map_err(|e| ComputeError::Execution(format!("task `{}` aborted: {}", kind, e)))?;

        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(payload) => {
                info!("Executed {} ({}) in {} ms", request_id, kind, elapsed_ms);
                Ok(ResultEnvelope {
                    request_id,
                    result_type,
                    payload,
                    elapsed_ms,
                })
            }
            Err(e) => {
                warn!("Task {} ({}) failed: {}", request_id, kind, e);
                Err(e)
            }
        }
    }
}

/// [`Computer`] that runs tasks in this process through a [`Dispatcher`].
///
/// Tasks still go through the same seal / dispatch / decode path as remote
/// calls, so a task behaves identically here and across the wire.
#[derive(Clone)]
pub struct LocalComputer {
    dispatcher: Dispatcher,
}

impl LocalComputer {
    /// Local computer over `dispatcher`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Local computer with the built-in tasks registered.
    pub fn with_builtin_tasks() -> Self {
        Self::new(Dispatcher::new(TaskRegistry::with_builtin_tasks()))
    }
}

#[async_trait]
impl Computer for LocalComputer {
    async fn execute<T: Task>(&self, task: T) -> Result<T::Output> {
        let envelope = TaskEnvelope::seal(&task)?;
        self.dispatcher.dispatch(envelope).await?.decode::<T>()
    }
}
