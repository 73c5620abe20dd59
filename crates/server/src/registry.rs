//! Task registry.
//!
//! Maps a wire kind to a handler that can decode and run that task. Every
//! handler is the same generic adapter over [`Task`], so adding a task type
//! means one `register` call and no change to the dispatcher.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use compute_core::{result_type, Result, Task, TaskEnvelope};
use compute_tasks::{EuclideanTspTask, MandelbrotSetTask};
use tracing::debug;

/// Type-erased runner for one task kind.
pub trait TaskHandler: Send + Sync {
    /// Wire kind this handler accepts.
    fn kind(&self) -> &'static str;

    /// Type tag of the payload `run` returns.
    fn result_type(&self) -> String;

    /// Open the envelope, execute the task and encode its output.
    fn run(&self, envelope: &TaskEnvelope) -> Result<serde_json::Value>;
}

/// The one [`TaskHandler`] implementation: "decode `T`, call `execute`".
struct TypedHandler<T>(PhantomData<fn() -> T>);

impl<T: Task> TaskHandler for TypedHandler<T> {
    fn kind(&self) -> &'static str {
        T::KIND
    }

    fn result_type(&self) -> String {
        result_type::<T>()
    }

    fn run(&self, envelope: &TaskEnvelope) -> Result<serde_json::Value> {
        let task: T = envelope.open()?;
        let output = task.execute()?;
        Ok(serde_json::to_value(output)?)
    }
}

/// Registered task kinds.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    handlers: HashMap<&'static str, Arc<dyn TaskHandler>>,
}

impl TaskRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the TSP and Mandelbrot tasks.
    pub fn with_builtin_tasks() -> Self {
        let mut registry = Self::new();
        registry.register::<EuclideanTspTask>();
        registry.register::<MandelbrotSetTask>();
        registry
    }

    /// Accept tasks of type `T`.
    pub fn register<T: Task>(&mut self) {
        self.handlers
            .insert(T::KIND, Arc::new(TypedHandler::<T>(PhantomData)));
        debug!("Registered task kind: {}", T::KIND);
    }

    /// Handler for `kind`, if registered.
    pub fn handler(&self, kind: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(kind).cloned()
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}
