//! The task contract.
//!
//! A task is an immutable bundle of plain values plus one operation that
//! turns those values into a typed result. The dispatcher only ever sees
//! this contract; it never learns what a particular task computes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::TaskError;

/// Marker for values that may cross the wire.
///
/// Implementing this is an explicit promise that the type carries only
/// value data (no handles, sockets or references to caller-local
/// resources). It is deliberately not blanket-implemented: every task type
/// opts in by hand, and both [`Computer::execute`](crate::Computer::execute)
/// and the server registry require it.
pub trait Transmissible: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// A self-contained unit of computation.
pub trait Task: Transmissible {
    /// Stable wire tag for this task type.
    const KIND: &'static str;

    /// The value produced by [`Task::execute`].
    type Output: Serialize + DeserializeOwned + Send + 'static;

    /// Structural checks on the task's own state.
    fn validate(&self) -> Result<(), TaskError> {
        Ok(())
    }

    /// Compute the result from the task's own data.
    ///
    /// Must be deterministic and free of side effects.
    fn execute(&self) -> Result<Self::Output, TaskError>;
}

/// Wire tag describing the output type of `T`.
pub fn result_type<T: Task>() -> String {
    format!("{}/output", T::KIND)
}
