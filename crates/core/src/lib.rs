//! Compute core: the task contract and everything that crosses the wire.
//!
//! Tasks implement [`Task`]; anything that can run them implements
//! [`Computer`]. The envelopes in [`envelope`] carry tasks and results
//! between the two without the server knowing any concrete task type.

#![warn(missing_docs)]

mod id;
mod error;
mod task;
mod computer;
pub mod envelope;

pub use id::RequestId;
pub use error::{ComputeError, ErrorKind, Result, TaskError};
pub use task::{result_type, Task, Transmissible};
pub use computer::{Computer, DEFAULT_PORT, SERVICE_NAME};
pub use envelope::{Reply, Request, Response, ResultEnvelope, TaskEnvelope, WireError};
