//! Compute node: the remote execution service.
//!
//! A [`TaskRegistry`] knows how to decode each task kind, the
//! [`Dispatcher`] runs sealed tasks through it, and [`ComputeServer`]
//! exposes the dispatcher over TCP.

#![warn(missing_docs)]

pub mod config;
pub mod registry;
pub mod dispatcher;
pub mod server;

pub use config::ServerConfig;
pub use registry::{TaskHandler, TaskRegistry};
pub use dispatcher::{Dispatcher, LocalComputer};
pub use server::ComputeServer;
