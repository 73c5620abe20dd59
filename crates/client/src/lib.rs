//! Compute client: remote handle, timing harness and result rendering.

#![warn(missing_docs)]

pub mod config;
pub mod remote;
pub mod harness;
pub mod render;

pub use config::ClientConfig;
pub use remote::RemoteComputer;
pub use harness::{Harness, TrialReport};
pub use render::{render_grid, render_tour, Palette, RenderError};
