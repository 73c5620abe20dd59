//! Built-in tasks.
//!
//! Two CPU-bound computations that a compute node can run: an exhaustive
//! Euclidean TSP solver and an escape-time Mandelbrot grid.

#![warn(missing_docs)]

pub mod permutation;
pub mod tsp;
pub mod mandelbrot;

pub use permutation::{next_permutation, PermutationGenerator};
pub use tsp::{tour_cost, City, EuclideanTspTask, Tour};
pub use mandelbrot::{escape_count, EscapeCountGrid, MandelbrotSetTask, ESCAPE_RADIUS_SQUARED};
