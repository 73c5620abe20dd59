//! Escape-time evaluation of the Mandelbrot set over a square grid.

use compute_core::{Task, TaskError, Transmissible};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Squared modulus at which an orbit counts as escaped (|z| >= 2).
pub const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

/// Escape count for the point `c = c_re + c_im·i`.
///
/// Starts at `k = 1` with `z = 0` and applies `z <- z² + c`, bumping `k`
/// after every application, until `|z|² >= 4` or `k` reaches `limit`.
/// The result is always in `[1, limit]` for `limit >= 1`.
pub fn escape_count(c_re: f64, c_im: f64, limit: u32) -> u32 {
    let mut k = 1;
    let (mut re, mut im) = (0.0_f64, 0.0_f64);

    while re * re + im * im < ESCAPE_RADIUS_SQUARED && k < limit {
        let next_re = re * re - im * im + c_re;
        im = 2.0 * re * im + c_im;
        re = next_re;
        k += 1;
    }
    k
}

/// Escape counts for every cell of a square grid.
///
/// `counts[i][j]` belongs to the point `(x0 + i·L/N, y0 + j·L/N)`, so the
/// first index walks the real axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeCountGrid {
    resolution: u32,
    iteration_limit: u32,
    counts: Vec<Vec<u32>>,
}

impl EscapeCountGrid {
    /// Cells per edge.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// The limit the grid was evaluated with.
    pub fn iteration_limit(&self) -> u32 {
        self.iteration_limit
    }

    /// Count for cell `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> Option<u32> {
        self.counts.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Rows indexed by `i`.
    pub fn rows(&self) -> &[Vec<u32>] {
        &self.counts
    }

    /// Whether cell `(i, j)` hit the limit, i.e. is likely in the set.
    pub fn in_set(&self, i: usize, j: usize) -> bool {
        self.get(i, j) == Some(self.iteration_limit)
    }
}

/// Mandelbrot grid task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MandelbrotSetTask {
    /// Lower-left corner `(x0, y0)` of the square region
    pub corner: [f64; 2],
    /// Edge length of the square region
    pub edge_length: f64,
    /// Cells per edge
    pub resolution: u32,
    /// Iterations after which a point counts as in the set
    pub iteration_limit: u32,
}

impl MandelbrotSetTask {
    /// Task over the square with lower-left `corner` and side `edge_length`.
    pub fn new(
        corner: [f64; 2],
        edge_length: f64,
        resolution: u32,
        iteration_limit: u32,
    ) -> Result<Self, TaskError> {
        let task = Self {
            corner,
            edge_length,
            resolution,
            iteration_limit,
        };
        task.validate()?;
        Ok(task)
    }

    /// Point of the complex plane sampled for cell `(i, j)`.
    pub fn cell_point(&self, i: u32, j: u32) -> (f64, f64) {
        let n = self.resolution as f64;
        (
            self.corner[0] + (i as f64 * self.edge_length / n),
            self.corner[1] + (j as f64 * self.edge_length / n),
        )
    }
}

impl Transmissible for MandelbrotSetTask {}

impl Task for MandelbrotSetTask {
    const KIND: &'static str = "mandelbrot_set";
    type Output = EscapeCountGrid;

    fn validate(&self) -> Result<(), TaskError> {
        if self.resolution == 0 {
            return Err(TaskError::InvalidArgument(
                "grid resolution must be at least 1".to_string(),
            ));
        }
        if self.iteration_limit == 0 {
            return Err(TaskError::InvalidArgument(
                "iteration limit must be at least 1".to_string(),
            ));
        }
        if !self.corner.iter().all(|v| v.is_finite()) || !self.edge_length.is_finite() {
            return Err(TaskError::InvalidArgument(
                "region coordinates must be finite".to_string(),
            ));
        }
        Ok(())
    }

    fn execute(&self) -> Result<EscapeCountGrid, TaskError> {
        self.validate()?;
        debug!(
            "Evaluating {}x{} grid at ({}, {}) edge {} limit {}",
            self.resolution,
            self.resolution,
            self.corner[0],
            self.corner[1],
            self.edge_length,
            self.iteration_limit
        );

        let counts = (0..self.resolution)
            .map(|i| {
                (0..self.resolution)
                    .map(|j| {
                        let (re, im) = self.cell_point(i, j);
                        escape_count(re, im, self.iteration_limit)
                    })
                    .collect()
            })
            .collect();

        Ok(EscapeCountGrid {
            resolution: self.resolution,
            iteration_limit: self.iteration_limit,
            counts,
        })
    }
}
