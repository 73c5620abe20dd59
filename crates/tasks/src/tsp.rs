//! Traveling salesman over points in the Euclidean plane.
//!
//! The solver is exhaustive: it walks all n! permutations of the cities and
//! keeps the cheapest closed tour. That is only practical up to roughly ten
//! or eleven cities, and it is meant to be exactly that.

use compute_core::{Task, TaskError, Transmissible};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::PermutationGenerator;

/// A point in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl City {
    /// City at `(x, y)`.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &City) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<[f64; 2]> for City {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// The minimal tour found by [`EuclideanTspTask`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    /// City indices in visiting order; the tour closes back to the first
    pub order: Vec<usize>,
    /// Total length of the closed tour
    pub cost: f64,
}

/// Length of the closed tour visiting `cities` in `order`.
///
/// Edges are summed in visiting order, last city back to the first.
pub fn tour_cost(cities: &[City], order: &[usize]) -> f64 {
    let n = order.len();
    let mut cost = 0.0;
    for j in 0..n {
        cost += cities[order[j]].distance(&cities[order[(j + 1) % n]]);
    }
    cost
}

/// Brute-force TSP task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EuclideanTspTask {
    cities: Vec<City>,
}

impl EuclideanTspTask {
    /// Task over `cities`, in the order given.
    pub fn new(cities: Vec<City>) -> Result<Self, TaskError> {
        let task = Self { cities };
        task.validate()?;
        Ok(task)
    }

    /// Task from raw `[x, y]` pairs.
    pub fn from_coordinates(coordinates: &[[f64; 2]]) -> Result<Self, TaskError> {
        Self::new(coordinates.iter().copied().map(City::from).collect())
    }

    /// The cities, in construction order.
    pub fn cities(&self) -> &[City] {
        &self.cities
    }
}

impl Transmissible for EuclideanTspTask {}

impl Task for EuclideanTspTask {
    const KIND: &'static str = "euclidean_tsp";
    type Output = Tour;

    fn validate(&self) -> Result<(), TaskError> {
        if self.cities.is_empty() {
            return Err(TaskError::InvalidArgument(
                "TSP needs at least one city".to_string(),
            ));
        }
        if let Some(i) = self
            .cities
            .iter()
            .position(|c| !c.x.is_finite() || !c.y.is_finite())
        {
            return Err(TaskError::InvalidArgument(format!(
                "city {} has a non-finite coordinate",
                i
            )));
        }
        Ok(())
    }

    fn execute(&self) -> Result<Tour, TaskError> {
        self.validate()?;
        debug!("Solving TSP over {} cities", self.cities.len());

        let mut permutations = PermutationGenerator::new(self.cities.len());
        let mut best: Option<Tour> = None;

        loop {
            let order = permutations.current();
            let cost = tour_cost(&self.cities, order);

            // Strictly smaller: the first minimal permutation wins ties.
            if best.as_ref().map_or(true, |b| cost < b.cost) {
                best = Some(Tour {
                    order: order.to_vec(),
                    cost,
                });
            }

            if !permutations.advance() {
                break;
            }
        }

        let tour = best.ok_or_else(|| {
            TaskError::Execution("permutation enumeration produced no tour".to_string())
        })?;
        if !tour.cost.is_finite() {
            return Err(TaskError::InvalidArgument(
                "coordinates are too far apart: tour cost overflows".to_string(),
            ));
        }
        debug!("Minimal tour cost {:.6}: {:?}", tour.cost, tour.order);
        Ok(tour)
    }
}
