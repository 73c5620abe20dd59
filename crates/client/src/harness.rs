//! Round-trip timing harness.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use compute_core::{Computer, ComputeError, Result, Task};
use tracing::{debug, info};

/// Timings of a task run several times against one computer.
#[derive(Debug, Clone)]
pub struct TrialReport<O> {
    /// Task kind
    pub task: &'static str,
    /// Wall-clock time of the first trial
    pub started_at: DateTime<Utc>,
    /// Round-trip time of every trial, in order
    pub trials: Vec<Duration>,
    /// Output of the last trial
    pub output: O,
}

impl<O> TrialReport<O> {
    /// Mean round-trip time.
    pub fn average(&self) -> Duration {
        if self.trials.is_empty() {
            return Duration::ZERO;
        }
        self.trials.iter().sum::<Duration>() / self.trials.len() as u32
    }

    /// Printable timing table.
    pub fn table(&self) -> String {
        let mut out = format!(
            "Task: {}\nStarted: {}\nElapsed Time:\n",
            self.task,
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        out.push_str("----------------------------------\n");
        for (i, elapsed) in self.trials.iter().enumerate() {
            out.push_str(&format!("Trial {}: {} ms\n", i + 1, elapsed.as_millis()));
        }
        out.push_str(&format!("Avg. Elapsed Time: {} ms\n", self.average().as_millis()));
        out.push_str("----------------------------------");
        out
    }
}

/// Runs tasks repeatedly and times each round trip.
pub struct Harness<'a, C> {
    computer: &'a C,
    trials: usize,
}

impl<'a, C: Computer> Harness<'a, C> {
    /// Harness running each task `trials` times on `computer`.
    pub fn new(computer: &'a C, trials: usize) -> Self {
        Self { computer, trials }
    }

    /// Run `task` the configured number of times.
    ///
    /// Stops at the first failing trial and returns its error.
    pub async fn run<T: Task + Clone>(&self, task: T) -> Result<TrialReport<T::Output>> {
        if self.trials == 0 {
            return Err(ComputeError::InvalidArgument(
                "trial count must be at least 1".to_string(),
            ));
        }

        let started_at = Utc::now();
        let mut trials = Vec::with_capacity(self.trials);
        let mut output = None;

        for trial in 1..=self.trials {
            let start = Instant::now();
            let result = self.computer.execute(task.clone()).await?;
            let elapsed = start.elapsed();
            debug!("{} trial {} took {:?}", T::KIND, trial, elapsed);
            trials.push(elapsed);
            output = Some(result);
        }

        let output = output.ok_or_else(|| {
            ComputeError::Execution("harness finished without an output".to_string())
        })?;
        let report = TrialReport {
            task: T::KIND,
            started_at,
            trials,
            output,
        };
        info!(
            "{}: {} trials, average {} ms",
            report.task,
            report.trials.len(),
            report.average().as_millis()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute_server::LocalComputer;
    use compute_tasks::{EuclideanTspTask, MandelbrotSetTask};

    #[tokio::test]
    async fn test_harness_runs_each_trial() {
        let computer = LocalComputer::with_builtin_tasks();
        let harness = Harness::new(&computer, 3);
        let task = EuclideanTspTask::from_coordinates(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]])
            .unwrap();

        let report = harness.run(task).await.unwrap();
        assert_eq!(report.task, "euclidean_tsp");
        assert_eq!(report.trials.len(), 3);
        assert_eq!(report.output.order, vec![0, 1, 2]);

        let table = report.table();
        assert!(table.starts_with("Task: euclidean_tsp\nStarted: "));
        let started = report.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        assert!(table.contains(&started));
        assert!(table.contains("Trial 3:"));
        assert!(table.contains("Avg. Elapsed Time:"));
    }

    #[tokio::test]
    async fn test_zero_trials_rejected() {
        let computer = LocalComputer::with_builtin_tasks();
        let harness = Harness::new(&computer, 0);
        let task = MandelbrotSetTask::new([0.0, 0.0], 1.0, 1, 1).unwrap();
        let err = harness.run(task).await.unwrap_err();
        assert!(matches!(err, ComputeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_failure_stops_the_run() {
        let computer = LocalComputer::with_builtin_tasks();
        let harness = Harness::new(&computer, 5);
        let task = MandelbrotSetTask {
            corner: [0.0, 0.0],
            edge_length: 1.0,
            resolution: 0,
            iteration_limit: 2,
        };
        assert!(matches!(
            harness.run(task).await,
            Err(ComputeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_average() {
        let report = TrialReport {
            task: "x",
            started_at: Utc::now(),
            trials: vec![Duration::from_millis(10), Duration::from_millis(30)],
            output: (),
        };
        assert_eq!(report.average(), Duration::from_millis(20));
    }
}
