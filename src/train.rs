use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::check_len;
use crate::{Dataset, Error, Network, Result, Trainer, loss};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Number of passes over the dataset.
    pub iterations: usize,
    /// Stop early once an epoch's mean error is at or below this value.
    pub target_error: Option<f64>,
    /// Log progress every `n` epochs.
    pub log_every: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            iterations: crate::config::DEFAULT_ITERATIONS,
            target_error: None,
            log_every: None,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::Configuration("iterations must be > 0".to_owned()));
        }
        if let Some(target) = self.target_error {
            if !(target.is_finite() && target >= 0.0) {
                return Err(Error::Configuration(format!(
                    "target_error must be finite and >= 0, got {target}"
                )));
            }
        }
        if self.log_every == Some(0) {
            return Err(Error::Configuration("log_every must be > 0".to_owned()));
        }
        Ok(())
    }
}

/// Summary of one pass over the dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// Zero-based epoch index.
    pub epoch: usize,
    /// Mean per-example error, each measured before that example's update.
    pub mean_error: f64,
    pub max_error: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Ran every configured iteration.
    Completed,
    /// An epoch's mean error reached `target_error`.
    TargetReached,
    /// The epoch callback asked to stop.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainReport {
    /// Epochs actually run.
    pub epochs: usize,
    /// Mean error of the last epoch run.
    pub final_error: f64,
    pub stop: StopReason,
}

impl Network {
    /// Train on `data` for the configured number of iterations.
    ///
    /// Each iteration presents every example once, in dataset order, with one
    /// `learn_single` step per example. There is no shuffling, batching or
    /// convergence check.
    pub fn learn(&mut self, data: &Dataset) -> Result<TrainReport> {
        let cfg = TrainConfig {
            iterations: self.iterations(),
            ..TrainConfig::default()
        };
        self.learn_with(data, cfg)
    }

    /// Train with explicit loop settings.
    pub fn learn_with(&mut self, data: &Dataset, cfg: TrainConfig) -> Result<TrainReport> {
        self.learn_until(data, cfg, |_| ControlFlow::Continue(()))
    }

    /// Train, calling `on_epoch` after every pass.
    ///
    /// Returning `ControlFlow::Break(())` stops training after the current epoch.
    /// Buffers are allocated once up front; the per-example path does not allocate.
    pub fn learn_until<F>(
        &mut self,
        data: &Dataset,
        cfg: TrainConfig,
        mut on_epoch: F,
    ) -> Result<TrainReport>
    where
        F: FnMut(&EpochReport) -> ControlFlow<()>,
    {
        cfg.validate()?;
        self.check_dataset(data)?;

        let mut trainer = Trainer::new(self);
        let mut report = TrainReport {
            epochs: 0,
            final_error: 0.0,
            stop: StopReason::Completed,
        };

        for epoch in 0..cfg.iterations {
            let mut sum = 0.0_f64;
            let mut max = 0.0_f64;
            for (input, target) in data.iter() {
                let error = self.step(&mut trainer, input, target);
                sum += error;
                max = max.max(error);
            }

            let epoch_report = EpochReport {
                epoch,
                mean_error: sum / data.len() as f64,
                max_error: max,
            };
            report.epochs = epoch + 1;
            report.final_error = epoch_report.mean_error;

            if cfg.log_every.is_some_and(|every| (epoch + 1) % every == 0) {
                info!(
                    epoch = epoch + 1,
                    mean_error = epoch_report.mean_error,
                    max_error = epoch_report.max_error,
                    "training progress"
                );
            }

            if cfg
                .target_error
                .is_some_and(|target| epoch_report.mean_error <= target)
            {
                debug!(epoch = epoch + 1, "target error reached");
                report.stop = StopReason::TargetReached;
                break;
            }
            if on_epoch(&epoch_report).is_break() {
                debug!(epoch = epoch + 1, "training interrupted");
                report.stop = StopReason::Interrupted;
                break;
            }
        }

        Ok(report)
    }

    /// Mean halved squared error over `data`, without training.
    pub fn evaluate(&self, data: &Dataset) -> Result<f64> {
        self.check_dataset(data)?;

        let mut scratch = self.scratch();
        let mut total = 0.0_f64;
        for (input, target) in data.iter() {
            let output = self.forward(input, &mut scratch);
            total += loss::half_sse(output, target);
        }
        Ok(total / data.len() as f64)
    }

    fn check_dataset(&self, data: &Dataset) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidData("dataset must not be empty".to_owned()));
        }
        check_len("dataset input", self.input_size(), data.input_dim())?;
        check_len("dataset target", self.output_size(), data.target_dim())
    }
}
