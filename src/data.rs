//! Contiguous training data.
//!
//! The training loop operates on slices to avoid per-step allocations. `Dataset`
//! stores inputs and targets as validated, row-major buffers.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One supervised example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub input: Vec<f64>,
    pub target: Vec<f64>,
}

impl Example {
    pub fn new(input: impl Into<Vec<f64>>, target: impl Into<Vec<f64>>) -> Self {
        Self {
            input: input.into(),
            target: target.into(),
        }
    }
}

/// A supervised dataset: inputs (X) and targets (Y).
///
/// Stored as contiguous buffers with row-major layout:
/// - `inputs.len() == len * input_dim`
/// - `targets.len() == len * target_dim`
#[derive(Debug, Clone)]
pub struct Dataset {
    inputs: Vec<f64>,
    targets: Vec<f64>,
    len: usize,
    input_dim: usize,
    target_dim: usize,
}

impl Dataset {
    /// Build a dataset from flat buffers.
    ///
    /// `inputs` is `(len, input_dim)` and `targets` is `(len, target_dim)`.
    pub fn from_flat(
        inputs: Vec<f64>,
        targets: Vec<f64>,
        input_dim: usize,
        target_dim: usize,
    ) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        if target_dim == 0 {
            return Err(Error::InvalidData("target_dim must be > 0".to_owned()));
        }
        if !inputs.len().is_multiple_of(input_dim) {
            return Err(Error::InvalidData(format!(
                "inputs length {} is not divisible by input_dim {input_dim}",
                inputs.len()
            )));
        }

        let len = inputs.len() / input_dim;
        if len == 0 {
            return Err(Error::InvalidData("dataset must not be empty".to_owned()));
        }
        if targets.len() != len * target_dim {
            return Err(Error::InvalidData(format!(
                "targets length {} does not match len * target_dim ({len} * {target_dim})",
                targets.len()
            )));
        }

        Ok(Self {
            inputs,
            targets,
            len,
            input_dim,
            target_dim,
        })
    }

    /// Build a dataset from per-sample rows.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(Error::InvalidData(format!(
                "inputs/targets length mismatch: {} vs {}",
                inputs.len(),
                targets.len()
            )));
        }
        Self::collect(inputs.iter().map(Vec::as_slice).zip(targets.iter().map(Vec::as_slice)))
    }

    /// Build a dataset from examples, preserving their order.
    pub fn from_examples(examples: &[Example]) -> Result<Self> {
        Self::collect(
            examples
                .iter()
                .map(|e| (e.input.as_slice(), e.target.as_slice())),
        )
    }

    fn collect<'a>(rows: impl ExactSizeIterator<Item = (&'a [f64], &'a [f64])>) -> Result<Self> {
        let len = rows.len();
        let mut inputs = Vec::new();
        let mut targets = Vec::new();
        let mut dims = None;

        for (i, (x, y)) in rows.enumerate() {
            let (input_dim, target_dim) = *dims.get_or_insert((x.len(), y.len()));
            if x.len() != input_dim {
                return Err(Error::InvalidData(format!(
                    "input row {i} has len {}, expected {input_dim}",
                    x.len()
                )));
            }
            if y.len() != target_dim {
                return Err(Error::InvalidData(format!(
                    "target row {i} has len {}, expected {target_dim}",
                    y.len()
                )));
            }
            if inputs.is_empty() {
                inputs.reserve_exact(len * input_dim);
                targets.reserve_exact(len * target_dim);
            }
            inputs.extend_from_slice(x);
            targets.extend_from_slice(y);
        }

        let Some((input_dim, target_dim)) = dims else {
            return Err(Error::InvalidData("dataset must not be empty".to_owned()));
        };
        Self::from_flat(inputs, targets, input_dim, target_dim)
    }

    #[inline]
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    /// Returns the per-sample input dimension.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    /// Returns the per-sample target dimension.
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    #[inline]
    /// Returns the `idx`-th input row (shape: `(input_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn input(&self, idx: usize) -> &[f64] {
        let start = idx * self.input_dim;
        &self.inputs[start..start + self.input_dim]
    }

    #[inline]
    /// Returns the `idx`-th target row (shape: `(target_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn target(&self, idx: usize) -> &[f64] {
        let start = idx * self.target_dim;
        &self.targets[start..start + self.target_dim]
    }

    /// Iterate over `(input, target)` pairs in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&[f64], &[f64])> + '_ {
        (0..self.len).map(move |idx| (self.input(idx), self.target(idx)))
    }
}
