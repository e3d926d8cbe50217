use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::activation::sigmoid;
use crate::{Error, Result};

/// Weight initialization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Init {
    /// Independent draws from N(0, 1).
    #[default]
    StandardNormal,
    /// Independent draws from the half-open interval `[low, high)`.
    Uniform { low: f64, high: f64 },
}

impl Init {
    /// Validate initializer parameters.
    pub fn validate(self) -> Result<()> {
        match self {
            Init::StandardNormal => Ok(()),
            Init::Uniform { low, high } => {
                if !(low.is_finite() && high.is_finite() && low < high) {
                    return Err(Error::Configuration(format!(
                        "uniform init requires finite low < high, got [{low}, {high})"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Fill `weights` in order with independent draws.
    pub(crate) fn fill<R: Rng + ?Sized>(self, weights: &mut [f64], rng: &mut R) {
        match self {
            Init::StandardNormal => {
                for w in weights.iter_mut() {
                    *w = StandardNormal.sample(rng);
                }
            }
            Init::Uniform { low, high } => {
                let dist = Uniform::new(low, high);
                for w in weights.iter_mut() {
                    *w = dist.sample(rng);
                }
            }
        }
    }
}

/// A layer with outgoing edges: the input layer and every hidden layer.
#[derive(Debug, Clone)]
pub struct FullyConnectedLayer {
    size: usize,
    next_size: usize,
    /// Row-major matrix with shape (size, next_size): `weights[i * next_size + j]`
    /// connects neuron `i` of this layer to neuron `j` of the next.
    weights: Vec<f64>,
    /// Offset added to each downstream neuron's weighted sum.
    biases: Vec<f64>,
}

/// The last layer. It only has activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLayer {
    size: usize,
}

/// Borrowed view over any layer of a `Network`, in network order.
#[derive(Debug, Clone, Copy)]
pub enum LayerRef<'a> {
    FullyConnected(&'a FullyConnectedLayer),
    Output(&'a OutputLayer),
}

impl LayerRef<'_> {
    #[inline]
    pub fn size(&self) -> usize {
        match self {
            LayerRef::FullyConnected(l) => l.size(),
            LayerRef::Output(l) => l.size(),
        }
    }
}

impl FullyConnectedLayer {
    /// Allocate a layer and draw its weights from `init`.
    ///
    /// Every bias entry starts at `bias`.
    pub fn new_with_rng<R: Rng + ?Sized>(
        size: usize,
        next_size: usize,
        bias: f64,
        init: Init,
        rng: &mut R,
    ) -> Result<Self> {
        if size == 0 || next_size == 0 {
            return Err(Error::Configuration(format!(
                "layer sizes must be > 0, got size={size} next_size={next_size}"
            )));
        }
        let len = size.checked_mul(next_size).ok_or_else(|| {
            Error::Configuration(format!(
                "layer weight shape overflows: size={size} next_size={next_size}"
            ))
        })?;
        init.validate()?;

        let mut weights = vec![0.0; len];
        init.fill(&mut weights, rng);
        Ok(Self {
            size,
            next_size,
            weights,
            biases: vec![bias; next_size],
        })
    }

    /// Build a layer from explicit parameters.
    ///
    /// `weights` is row-major `(size, next_size)`; `biases` has `next_size` entries.
    pub fn from_parts(
        size: usize,
        next_size: usize,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Result<Self> {
        if size == 0 || next_size == 0 {
            return Err(Error::InvalidData(format!(
                "layer sizes must be > 0, got size={size} next_size={next_size}"
            )));
        }
        let expected = size
            .checked_mul(next_size)
            .ok_or_else(|| Error::InvalidData("layer weight shape overflow".to_owned()))?;
        if weights.len() != expected {
            return Err(Error::InvalidData(format!(
                "weights length {} does not match size * next_size ({size} * {next_size})",
                weights.len()
            )));
        }
        if biases.len() != next_size {
            return Err(Error::InvalidData(format!(
                "biases length {} does not match next_size {next_size}",
                biases.len()
            )));
        }
        if weights.iter().chain(&biases).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "layer parameters must be finite".to_owned(),
            ));
        }

        Ok(Self {
            size,
            next_size,
            weights,
            biases,
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn next_size(&self) -> usize {
        self.next_size
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Outgoing weights of neuron `i` (one entry per downstream neuron).
    #[inline]
    pub fn weights_from(&self, i: usize) -> &[f64] {
        let row = i * self.next_size;
        &self.weights[row..row + self.next_size]
    }

    #[inline]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    #[cfg(test)]
    pub(crate) fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    #[cfg(test)]
    pub(crate) fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    /// Computes the next layer's activations from this layer's.
    ///
    /// `next[j] = sigmoid(biases[j] + Σ_i activations[i] * weights[i][j])`
    ///
    /// Shape contract:
    /// - `activations.len() == self.size`
    /// - `next.len() == self.next_size`
    #[inline]
    pub fn propagate(&self, activations: &[f64], next: &mut [f64]) {
        debug_assert_eq!(activations.len(), self.size);
        debug_assert_eq!(next.len(), self.next_size);

        for j in 0..self.next_size {
            let mut net = self.biases[j];
            for i in 0..self.size {
                net += activations[i] * self.weights[i * self.next_size + j];
            }
            next[j] = sigmoid(net);
        }
    }

    /// Backpropagates the next layer's deltas onto this layer.
    ///
    /// Overwrites `errors[i] = Σ_j next_deltas[j] * weights[i][j]`, i.e. dE/d(activation_i).
    /// The caller turns these into deltas by applying the activation derivative.
    ///
    /// Shape contract:
    /// - `next_deltas.len() == self.next_size`
    /// - `errors.len() == self.size`
    #[inline]
    pub fn back_errors(&self, next_deltas: &[f64], errors: &mut [f64]) {
        debug_assert_eq!(next_deltas.len(), self.next_size);
        debug_assert_eq!(errors.len(), self.size);

        for i in 0..self.size {
            let row = i * self.next_size;
            let mut acc = 0.0_f64;
            for j in 0..self.next_size {
                acc += next_deltas[j] * self.weights[row + j];
            }
            errors[i] = acc;
        }
    }

    /// Gradient-descent update for this layer's outgoing edges.
    ///
    /// `weights[i][j] -= lr * next_deltas[j] * activations[i]`, and when
    /// `learn_bias` is set, `biases[j] -= lr * next_deltas[j]`.
    #[inline]
    pub(crate) fn descend(
        &mut self,
        activations: &[f64],
        next_deltas: &[f64],
        lr: f64,
        learn_bias: bool,
    ) {
        debug_assert_eq!(activations.len(), self.size);
        debug_assert_eq!(next_deltas.len(), self.next_size);

        for i in 0..self.size {
            let row = i * self.next_size;
            let a = activations[i];
            for j in 0..self.next_size {
                self.weights[row + j] -= lr * next_deltas[j] * a;
            }
        }
        if learn_bias {
            for j in 0..self.next_size {
                self.biases[j] -= lr * next_deltas[j];
            }
        }
    }
}

impl OutputLayer {
    #[inline]
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }
}
