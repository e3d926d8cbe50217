//! Network configuration.
//!
//! `NetworkConfig` is the single source of construction options. Every field is
//! optional in serialized form (`#[serde(default)]`), so a config can be loaded
//! from a partial JSON object:
//!
//! ```rust
//! use backprop_mlp::{HiddenLayerSizes, NetworkConfig};
//!
//! let cfg: NetworkConfig =
//!     serde_json::from_str(r#"{ "hidden_layer_sizes": [4, 3], "learning_rate": 0.3 }"#).unwrap();
//! assert_eq!(cfg.hidden_layer_count, 2);
//! assert_eq!(cfg.hidden_layer_sizes, Some(HiddenLayerSizes::PerLayer(vec![4, 3])));
//! ```
//!
//! Resolution order (see [`NetworkConfig::resolve`]):
//!
//! 1. `input_size` and `output_size` must be > 0.
//! 2. `hidden_layer_count` must be >= 1.
//! 3. Hidden sizes: an explicit per-layer list must have `hidden_layer_count`
//!    entries; a single size is repeated; an absent value repeats `input_size`.
//! 4. `bias`: one scalar per layer with outgoing edges (`hidden_layer_count + 1`),
//!    zeros when absent.
//! 5. `learning_rate`, `iterations` and `init` are range-checked.

use serde::{Deserialize, Serialize};

use crate::{Error, Init, Result};

pub const DEFAULT_HIDDEN_LAYER_COUNT: usize = 2;
pub const DEFAULT_LEARNING_RATE: f64 = 0.5;
pub const DEFAULT_ITERATIONS: usize = 2_000;

/// Hidden layer widths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HiddenLayerSizes {
    /// The same width for every hidden layer.
    Uniform(usize),
    /// One width per hidden layer.
    PerLayer(Vec<usize>),
}

impl From<usize> for HiddenLayerSizes {
    fn from(value: usize) -> Self {
        HiddenLayerSizes::Uniform(value)
    }
}

impl From<Vec<usize>> for HiddenLayerSizes {
    fn from(value: Vec<usize>) -> Self {
        HiddenLayerSizes::PerLayer(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub hidden_layer_count: usize,
    /// `None` gives every hidden layer `input_size` neurons.
    pub hidden_layer_sizes: Option<HiddenLayerSizes>,
    pub learning_rate: f64,
    /// Initial bias per layer with outgoing edges. `None` means all zero.
    pub bias: Option<Vec<f64>>,
    /// Whether gradient descent also updates the biases.
    ///
    /// Biases act as weights from a constant-1 unit and are trained by default.
    /// `false` keeps them at their initial values and updates weights only.
    pub learn_bias: bool,
    /// Passes over the dataset made by `Network::learn`.
    pub iterations: usize,
    pub init: Init,
    /// Seed for weight initialization. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden_layer_count: DEFAULT_HIDDEN_LAYER_COUNT,
            hidden_layer_sizes: None,
            learning_rate: DEFAULT_LEARNING_RATE,
            bias: None,
            learn_bias: true,
            iterations: DEFAULT_ITERATIONS,
            init: Init::StandardNormal,
            seed: None,
        }
    }
}

/// A validated configuration with every default filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Layer sizes including input and output: `[input, hidden.., output]`.
    pub sizes: Vec<usize>,
    /// One initial bias per layer with outgoing edges (`sizes.len() - 1`).
    pub biases: Vec<f64>,
    pub learning_rate: f64,
    pub learn_bias: bool,
    pub iterations: usize,
    pub init: Init,
}

impl NetworkConfig {
    /// Validate this configuration for a network of the given dimensions and fill
    /// in defaults.
    pub fn resolve(&self, input_size: usize, output_size: usize) -> Result<Resolved> {
        if input_size == 0 {
            return Err(Error::Configuration("input_size must be > 0".to_owned()));
        }
        if output_size == 0 {
            return Err(Error::Configuration("output_size must be > 0".to_owned()));
        }
        if self.hidden_layer_count == 0 {
            return Err(Error::Configuration(
                "hidden_layer_count must be >= 1".to_owned(),
            ));
        }

        let hidden = match &self.hidden_layer_sizes {
            None => vec![input_size; self.hidden_layer_count],
            Some(HiddenLayerSizes::Uniform(size)) => vec![*size; self.hidden_layer_count],
            Some(HiddenLayerSizes::PerLayer(sizes)) => {
                if sizes.len() != self.hidden_layer_count {
                    return Err(Error::Configuration(format!(
                        "hidden_layer_sizes has {} entries, expected hidden_layer_count {}",
                        sizes.len(),
                        self.hidden_layer_count
                    )));
                }
                sizes.clone()
            }
        };
        if let Some(idx) = hidden.iter().position(|&s| s == 0) {
            return Err(Error::Configuration(format!(
                "hidden layer {idx} size must be > 0"
            )));
        }

        let mut sizes = Vec::with_capacity(hidden.len() + 2);
        sizes.push(input_size);
        sizes.extend_from_slice(&hidden);
        sizes.push(output_size);

        let connected = sizes.len() - 1;
        let biases = match &self.bias {
            None => vec![0.0; connected],
            Some(bias) => {
                if bias.len() != connected {
                    return Err(Error::Configuration(format!(
                        "bias has {} entries, expected one per layer with outgoing edges ({connected})",
                        bias.len()
                    )));
                }
                if bias.iter().any(|b| !b.is_finite()) {
                    return Err(Error::Configuration(
                        "bias values must be finite".to_owned(),
                    ));
                }
                bias.clone()
            }
        };

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::Configuration(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        if self.iterations == 0 {
            return Err(Error::Configuration("iterations must be > 0".to_owned()));
        }
        self.init.validate()?;

        Ok(Resolved {
            sizes,
            biases,
            learning_rate: self.learning_rate,
            learn_bias: self.learn_bias,
            iterations: self.iterations,
            init: self.init,
        })
    }
}
