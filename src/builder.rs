//! Network builder.
//!
//! `NetworkBuilder` is a fluent front end over [`NetworkConfig`]. Nothing is
//! validated until a `build*` method runs, at which point the whole configuration
//! is resolved at once (see [`NetworkConfig::resolve`]).
//!
//! Weights are drawn layer by layer, row-major within a layer. Construction
//! consumes the RNG for nothing else, so the same seed and configuration always
//! produce the same network.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::{
    FullyConnectedLayer, HiddenLayerSizes, Init, Network, NetworkConfig, OutputLayer, Result,
};

/// Builder for a `Network`.
///
/// Example:
///
/// ```rust
/// use backprop_mlp::NetworkBuilder;
///
/// # fn main() -> backprop_mlp::Result<()> {
/// let net = NetworkBuilder::new(2, 1)
///     .hidden_layers(1)
///     .hidden_layer_size(4)
///     .learning_rate(0.3)
///     .build_with_seed(0)?;
/// assert_eq!(net.sizes(), vec![2, 4, 1]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    input_size: usize,
    output_size: usize,
    config: NetworkConfig,
}

impl NetworkBuilder {
    /// Start building a network with the default configuration.
    pub fn new(input_size: usize, output_size: usize) -> Self {
        Self::with_config(input_size, output_size, NetworkConfig::default())
    }

    /// Start from an existing configuration.
    pub fn with_config(input_size: usize, output_size: usize, config: NetworkConfig) -> Self {
        Self {
            input_size,
            output_size,
            config,
        }
    }

    pub fn hidden_layers(mut self, count: usize) -> Self {
        self.config.hidden_layer_count = count;
        self
    }

    /// Use `size` neurons in every hidden layer.
    pub fn hidden_layer_size(mut self, size: usize) -> Self {
        self.config.hidden_layer_sizes = Some(HiddenLayerSizes::Uniform(size));
        self
    }

    /// Give each hidden layer its own size.
    ///
    /// The list length must match the hidden layer count at build time.
    pub fn hidden_layer_sizes(mut self, sizes: Vec<usize>) -> Self {
        self.config.hidden_layer_sizes = Some(HiddenLayerSizes::PerLayer(sizes));
        self
    }

    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.config.learning_rate = lr;
        self
    }

    /// Initial bias for each layer with outgoing edges (`hidden_layers + 1` values).
    pub fn bias(mut self, bias: Vec<f64>) -> Self {
        self.config.bias = Some(bias);
        self
    }

    pub fn learn_bias(mut self, learn_bias: bool) -> Self {
        self.config.learn_bias = learn_bias;
        self
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.iterations = iterations;
        self
    }

    pub fn init(mut self, init: Init) -> Self {
        self.config.init = init;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Build using the configured seed, or OS entropy when there is none.
    pub fn build(self) -> Result<Network> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.build_with_rng(&mut rng)
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Network> {
        let resolved = self.config.resolve(self.input_size, self.output_size)?;

        let connected = resolved.sizes.len() - 1;
        let mut layers = Vec::with_capacity(connected);
        for (idx, pair) in resolved.sizes.windows(2).enumerate() {
            layers.push(FullyConnectedLayer::new_with_rng(
                pair[0],
                pair[1],
                resolved.biases[idx],
                resolved.init,
                rng,
            )?);
        }

        debug!(
            sizes = ?resolved.sizes,
            learning_rate = resolved.learning_rate,
            init = ?resolved.init,
            "constructed network"
        );

        Ok(Network::from_layers(
            layers,
            OutputLayer::new(self.output_size),
            resolved.learning_rate,
            resolved.learn_bias,
            resolved.iterations,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn builder_sets_every_field() {
        let net = NetworkBuilder::new(3, 2)
            .hidden_layers(2)
            .hidden_layer_sizes(vec![5, 4])
            .learning_rate(0.1)
            .bias(vec![0.5, 0.25, 0.0])
            .learn_bias(false)
            .iterations(10)
            .init(Init::Uniform {
                low: -0.5,
                high: 0.5,
            })
            .build_with_seed(1)
            .unwrap();

        assert_eq!(net.sizes(), vec![3, 5, 4, 2]);
        assert_eq!(net.hidden_layer_count(), 2);
        assert_eq!(net.learning_rate(), 0.1);
        assert!(!net.learn_bias());
        assert_eq!(net.iterations(), 10);

        let layers = net.connected_layers();
        assert_eq!(layers[0].biases(), &[0.5; 5]);
        assert_eq!(layers[1].biases(), &[0.25; 4]);
        assert_eq!(layers[2].biases(), &[0.0; 2]);
        assert!(
            layers
                .iter()
                .flat_map(|l| l.weights())
                .all(|w| (-0.5..0.5).contains(w))
        );
    }

    #[test]
    fn build_uses_configured_seed() {
        let a = NetworkBuilder::new(2, 1).seed(9).build().unwrap();
        let b = NetworkBuilder::new(2, 1).build_with_seed(9).unwrap();
        for (la, lb) in a.connected_layers().iter().zip(b.connected_layers()) {
            assert_eq!(la.weights(), lb.weights());
        }
    }

    #[test]
    fn different_seeds_give_different_weights() {
        let a = NetworkBuilder::new(2, 1).build_with_seed(1).unwrap();
        let b = NetworkBuilder::new(2, 1).build_with_seed(2).unwrap();
        assert_ne!(a.connected_layers()[0].weights(), b.connected_layers()[0].weights());
    }

    #[test]
    fn mismatched_hidden_sizes_fail() {
        let err = NetworkBuilder::new(2, 1)
            .hidden_layers(3)
            .hidden_layer_sizes(vec![2, 2])
            .build_with_seed(0)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
