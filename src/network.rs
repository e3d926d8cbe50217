use crate::activation::sigmoid_grad_from_output;
use crate::error::check_len;
use crate::{Error, Result, loss};
use crate::{FullyConnectedLayer, LayerRef, NetworkBuilder, NetworkConfig, OutputLayer};

/// A feedforward sigmoid network: `[input, hidden.., output]`.
///
/// Topology is fixed at construction. Training mutates weights (and biases, when
/// enabled) in place; all per-call scratch lives in caller-owned [`Scratch`] /
/// [`Deltas`] buffers.
#[derive(Debug, Clone)]
pub struct Network {
    /// Input layer followed by every hidden layer.
    layers: Vec<FullyConnectedLayer>,
    output: OutputLayer,
    learning_rate: f64,
    learn_bias: bool,
    iterations: usize,
    total_error: Option<f64>,
}

/// Reusable buffers for `Network::forward`.
///
/// Holds one activation vector per layer; entry 0 is a copy of the input. The
/// output of the most recent forward pass lives inside `Scratch`.
#[derive(Debug, Clone)]
pub struct Scratch {
    activations: Vec<Vec<f64>>,
}

/// Per-neuron error terms (dE/d(net)) for every layer (overwrite semantics).
///
/// Allocate once via `Network::deltas()` and reuse across training steps.
#[derive(Debug, Clone)]
pub struct Deltas {
    deltas: Vec<Vec<f64>>,
}

/// Reusable buffers for training a specific `Network`.
#[derive(Debug, Clone)]
pub struct Trainer {
    pub scratch: Scratch,
    pub deltas: Deltas,
}

impl Network {
    /// Build a network from a configuration.
    ///
    /// Weights are drawn from `config.init` using `config.seed` (or OS entropy).
    pub fn new(input_size: usize, output_size: usize, config: NetworkConfig) -> Result<Self> {
        NetworkBuilder::with_config(input_size, output_size, config).build()
    }

    /// Assemble a network from explicit layers.
    ///
    /// `layers` holds the input layer followed by at least one hidden layer; each
    /// layer's `next_size` must equal the following layer's `size`, and the last
    /// layer's `next_size` becomes the output size.
    pub fn from_parts(layers: Vec<FullyConnectedLayer>, learning_rate: f64) -> Result<Self> {
        if layers.len() < 2 {
            return Err(Error::Configuration(format!(
                "network needs an input layer and at least one hidden layer, got {} layers",
                layers.len()
            )));
        }
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::Configuration(format!(
                "learning_rate must be finite and > 0, got {learning_rate}"
            )));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].next_size() != pair[1].size() {
                return Err(Error::InvalidData(format!(
                    "layer {i} next_size {} does not match layer {} size {}",
                    pair[0].next_size(),
                    i + 1,
                    pair[1].size()
                )));
            }
        }

        let output_size = layers[layers.len() - 1].next_size();
        Ok(Self::from_layers(
            layers,
            OutputLayer::new(output_size),
            learning_rate,
            true,
            crate::config::DEFAULT_ITERATIONS,
        ))
    }

    pub(crate) fn from_layers(
        layers: Vec<FullyConnectedLayer>,
        output: OutputLayer,
        learning_rate: f64,
        learn_bias: bool,
        iterations: usize,
    ) -> Self {
        debug_assert!(layers.len() >= 2);
        Self {
            layers,
            output,
            learning_rate,
            learn_bias,
            iterations,
            total_error: None,
        }
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.layers[0].size()
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.output.size()
    }

    #[inline]
    pub fn hidden_layer_count(&self) -> usize {
        self.layers.len() - 1
    }

    /// Total number of layers, including input and output.
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len() + 1
    }

    /// Layer sizes `[input, hidden.., output]`.
    pub fn sizes(&self) -> Vec<usize> {
        self.layers().map(|l| l.size()).collect()
    }

    /// All layers in network order.
    pub fn layers(&self) -> impl Iterator<Item = LayerRef<'_>> + '_ {
        self.layers
            .iter()
            .map(LayerRef::FullyConnected)
            .chain(std::iter::once(LayerRef::Output(&self.output)))
    }

    /// The input layer and hidden layers (every layer that owns weights).
    #[inline]
    pub fn connected_layers(&self) -> &[FullyConnectedLayer] {
        &self.layers
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    #[inline]
    pub fn learn_bias(&self) -> bool {
        self.learn_bias
    }

    /// Iterations used by `learn`.
    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Halved squared error of the most recent training step.
    #[inline]
    pub fn total_error(&self) -> Option<f64> {
        self.total_error
    }

    pub fn scratch(&self) -> Scratch {
        Scratch::new(self)
    }

    pub fn deltas(&self) -> Deltas {
        Deltas::new(self)
    }

    /// Convenience constructor: allocate all training buffers.
    #[inline]
    pub fn trainer(&self) -> Trainer {
        Trainer::new(self)
    }

    /// Forward pass for a single sample.
    ///
    /// Writes every layer's activations into `scratch` and returns the output slice.
    ///
    /// Shape contract (panics on violation):
    /// - `input.len() == self.input_size()`
    /// - `scratch` must be built for this `Network`
    pub fn forward<'a>(&self, input: &[f64], scratch: &'a mut Scratch) -> &'a [f64] {
        assert_eq!(
            input.len(),
            self.input_size(),
            "input len {} does not match network input_size {}",
            input.len(),
            self.input_size()
        );
        assert_eq!(
            scratch.activations.len(),
            self.num_layers(),
            "scratch has {} activation buffers, network has {} layers",
            scratch.activations.len(),
            self.num_layers()
        );

        scratch.activations[0].copy_from_slice(input);
        for (idx, layer) in self.layers.iter().enumerate() {
            // Borrow this layer's activations immutably and the next layer's mutably.
            let (left, right) = scratch.activations.split_at_mut(idx + 1);
            let next = &mut right[0];
            assert_eq!(
                next.len(),
                layer.next_size(),
                "scratch layer {} len {} does not match layer size {}",
                idx + 1,
                next.len(),
                layer.next_size()
            );
            layer.propagate(&left[idx], next);
        }

        scratch.output()
    }

    /// Run inference on one input.
    ///
    /// Allocates its own scratch, so it only needs `&self` and can run from several
    /// threads at once. Returns an owned copy of the output activations.
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        check_len("input", self.input_size(), input.len())?;
        let mut scratch = self.scratch();
        Ok(self.forward(input, &mut scratch).to_vec())
    }

    /// Shape-checked, non-allocating inference.
    pub fn predict_into(&self, input: &[f64], scratch: &mut Scratch, out: &mut [f64]) -> Result<()> {
        check_len("input", self.input_size(), input.len())?;
        check_len("output buffer", self.output_size(), out.len())?;
        check_len("scratch", self.num_layers(), scratch.activations.len())?;

        out.copy_from_slice(self.forward(input, scratch));
        Ok(())
    }

    /// Backward pass for a single sample.
    ///
    /// You must call `forward` first with the same `scratch`. Overwrites `deltas`
    /// for every layer, output to input, reading only the current weights:
    ///
    /// - output: `(o - t) * o * (1 - o)`
    /// - hidden: `(Σ_j delta_next[j] * w[i][j]) * a * (1 - a)`
    /// - input: `Σ_j delta_next[j] * w[i][j]` (dE/d(input); no activation)
    ///
    /// Returns the halved squared error of the output against `target`.
    pub fn backward(&self, target: &[f64], scratch: &Scratch, deltas: &mut Deltas) -> f64 {
        assert_eq!(
            target.len(),
            self.output_size(),
            "target len {} does not match network output_size {}",
            target.len(),
            self.output_size()
        );
        assert_eq!(
            scratch.activations.len(),
            self.num_layers(),
            "scratch has {} activation buffers, network has {} layers",
            scratch.activations.len(),
            self.num_layers()
        );
        assert_eq!(
            deltas.deltas.len(),
            self.num_layers(),
            "deltas has {} buffers, network has {} layers",
            deltas.deltas.len(),
            self.num_layers()
        );

        let last = self.layers.len();
        let error = loss::output_deltas(&scratch.activations[last], target, &mut deltas.deltas[last]);

        for idx in (0..self.layers.len()).rev() {
            let (left, right) = deltas.deltas.split_at_mut(idx + 1);
            let this = &mut left[idx];
            self.layers[idx].back_errors(&right[0], this);

            if idx > 0 {
                for (d, &a) in this.iter_mut().zip(&scratch.activations[idx]) {
                    *d *= sigmoid_grad_from_output(a);
                }
            }
        }

        error
    }

    /// Applies one gradient-descent update from a completed backward pass.
    ///
    /// Every layer reads the same snapshot of activations and deltas.
    pub fn apply_deltas(&mut self, scratch: &Scratch, deltas: &Deltas) {
        assert_eq!(
            scratch.activations.len(),
            self.num_layers(),
            "scratch has {} activation buffers, network has {} layers",
            scratch.activations.len(),
            self.num_layers()
        );
        assert_eq!(
            deltas.deltas.len(),
            self.num_layers(),
            "deltas has {} buffers, network has {} layers",
            deltas.deltas.len(),
            self.num_layers()
        );

        let (lr, learn_bias) = (self.learning_rate, self.learn_bias);
        for (idx, layer) in self.layers.iter_mut().enumerate() {
            layer.descend(
                &scratch.activations[idx],
                &deltas.deltas[idx + 1],
                lr,
                learn_bias,
            );
        }
    }

    /// One supervised step: forward, error, backward, update.
    ///
    /// Both lengths are validated before anything is mutated. On success
    /// `total_error()` holds this step's error (measured before the update).
    pub fn learn_single(&mut self, input: &[f64], target: &[f64]) -> Result<()> {
        let mut trainer = self.trainer();
        self.learn_single_with(&mut trainer, input, target)
    }

    /// Same as `learn_single`, reusing the buffers in `trainer`.
    ///
    /// Panics if `trainer` was built for a different topology.
    pub fn learn_single_with(
        &mut self,
        trainer: &mut Trainer,
        input: &[f64],
        target: &[f64],
    ) -> Result<()> {
        check_len("input", self.input_size(), input.len())?;
        check_len("target", self.output_size(), target.len())?;
        self.step(trainer, input, target);
        Ok(())
    }

    /// Unchecked training step. Returns the error measured before the update.
    pub(crate) fn step(&mut self, trainer: &mut Trainer, input: &[f64], target: &[f64]) -> f64 {
        self.forward(input, &mut trainer.scratch);
        let error = self.backward(target, &trainer.scratch, &mut trainer.deltas);
        self.apply_deltas(&trainer.scratch, &trainer.deltas);
        self.total_error = Some(error);
        error
    }
}

impl Trainer {
    pub fn new(network: &Network) -> Self {
        Self {
            scratch: Scratch::new(network),
            deltas: Deltas::new(network),
        }
    }
}

impl Scratch {
    pub fn new(network: &Network) -> Self {
        let activations = network.layers().map(|l| vec![0.0; l.size()]).collect();
        Self { activations }
    }

    /// Activations of layer `layer_idx` from the last forward pass.
    #[inline]
    pub fn activations(&self, layer_idx: usize) -> &[f64] {
        &self.activations[layer_idx]
    }

    #[inline]
    pub fn output(&self) -> &[f64] {
        self.activations
            .last()
            .expect("scratch must have an output buffer")
            .as_slice()
    }
}

impl Deltas {
    pub fn new(network: &Network) -> Self {
        let deltas = network.layers().map(|l| vec![0.0; l.size()]).collect();
        Self { deltas }
    }

    /// Deltas of layer `layer_idx` from the last backward pass.
    #[inline]
    pub fn layer(&self, layer_idx: usize) -> &[f64] {
        &self.deltas[layer_idx]
    }

    /// dE/d(input) from the last backward pass.
    #[inline]
    pub fn input(&self) -> &[f64] {
        &self.deltas[0]
    }

    #[inline]
    pub fn output(&self) -> &[f64] {
        self.deltas
            .last()
            .expect("deltas must have an output buffer")
            .as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::sigmoid;

    /// 2 -> 1 -> 1 with hand-picked weights. For input [1, 1] the hidden net is 0
    /// and the output net is exactly 1.
    fn tiny() -> Network {
        let input = FullyConnectedLayer::from_parts(2, 1, vec![0.5, -0.5], vec![0.0]).unwrap();
        let hidden = FullyConnectedLayer::from_parts(1, 1, vec![2.0], vec![0.0]).unwrap();
        Network::from_parts(vec![input, hidden], 0.5).unwrap()
    }

    fn error_for(net: &Network, input: &[f64], target: &[f64], scratch: &mut Scratch) -> f64 {
        net.forward(input, scratch);
        loss::half_sse(scratch.output(), target)
    }

    fn assert_close(analytic: f64, numeric: f64, abs_tol: f64, rel_tol: f64) {
        let diff = (analytic - numeric).abs();
        let scale = analytic.abs().max(numeric.abs()).max(1.0);
        assert!(
            diff <= abs_tol || diff / scale <= rel_tol,
            "analytic={analytic} numeric={numeric} diff={diff}"
        );
    }

    #[test]
    fn forward_matches_hand_computation() {
        let net = tiny();
        let out = net.predict(&[1.0, 1.0]).unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0] - sigmoid(1.0)).abs() < 1e-15);

        let mut scratch = net.scratch();
        net.forward(&[1.0, 1.0], &mut scratch);
        assert_eq!(scratch.activations(0), &[1.0, 1.0]);
        assert_eq!(scratch.activations(1), &[0.5]);
    }

    #[test]
    fn learn_single_matches_hand_computation() {
        let mut net = tiny();
        net.learn_single(&[1.0, 1.0], &[1.0]).unwrap();

        let o = sigmoid(1.0);
        let delta_out = (o - 1.0) * o * (1.0 - o);
        // Hidden delta uses the pre-update outgoing weight (2.0).
        let delta_hidden = delta_out * 2.0 * 0.25;

        assert!((net.total_error().unwrap() - 0.5 * (1.0 - o) * (1.0 - o)).abs() < 1e-15);

        let layers = net.connected_layers();
        assert!((layers[1].weights()[0] - (2.0 - 0.5 * delta_out * 0.5)).abs() < 1e-12);
        assert!((layers[1].biases()[0] - (-0.5 * delta_out)).abs() < 1e-12);
        assert!((layers[0].weights()[0] - (0.5 - 0.5 * delta_hidden)).abs() < 1e-12);
        assert!((layers[0].weights()[1] - (-0.5 - 0.5 * delta_hidden)).abs() < 1e-12);
    }

    #[test]
    fn learn_bias_false_keeps_biases() {
        let mut net = tiny();
        net.learn_bias = false;
        for _ in 0..10 {
            net.learn_single(&[1.0, 0.0], &[0.0]).unwrap();
        }
        for layer in net.connected_layers() {
            assert!(layer.biases().iter().all(|&b| b == 0.0));
        }
    }

    #[test]
    fn seeded_init_is_deterministic() {
        let cfg = NetworkConfig {
            seed: Some(123),
            ..Default::default()
        };
        let a = Network::new(2, 1, cfg.clone()).unwrap();
        let b = Network::new(2, 1, cfg).unwrap();

        for (la, lb) in a.connected_layers().iter().zip(b.connected_layers()) {
            assert_eq!(la.weights(), lb.weights());
        }
        let input = [0.3, -0.7];
        assert_eq!(a.predict(&input).unwrap(), b.predict(&input).unwrap());
    }

    #[test]
    fn backward_matches_numeric_gradients() {
        let cfg = NetworkConfig {
            hidden_layer_sizes: Some(crate::HiddenLayerSizes::PerLayer(vec![3, 2])),
            bias: Some(vec![0.1, -0.2, 0.3]),
            seed: Some(0),
            ..Default::default()
        };
        let mut net = Network::new(2, 2, cfg).unwrap();
        let mut scratch = net.scratch();
        let mut deltas = net.deltas();

        let input = [0.3, -0.7];
        let target = [0.2, 0.9];

        net.forward(&input, &mut scratch);
        let error = net.backward(&target, &scratch, &mut deltas);

        let mut expected_out = [0.0; 2];
        let expected_error = loss::output_deltas(scratch.output(), &target, &mut expected_out);
        assert_eq!(deltas.output(), &expected_out);
        assert_eq!(error, expected_error);

        let eps = 1e-6;
        let abs_tol = 1e-7;
        let rel_tol = 1e-5;
        let mut scratch_tmp = net.scratch();

        for layer_idx in 0..net.layers.len() {
            let (size, next_size) = {
                let l = &net.layers[layer_idx];
                (l.size(), l.next_size())
            };

            // Weights: dE/dw[i][j] = delta_next[j] * a[i].
            for i in 0..size {
                for j in 0..next_size {
                    let p = i * next_size + j;
                    let orig = net.layers[layer_idx].weights_mut()[p];

                    net.layers[layer_idx].weights_mut()[p] = orig + eps;
                    let plus = error_for(&net, &input, &target, &mut scratch_tmp);
                    net.layers[layer_idx].weights_mut()[p] = orig - eps;
                    let minus = error_for(&net, &input, &target, &mut scratch_tmp);
                    net.layers[layer_idx].weights_mut()[p] = orig;

                    let numeric = (plus - minus) / (2.0 * eps);
                    let analytic = deltas.layer(layer_idx + 1)[j] * scratch.activations(layer_idx)[i];
                    assert_close(analytic, numeric, abs_tol, rel_tol);
                }
            }

            // Biases: dE/db[j] = delta_next[j].
            for j in 0..next_size {
                let orig = net.layers[layer_idx].biases_mut()[j];

                net.layers[layer_idx].biases_mut()[j] = orig + eps;
                let plus = error_for(&net, &input, &target, &mut scratch_tmp);
                net.layers[layer_idx].biases_mut()[j] = orig - eps;
                let minus = error_for(&net, &input, &target, &mut scratch_tmp);
                net.layers[layer_idx].biases_mut()[j] = orig;

                let numeric = (plus - minus) / (2.0 * eps);
                assert_close(deltas.layer(layer_idx + 1)[j], numeric, abs_tol, rel_tol);
            }
        }

        // Inputs.
        let mut input_var = input;
        for i in 0..input_var.len() {
            let orig = input_var[i];

            input_var[i] = orig + eps;
            let plus = error_for(&net, &input_var, &target, &mut scratch_tmp);
            input_var[i] = orig - eps;
            let minus = error_for(&net, &input_var, &target, &mut scratch_tmp);
            input_var[i] = orig;

            let numeric = (plus - minus) / (2.0 * eps);
            assert_close(deltas.input()[i], numeric, abs_tol, rel_tol);
        }
    }

    #[test]
    fn failed_learn_single_does_not_mutate() {
        let mut net = tiny();
        let before: Vec<Vec<f64>> = net
            .connected_layers()
            .iter()
            .map(|l| l.weights().to_vec())
            .collect();

        let err = net.learn_single(&[1.0, 1.0], &[1.0, 0.0]).unwrap_err();
        assert_eq!(
            err,
            Error::Dimension {
                what: "target",
                expected: 1,
                actual: 2
            }
        );
        assert!(net.learn_single(&[1.0], &[1.0]).is_err());

        let after: Vec<Vec<f64>> = net
            .connected_layers()
            .iter()
            .map(|l| l.weights().to_vec())
            .collect();
        assert_eq!(before, after);
        assert_eq!(net.total_error(), None);
    }

    #[test]
    fn predict_into_checks_buffers() {
        let net = tiny();
        let mut scratch = net.scratch();
        let mut out = [0.0; 1];
        net.predict_into(&[1.0, 1.0], &mut scratch, &mut out).unwrap();
        assert!((out[0] - sigmoid(1.0)).abs() < 1e-15);

        let mut wide = [0.0; 2];
        assert!(matches!(
            net.predict_into(&[1.0, 1.0], &mut scratch, &mut wide),
            Err(Error::Dimension { what: "output buffer", .. })
        ));
    }

    #[test]
    fn from_parts_rejects_broken_chains() {
        let a = FullyConnectedLayer::from_parts(2, 3, vec![0.0; 6], vec![0.0; 3]).unwrap();
        let b = FullyConnectedLayer::from_parts(2, 1, vec![0.0; 2], vec![0.0]).unwrap();
        assert!(matches!(
            Network::from_parts(vec![a.clone(), b], 0.5),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            Network::from_parts(vec![a], 0.5),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    #[should_panic]
    fn forward_panics_on_input_shape_mismatch() {
        let net = tiny();
        let mut scratch = net.scratch();
        net.forward(&[0.0; 3], &mut scratch);
    }

    #[test]
    #[should_panic]
    fn forward_panics_on_scratch_mismatch() {
        let a = tiny();
        let b = Network::new(2, 1, NetworkConfig::default()).unwrap();
        let mut scratch_b = b.scratch();
        a.forward(&[0.0; 2], &mut scratch_b);
    }
}
