//! Human-readable network dump.
//!
//! A debug aid: the dump shows topology, weights, biases and the learning rate.
//! It is a snapshot type, not the internal representation, and there is no
//! loader for it.
//!
//! Weights are written as nested rows: `weights[i][j]` connects neuron `i` of the
//! layer to neuron `j` of the next layer.

use serde::Serialize;

use crate::{Error, LayerRef, Network, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkDump {
    /// `[input, hidden.., output]`.
    pub sizes: Vec<usize>,
    pub learning_rate: f64,
    pub learn_bias: bool,
    pub total_error: Option<f64>,
    pub layers: Vec<LayerDump>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerDump {
    FullyConnected {
        size: usize,
        next_size: usize,
        bias: Vec<f64>,
        weights: Vec<Vec<f64>>,
    },
    Output {
        size: usize,
    },
}

impl From<LayerRef<'_>> for LayerDump {
    fn from(layer: LayerRef<'_>) -> Self {
        match layer {
            LayerRef::FullyConnected(l) => LayerDump::FullyConnected {
                size: l.size(),
                next_size: l.next_size(),
                bias: l.biases().to_vec(),
                weights: (0..l.size()).map(|i| l.weights_from(i).to_vec()).collect(),
            },
            LayerRef::Output(l) => LayerDump::Output { size: l.size() },
        }
    }
}

impl From<&Network> for NetworkDump {
    fn from(network: &Network) -> Self {
        Self {
            sizes: network.sizes(),
            learning_rate: network.learning_rate(),
            learn_bias: network.learn_bias(),
            total_error: network.total_error(),
            layers: network.layers().map(LayerDump::from).collect(),
        }
    }
}

impl Network {
    pub fn snapshot(&self) -> NetworkDump {
        NetworkDump::from(self)
    }

    /// Pretty-printed JSON dump of the full network state.
    pub fn dump(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| Error::Serialization(format!("failed to dump network: {e}")))
    }

    /// Compact JSON dump of the full network state.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.snapshot())
            .map_err(|e| Error::Serialization(format!("failed to dump network: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FullyConnectedLayer;

    fn tiny() -> Network {
        let input = FullyConnectedLayer::from_parts(2, 1, vec![0.5, -0.5], vec![0.0]).unwrap();
        let hidden = FullyConnectedLayer::from_parts(1, 1, vec![2.0], vec![0.0]).unwrap();
        Network::from_parts(vec![input, hidden], 0.5).unwrap()
    }

    #[test]
    fn golden_dump_is_stable() {
        let json = tiny().dump().unwrap();

        let golden = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/golden/network_dump.json"
        ))
        .trim_end();
        assert_eq!(json, golden);
    }

    #[test]
    fn dump_reflects_training() {
        let mut net = tiny();
        net.learn_single(&[1.0, 1.0], &[1.0]).unwrap();

        let value: serde_json::Value = serde_json::from_str(&net.to_json().unwrap()).unwrap();
        assert_eq!(value["sizes"], serde_json::json!([2, 1, 1]));
        assert!(value["total_error"].as_f64().unwrap() > 0.0);

        let layers = value["layers"].as_array().unwrap();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[2]["kind"], "output");
        let w = layers[1]["weights"][0][0].as_f64().unwrap();
        assert!((w - net.connected_layers()[1].weights()[0]).abs() < 1e-15);
        assert!(w > 2.0);
    }

    #[test]
    fn snapshot_rows_follow_layer_layout() {
        let layer =
            FullyConnectedLayer::from_parts(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![0.0; 3])
                .unwrap();
        let dump = LayerDump::from(LayerRef::FullyConnected(&layer));
        assert_eq!(
            dump,
            LayerDump::FullyConnected {
                size: 2,
                next_size: 3,
                bias: vec![0.0; 3],
                weights: vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
            }
        );
    }
}
