//! A small sigmoid MLP (multi-layer perceptron) trained with backpropagation.
//!
//! `backprop-mlp` is a from-scratch implementation of a fully connected
//! feed-forward network with logistic activations and plain online gradient
//! descent. It is meant to be easy to read.
//!
//! # Design goals
//!
//! - One algorithm: sigmoid everywhere, halved squared error, one example per
//!   update, fixed iteration count.
//! - Clear contracts: shapes are explicit and validated at the API boundary.
//! - No hidden scratch state: activations and deltas live in caller-owned
//!   buffers (`Scratch` / `Deltas`), so a trained `Network` can be shared across
//!   threads for inference.
//!
//! # Panics vs `Result`
//!
//! - Low-level hot path (panics on misuse):
//!   [`Network::forward`], [`Network::backward`], [`Network::apply_deltas`].
//!   Shape mismatches are programmer error and panic via `assert!`.
//! - High-level API (shape-checked, returns [`Result`]):
//!   [`Network::new`], [`Network::predict`], [`Network::learn_single`],
//!   [`Network::learn`], [`Network::dump`]. A failed call leaves the weights
//!   untouched.
//!
//! # Data layout
//!
//! - Scalars are `f64`.
//! - Layer weights are row-major with shape `(size, next_size)`.
//! - [`Dataset`] stores samples contiguously in row-major layout.
//!
//! # Quick start
//!
//! ```rust
//! use backprop_mlp::{Dataset, Example, Network, NetworkConfig};
//!
//! # fn main() -> backprop_mlp::Result<()> {
//! let train = Dataset::from_examples(&[
//!     Example::new([0.0, 0.0], [0.0]),
//!     Example::new([0.0, 1.0], [1.0]),
//!     Example::new([1.0, 0.0], [1.0]),
//!     Example::new([1.0, 1.0], [0.0]),
//! ])?;
//!
//! let mut net = Network::new(2, 1, NetworkConfig {
//!     iterations: 100,
//!     seed: Some(0),
//!     ..Default::default()
//! })?;
//! let report = net.learn(&train)?;
//! assert_eq!(report.epochs, 100);
//!
//! let y = net.predict(&[0.0, 1.0])?;
//! assert!(y[0] > 0.0 && y[0] < 1.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Reusing buffers
//!
//! A custom loop can allocate buffers once and drive the passes directly:
//!
//! ```rust
//! use backprop_mlp::NetworkBuilder;
//!
//! # fn main() -> backprop_mlp::Result<()> {
//! let mut net = NetworkBuilder::new(3, 2).build_with_seed(0)?;
//! let mut trainer = net.trainer();
//! let x = [0.1, -0.2, 0.3];
//! let t = [0.0, 1.0];
//!
//! net.forward(&x, &mut trainer.scratch);
//! let _error = net.backward(&t, &trainer.scratch, &mut trainer.deltas);
//! net.apply_deltas(&trainer.scratch, &trainer.deltas);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod config;
pub mod data;
pub mod dump;
pub mod error;
pub mod layer;
pub mod loss;
pub mod network;
pub mod train;

pub use builder::NetworkBuilder;
pub use config::{HiddenLayerSizes, NetworkConfig};
pub use data::{Dataset, Example};
pub use dump::{LayerDump, NetworkDump};
pub use error::{Error, Result};
pub use layer::{FullyConnectedLayer, Init, LayerRef, OutputLayer};
pub use network::{Deltas, Network, Scratch, Trainer};
pub use train::{EpochReport, StopReason, TrainConfig, TrainReport};
