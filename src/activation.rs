//! Activation function.
//!
//! Every neuron outside the input layer computes a pre-activation value
//! `net = Σ w x + b` and applies the logistic sigmoid: `y = 1 / (1 + e^-net)`.
//!
//! The forward pass caches the *post-activation* outputs `y` in `Scratch`. During
//! backprop the derivative is recovered from `y` alone (`y * (1 - y)`), so no
//! separate `net` buffer is kept.

/// Logistic sigmoid, evaluated in a form that never overflows `exp`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Derivative of the sigmoid with respect to its input, expressed in terms of
/// the cached output `y = sigmoid(x)`.
#[inline]
pub fn sigmoid_grad_from_output(y: f64) -> f64 {
    y * (1.0 - y)
}
