//! Loss function.
//!
//! Training minimizes the halved sum of squared errors over the output layer:
//!
//! `E = 0.5 * Σ_k (target[k] - output[k])^2`
//!
//! The halving cancels the exponent's factor of two in `dE/d(output)`. Because
//! the output layer is sigmoid, the error signal handed to backprop is already
//! taken through the activation: `dE/d(net_k)`.

use crate::activation::sigmoid_grad_from_output;

/// Halved sum of squared errors.
///
/// Shape contract: `output.len() == target.len()`.
#[inline]
pub fn half_sse(output: &[f64], target: &[f64]) -> f64 {
    assert_eq!(
        output.len(),
        target.len(),
        "output len {} does not match target len {}",
        output.len(),
        target.len()
    );

    let mut sum_sq = 0.0_f64;
    for (&o, &t) in output.iter().zip(target) {
        let diff = t - o;
        sum_sq += diff * diff;
    }
    0.5 * sum_sq
}

/// Halved SSE plus the output-layer deltas.
///
/// Writes `deltas[k] = (output[k] - target[k]) * output[k] * (1 - output[k])`
/// and returns the error.
///
/// Shape contract:
/// - `output.len() == target.len()`
/// - `output.len() == deltas.len()`
#[inline]
pub fn output_deltas(output: &[f64], target: &[f64], deltas: &mut [f64]) -> f64 {
    assert_eq!(
        output.len(),
        deltas.len(),
        "output len {} does not match deltas len {}",
        output.len(),
        deltas.len()
    );

    let error = half_sse(output, target);
    for k in 0..output.len() {
        let o = output[k];
        deltas[k] = (o - target[k]) * sigmoid_grad_from_output(o);
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_sse_basic() {
        assert_eq!(half_sse(&[0.5, 0.5], &[0.5, 0.5]), 0.0);
        // 0.5 * (0.25 + 0.25)
        assert!((half_sse(&[0.5, 0.5], &[1.0, 0.0]) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn output_deltas_use_sigmoid_derivative() {
        let out = [0.8, 0.3];
        let target = [1.0, 0.0];
        let mut d = [0.0; 2];
        let err = output_deltas(&out, &target, &mut d);

        assert!((err - 0.5 * (0.04 + 0.09)).abs() < 1e-12);
        assert!((d[0] - (-0.2 * 0.8 * 0.2)).abs() < 1e-12);
        assert!((d[1] - (0.3 * 0.3 * 0.7)).abs() < 1e-12);
    }

    #[test]
    #[should_panic]
    fn mismatched_lengths_panic() {
        half_sse(&[0.0, 1.0], &[0.0]);
    }
}
