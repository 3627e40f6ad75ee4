use crate::error::{NnError, Result};
use crate::network::network::{Gradient, Network};

/// Anything that turns one sample's gradients into a parameter update.
pub trait Optimizer {
    /// Applies one update from a `backpropagation` result.
    fn step(&mut self, network: &mut Network, gradients: &[Gradient]) -> Result<()>;

    /// Learning rate the next step will use.
    fn current_rate(&self) -> f32;

    /// Steps taken so far.
    fn iterations(&self) -> usize;
}

/// Inverse-time decay: `learning_rate / (1 + decay * t)`.
pub(crate) fn decayed_rate(learning_rate: f32, decay: f32, iterations: usize) -> f32 {
    learning_rate / (1.0 + decay * iterations as f32)
}

/// Checks that `gradients` has one entry per layer, each shaped like the
/// layer's parameters.
pub(crate) fn check_gradients(network: &Network, gradients: &[Gradient]) -> Result<()> {
    if gradients.len() != network.len() {
        return Err(NnError::ShapeMismatch(format!(
            "{} gradients for {} layers", gradients.len(), network.len()
        )));
    }
    for (i, (grad, layer)) in gradients.iter().zip(network.layers()).enumerate() {
        if grad.weights.shape() != layer.weights().shape() || grad.biases.shape() != layer.biases().shape() {
            return Err(NnError::ShapeMismatch(format!(
                "gradient for layer {i} does not match its parameters"
            )));
        }
    }
    Ok(())
}

/// Zero-filled per-parameter state, sized on first use.
pub(crate) fn ensure_state(state: &mut Vec<f32>, len: usize) -> Result<()> {
    if state.is_empty() {
        state.resize(len, 0.0);
    } else if state.len() != len {
        return Err(NnError::ShapeMismatch(format!(
            "optimizer state tracks {} parameters, network has {len}", state.len()
        )));
    }
    Ok(())
}
