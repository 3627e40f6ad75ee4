/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Predictions are clipped to [EPS, 1 - EPS] inside the logarithm.
const EPS: f32 = 1e-7;

impl CrossEntropyLoss {
    /// Computes the scalar cross-entropy loss:
    ///   L = -sum(expected[i] * log(predicted[i]))
    ///
    /// `predicted`: softmax probabilities, shape [n_classes]
    /// `expected` : one-hot (or soft) target distribution, shape [n_classes]
    pub fn loss(predicted: &[f32], expected: &[f32]) -> f32 {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| -e * p.clamp(EPS, 1.0 - EPS).ln())
            .sum()
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the pre-softmax
    /// logits:
    ///   ∂L/∂z_i = predicted[i] - expected[i]
    ///
    /// There is no 1/n factor. The Softmax layer's own derivative step is a
    /// pass-through so the Jacobian is not applied twice.
    pub fn derivative(predicted: &[f32], expected: &[f32]) -> Vec<f32> {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| p - e)
            .collect()
    }
}
