pub struct MapeLoss;

/// Lower bound on |expected| in the denominator.
pub const EPS: f32 = 1e-7;

impl MapeLoss {
    /// Scalar MAPE: 100 · mean(|predicted - expected| / max(|expected|, ε))
    pub fn loss(predicted: &[f32], expected: &[f32]) -> f32 {
        let n = predicted.len() as f32;
        100.0 * predicted.iter().zip(expected.iter())
            .map(|(p, y)| (p - y).abs() / y.abs().max(EPS))
            .sum::<f32>() / n
    }

    /// Per-output subgradient: ±100 / (max(|expected|, ε) · n)
    pub fn derivative(predicted: &[f32], expected: &[f32]) -> Vec<f32> {
        let n = predicted.len() as f32;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| {
                let sign = if p >= y { 100.0 } else { -100.0 };
                sign / (y.abs().max(EPS) * n)
            })
            .collect()
    }
}
