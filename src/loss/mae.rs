pub struct MaeLoss;

impl MaeLoss {
    /// Scalar MAE: mean(|predicted - expected|)
    pub fn loss(predicted: &[f32], expected: &[f32]) -> f32 {
        let n = predicted.len() as f32;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| (p - y).abs())
            .sum::<f32>() / n
    }

    /// Per-output subgradient: ±1 / n, taking +1 when predicted == expected.
    pub fn derivative(predicted: &[f32], expected: &[f32]) -> Vec<f32> {
        let n = predicted.len() as f32;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| if p >= y { 1.0 / n } else { -1.0 / n })
            .collect()
    }
}
