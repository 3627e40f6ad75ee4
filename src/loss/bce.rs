pub struct BceLoss;

/// Predictions are clipped to [EPS, 1 - EPS] inside the logarithms.
const EPS: f32 = 1e-7;

impl BceLoss {
    /// Scalar BCE: -mean(y·log(p) + (1-y)·log(1-p))
    pub fn loss(predicted: &[f32], expected: &[f32]) -> f32 {
        let n = predicted.len() as f32;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| {
                let p = p.clamp(EPS, 1.0 - EPS);
                -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
            })
            .sum::<f32>() / n
    }

    /// Gradient of BCE composed with a sigmoid output, taken w.r.t. the
    /// sigmoid's input: (p - y) / n. The network replaces the sigmoid's own
    /// derivative with a pass-through when this pairing is bound.
    pub fn derivative(predicted: &[f32], expected: &[f32]) -> Vec<f32> {
        let n = predicted.len() as f32;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| (p - y) / n)
            .collect()
    }
}
