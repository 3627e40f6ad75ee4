use tracing::debug;

use crate::error::{NnError, Result};
use crate::metrics::metric::Metric;
use crate::network::network::Network;

/// Scores `network` on a dataset, returning the per-sample mean of each of
/// `metrics` in the same order. No parameters change.
pub fn evaluate(
    network: &Network,
    inputs: &[Vec<f32>],
    targets: &[Vec<f32>],
    metrics: &[Metric],
) -> Result<Vec<f32>> {
    if inputs.len() != targets.len() {
        return Err(NnError::ShapeMismatch(format!(
            "{} inputs but {} targets", inputs.len(), targets.len()
        )));
    }
    let mut totals = vec![0.0f32; metrics.len()];
    if inputs.is_empty() {
        return Ok(totals);
    }

    for (input, target) in inputs.iter().zip(targets.iter()) {
        if target.len() != network.output_size() {
            return Err(NnError::ShapeMismatch(format!(
                "target has {} values, network outputs {}", target.len(), network.output_size()
            )));
        }
        let output = network.predict(input)?;
        for (total, metric) in totals.iter_mut().zip(metrics) {
            *total += metric.compute(&output, target);
        }
    }

    let n = inputs.len() as f32;
    for total in totals.iter_mut() {
        *total /= n;
    }
    debug!(samples = inputs.len(), metrics = metrics.len(), "evaluated network");
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::Activation;
    use crate::math::matrix::Matrix;

    /// A single linear unit computing `2x + 1`.
    fn affine() -> Network {
        let w = Matrix::from_flat(1, 1, &[2.0]).unwrap();
        let b = Matrix::from_flat(1, 1, &[1.0]).unwrap();
        Network::new(vec![w, b], &[Activation::Linear]).unwrap()
    }

    #[test]
    fn metrics_are_averaged_over_samples() {
        let net = affine();
        let inputs = vec![vec![0.0], vec![1.0]];
        let targets = vec![vec![1.0], vec![5.0]];
        // outputs 1 and 3: errors 0 and 2
        let scores = evaluate(&net, &inputs, &targets, &[Metric::MeanSquaredError, Metric::MeanAbsoluteError]).unwrap();
        assert_eq!(scores, vec![2.0, 1.0]);
    }

    #[test]
    fn empty_dataset_scores_zero() {
        let scores = evaluate(&affine(), &[], &[], &[Metric::BinaryAccuracy]).unwrap();
        assert_eq!(scores, vec![0.0]);
    }

    #[test]
    fn mismatched_targets_are_rejected() {
        let err = evaluate(&affine(), &[vec![0.0]], &[vec![1.0, 2.0]], &[Metric::MeanSquaredError]).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch(_)));
        assert!(evaluate(&affine(), &[vec![0.0]], &[], &[Metric::MeanSquaredError]).is_err());
    }
}
