use std::time::Instant;
use tracing::info;

use crate::error::{NnError, Result};
use crate::metrics::{evaluate, Metric};
use crate::network::network::Network;
use crate::optim::optimizer::Optimizer;
use crate::train::epoch_stats::EpochStats;

/// Runs one pass of per-sample updates over `inputs`/`targets`, in order.
///
/// Each sample gets its own `backpropagation` call followed immediately by an
/// optimizer step; nothing is averaged across samples. When `validation` is
/// given, the mean-squared error of the updated network on it is logged and
/// returned in the stats.
pub fn train_epoch<O: Optimizer + ?Sized>(
    network: &mut Network,
    inputs: &[Vec<f32>],
    targets: &[Vec<f32>],
    optimizer: &mut O,
    validation: Option<(&[Vec<f32>], &[Vec<f32>])>,
) -> Result<EpochStats> {
    let loss = network.loss().ok_or(NnError::MissingLoss)?;
    if inputs.len() != targets.len() {
        return Err(NnError::ShapeMismatch(format!(
            "{} inputs but {} targets", inputs.len(), targets.len()
        )));
    }

    let t_start = Instant::now();
    let mut total_loss = 0.0;

    for (input, target) in inputs.iter().zip(targets.iter()) {
        let output = network.predict(input)?;
        total_loss += loss.loss(&output, target);

        let gradients = network.backpropagation(input, target)?;
        optimizer.step(network, &gradients)?;
    }

    let train_loss = if inputs.is_empty() { 0.0 } else { total_loss / inputs.len() as f32 };

    let val_mse = match validation {
        Some((val_inputs, val_targets)) => {
            let mse = validation_mse(network, val_inputs, val_targets)?;
            info!(mse, "mean squared error on validation set");
            Some(mse)
        }
        None => None,
    };

    Ok(EpochStats {
        samples: inputs.len(),
        train_loss,
        val_mse,
        learning_rate: optimizer.current_rate(),
        elapsed_ms: t_start.elapsed().as_millis() as u64,
    })
}

/// Mean-squared error over a dataset without any parameter update.
pub fn validation_mse(network: &Network, inputs: &[Vec<f32>], targets: &[Vec<f32>]) -> Result<f32> {
    let scores = evaluate(network, inputs, targets, &[Metric::MeanSquaredError])?;
    Ok(scores[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::Activation;
    use crate::loss::loss_type::LossType;
    use crate::network::initializer::Initializer;
    use crate::optim::{Adam, Sgd};

    fn xor() -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
        let inputs = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let targets = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
        (inputs, targets)
    }

    #[test]
    fn epoch_requires_a_loss() {
        let (x, y) = xor();
        let mut net = Network::create(&[2, 1], &[Activation::Sigmoid]).unwrap();
        let err = train_epoch(&mut net, &x, &y, &mut Sgd::new(0.1), None).unwrap_err();
        assert!(matches!(err, NnError::MissingLoss));
    }

    #[test]
    fn one_epoch_takes_one_step_per_sample() {
        let (x, y) = xor();
        let mut net = Network::create(&[2, 3, 1], &[Activation::Tanh, Activation::Sigmoid]).unwrap()
            .with_loss(LossType::BinaryCrossentropy);
        net.initialize(&[Initializer::Xavier, Initializer::Xavier], 1).unwrap();

        let mut sgd = Sgd::new(0.5);
        let stats = train_epoch(&mut net, &x, &y, &mut sgd, Some((x.as_slice(), y.as_slice()))).unwrap();
        assert_eq!(stats.samples, 4);
        assert_eq!(sgd.iterations(), 4);
        assert!(stats.train_loss.is_finite());
        assert_eq!(stats.val_mse, Some(validation_mse(&net, &x, &y).unwrap()));
    }

    #[test]
    fn training_reduces_the_loss_on_xor() {
        let (x, y) = xor();
        let mut net = Network::create(&[2, 4, 1], &[Activation::Tanh, Activation::Sigmoid]).unwrap()
            .with_loss(LossType::BinaryCrossentropy);
        net.initialize(&[Initializer::Xavier, Initializer::Xavier], 3).unwrap();

        let before = validation_mse(&net, &x, &y).unwrap();
        let mut sgd = Sgd::new(0.5);
        for _ in 0..2000 {
            train_epoch(&mut net, &x, &y, &mut sgd, None).unwrap();
        }
        let after = validation_mse(&net, &x, &y).unwrap();
        assert!(after < before, "mse went from {before} to {after}");
    }

    #[test]
    fn any_optimizer_can_drive_an_epoch() {
        let (x, y) = xor();
        let mut net = Network::create(&[2, 4, 1], &[Activation::Tanh, Activation::Sigmoid]).unwrap()
            .with_loss(LossType::BinaryCrossentropy);
        net.initialize(&[Initializer::Xavier, Initializer::Xavier], 3).unwrap();

        let before = validation_mse(&net, &x, &y).unwrap();
        let mut adam: Box<dyn Optimizer> = Box::new(Adam::new(0.01));
        for _ in 0..300 {
            train_epoch(&mut net, &x, &y, &mut *adam, None).unwrap();
        }
        assert_eq!(adam.iterations(), 1200);
        assert!(validation_mse(&net, &x, &y).unwrap() < before);
    }
}
