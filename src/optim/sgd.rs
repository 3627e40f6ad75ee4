use crate::error::{NnError, Result};
use crate::network::network::{Gradient, Network};
use crate::optim::optimizer::{check_gradients, decayed_rate, Optimizer};

/// Plain stochastic gradient descent: `param -= rate * grad`, applied
/// immediately for every sample.
///
/// With a non-zero `decay` the rate shrinks as `learning_rate / (1 + decay * t)`
/// where `t` counts the steps taken so far.
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f32,
    pub decay: f32,
    iterations: usize,
}

impl Sgd {
    pub fn new(learning_rate: f32) -> Sgd {
        Sgd { learning_rate, decay: 0.0, iterations: 0 }
    }

    pub fn with_decay(mut self, decay: f32) -> Sgd {
        self.decay = decay;
        self
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, network: &mut Network, gradients: &[Gradient]) -> Result<()> {
        check_gradients(network, gradients)?;
        let rate = self.current_rate();
        for (i, grad) in gradients.iter().enumerate() {
            let layer = network.layer_mut(i)
                .ok_or_else(|| NnError::ShapeMismatch(format!("layer index {i} out of range")))?;
            layer.apply_gradients(&grad.weights, &grad.biases, rate);
        }
        self.iterations += 1;
        Ok(())
    }

    fn current_rate(&self) -> f32 {
        decayed_rate(self.learning_rate, self.decay, self.iterations)
    }

    fn iterations(&self) -> usize {
        self.iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::Activation;
    use crate::loss::loss_type::LossType;
    use crate::math::matrix::Matrix;

    #[test]
    fn step_moves_parameters_against_the_gradient() {
        let mut net = Network::create(&[2, 1], &[Activation::Linear]).unwrap()
            .with_loss(LossType::MeanSquaredError);
        let grads = net.backpropagation(&[1.0, 2.0], &[1.0]).unwrap();
        // output 0, gradient 2·(0 − 1)/1 = −2
        assert_eq!(grads[0].biases.flatten(), vec![-2.0]);
        assert_eq!(grads[0].weights.flatten(), vec![-2.0, -4.0]);

        let mut sgd = Sgd::new(0.1);
        sgd.step(&mut net, &grads).unwrap();
        assert_eq!(net.layers()[0].biases().flatten(), vec![0.2]);
        assert_eq!(net.layers()[0].weights().flatten(), vec![0.2, 0.4]);
        assert_eq!(sgd.iterations(), 1);
    }

    #[test]
    fn decay_shrinks_the_rate() {
        let mut net = Network::create(&[1, 1], &[Activation::Linear]).unwrap();
        let zero = vec![Gradient { weights: Matrix::zeros(1, 1), biases: Matrix::zeros(1, 1) }];
        let mut sgd = Sgd::new(1.0).with_decay(1.0);
        assert_eq!(sgd.current_rate(), 1.0);
        sgd.step(&mut net, &zero).unwrap();
        assert_eq!(sgd.current_rate(), 0.5);
    }

    #[test]
    fn mismatched_gradients_are_rejected() {
        let mut net = Network::create(&[2, 1], &[Activation::Linear]).unwrap();
        let wrong = vec![Gradient { weights: Matrix::zeros(3, 1), biases: Matrix::zeros(1, 1) }];
        assert!(Sgd::new(0.1).step(&mut net, &wrong).is_err());
        assert!(Sgd::new(0.1).step(&mut net, &[]).is_err());
    }
}
