use crate::error::Result;
use crate::network::network::{Gradient, Network};
use crate::optim::optimizer::{check_gradients, decayed_rate, ensure_state, Optimizer};
use crate::optim::rmsprop::EPSILON;

/// Adagrad: each gradient is divided by the root of the sum of all its
/// squared past values, so frequently updated parameters slow down.
#[derive(Debug, Clone)]
pub struct Adagrad {
    pub learning_rate: f32,
    pub decay: f32,
    squared_sum: Vec<f32>,
    iterations: usize,
}

impl Adagrad {
    pub fn new(learning_rate: f32) -> Adagrad {
        Adagrad { learning_rate, decay: 0.0, squared_sum: Vec::new(), iterations: 0 }
    }

    pub fn with_decay(mut self, decay: f32) -> Adagrad {
        self.decay = decay;
        self
    }
}

impl Optimizer for Adagrad {
    fn step(&mut self, network: &mut Network, gradients: &[Gradient]) -> Result<()> {
        check_gradients(network, gradients)?;
        let g = Network::flatten_gradients(gradients);
        ensure_state(&mut self.squared_sum, g.len())?;
        let rate = self.current_rate();

        let delta: Vec<f32> = g.iter()
            .zip(self.squared_sum.iter_mut())
            .map(|(&gi, r)| {
                *r += gi * gi;
                -rate * gi / (EPSILON + r.sqrt())
            })
            .collect();

        network.update(&delta)?;
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
