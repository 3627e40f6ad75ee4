use crate::error::Result;
use crate::network::network::{Gradient, Network};
use crate::optim::optimizer::{check_gradients, decayed_rate, ensure_state, Optimizer};

pub(crate) const EPSILON: f32 = 1e-7;

/// RMSprop: each gradient is divided by a running root-mean-square of its
/// past values. A non-zero `momentum` accumulates the scaled steps into a
/// velocity that is applied instead.
#[derive(Debug, Clone)]
pub struct RmsProp {
    pub learning_rate: f32,
    pub rho: f32,
    pub momentum: f32,
    pub decay: f32,
    mean_square: Vec<f32>,
    velocity: Vec<f32>,
    iterations: usize,
}

impl RmsProp {
    /// RMSprop with `rho = 0.9`, no momentum and no decay.
    pub fn new(learning_rate: f32) -> RmsProp {
        RmsProp {
            learning_rate,
            rho: 0.9,
            momentum: 0.0,
            decay: 0.0,
            mean_square: Vec::new(),
            velocity: Vec::new(),
            iterations: 0,
        }
    }

    pub fn with_rho(mut self, rho: f32) -> RmsProp {
        self.rho = rho;
        self
    }

    pub fn with_momentum(mut self, momentum: f32) -> RmsProp {
        self.momentum = momentum;
        self
    }

    pub fn with_decay(mut self, decay: f32) -> RmsProp {
        self.decay = decay;
        self
    }
}

impl Optimizer for RmsProp {
    fn step(&mut self, network: &mut Network, gradients: &[Gradient]) -> Result<()> {
        check_gradients(network, gradients)?;
        let g = Network::flatten_gradients(gradients);
        ensure_state(&mut self.mean_square, g.len())?;
        let rate = self.current_rate();

        let mut delta: Vec<f32> = g.iter()
            .zip(self.mean_square.iter_mut())
            .map(|(&gi, r)| {
                *r = self.rho * *r + (1.0 - self.rho) * gi * gi;
                -rate * gi / (EPSILON + r.sqrt())
            })
            .collect();

        if self.momentum > 0.0 {
            ensure_state(&mut self.velocity, g.len())?;
            for (v, d) in self.velocity.iter_mut().zip(delta.iter_mut()) {
                *v = self.momentum * *v + *d;
                *d = *v;
            }
        }

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
