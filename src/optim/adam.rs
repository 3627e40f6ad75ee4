use crate::error::Result;
use crate::network::network::{Gradient, Network};
use crate::optim::optimizer::{check_gradients, ensure_state, Optimizer};

const EPSILON: f32 = 1e-8;

/// Adam with bias-corrected moment estimates and optional decoupled weight
/// decay (AdamW). The decay term `weight_decay * param` is subtracted
/// outside the adaptive scaling and is not multiplied by the learning rate.
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f32,
    pub beta_1: f32,
    pub beta_2: f32,
    pub weight_decay: f32,
    first_moment: Vec<f32>,
    second_moment: Vec<f32>,
    beta_1_power: f32,
    beta_2_power: f32,
    iterations: usize,
}

impl Adam {
    /// Adam with `beta_1 = 0.9`, `beta_2 = 0.999` and no weight decay.
    pub fn new(learning_rate: f32) -> Adam {
        Adam {
            learning_rate,
            beta_1: 0.9,
            beta_2: 0.999,
            weight_decay: 0.0,
            first_moment: Vec::new(),
            second_moment: Vec::new(),
            beta_1_power: 1.0,
            beta_2_power: 1.0,
            iterations: 0,
        }
    }

    /// AdamW with the usual `1e-4` decay.
    pub fn adamw(learning_rate: f32) -> Adam {
        Adam::new(learning_rate).with_weight_decay(1e-4)
    }

    pub fn with_betas(mut self, beta_1: f32, beta_2: f32) -> Adam {
        self.beta_1 = beta_1;
        self.beta_2 = beta_2;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Adam {
        self.weight_decay = weight_decay;
        self
    }
}

impl Optimizer for Adam {
    fn step(&mut self, network: &mut Network, gradients: &[Gradient]) -> Result<()> {
        check_gradients(network, gradients)?;
        let g = Network::flatten_gradients(gradients);
        ensure_state(&mut self.first_moment, g.len())?;
        ensure_state(&mut self.second_moment, g.len())?;

        self.beta_1_power *= self.beta_1;
        self.beta_2_power *= self.beta_2;
        let params = if self.weight_decay > 0.0 { network.parameters() } else { Vec::new() };

        let mut delta = Vec::with_capacity(g.len());
        for (i, &gi) in g.iter().enumerate() {
            let s = &mut self.first_moment[i];
            *s = self.beta_1 * *s + (1.0 - self.beta_1) * gi;
            let r = &mut self.second_moment[i];
            *r = self.beta_2 * *r + (1.0 - self.beta_2) * gi * gi;

            let s_hat = self.first_moment[i] / (1.0 - self.beta_1_power);
            let r_hat = self.second_moment[i] / (1.0 - self.beta_2_power);
            let mut d = -self.learning_rate * s_hat / (r_hat.sqrt() + EPSILON);
            if self.weight_decay > 0.0 {
                d -= self.weight_decay * params[i];
            }
            delta.push(d);
        }

        network.update(&delta)?;
        self.iterations += 1;
        Ok(())
    }

    fn current_rate(&self) -> f32 {
        self.learning_rate
    }

    fn iterations(&self) -> usize {
        self.iterations
    }
}
