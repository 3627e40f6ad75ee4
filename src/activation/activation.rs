use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NnError;

/// The closed set of activation functions a layer can use.
///
/// Every derivative is written as a function of the activation's own
/// *output*, so backpropagation only needs the values kept from the forward
/// pass and never the pre-activation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Sigmoid,
    /// Softmax normalizes the whole vector. Its derivative is a pass-through;
    /// the Jacobian is folded into the categorical cross-entropy gradient.
    Softmax,
    Relu,
    Linear,
    Tanh,
    Exponential,
    Softplus,
    Softsign,
    HardSigmoid,
}

impl Activation {
    pub const ALL: [Activation; 9] = [
        Activation::Sigmoid,
        Activation::Softmax,
        Activation::Relu,
        Activation::Linear,
        Activation::Tanh,
        Activation::Exponential,
        Activation::Softplus,
        Activation::Softsign,
        Activation::HardSigmoid,
    ];

    pub fn from_name(name: &str) -> Result<Activation, NnError> {
        Activation::ALL.iter()
            .copied()
            .find(|a| a.name() == name)
            .ok_or_else(|| NnError::UnknownActivation(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Softmax => "softmax",
            Activation::Relu => "relu",
            Activation::Linear => "linear",
            Activation::Tanh => "tanh",
            Activation::Exponential => "exponential",
            Activation::Softplus => "softplus",
            Activation::Softsign => "softsign",
            Activation::HardSigmoid => "hard_sigmoid",
        }
    }

    /// Applies the activation to a whole pre-activation vector.
    pub fn forward(&self, z: &[f32]) -> Vec<f32> {
        match self {
            Activation::Softmax => softmax(z),
            _ => z.iter().map(|&x| self.function(x)).collect(),
        }
    }

    /// Derivative of the activation, evaluated on the layer's `output`.
    pub fn derivative(&self, output: &[f32]) -> Vec<f32> {
        output.iter().map(|&y| self.derivative_at(y)).collect()
    }

    /// Element-wise activation. Softmax has no scalar form and is routed
    /// through `forward` instead.
    fn function(&self, x: f32) -> f32 {
        match self {
            Activation::Sigmoid => sigmoid(x),
            Activation::Softmax => unreachable!("softmax is applied to the full vector"),
            Activation::Relu => if x > 0.0 { x } else { 0.0 },
            Activation::Linear => x,
            Activation::Tanh => x.tanh(),
            Activation::Exponential => x.exp(),
            // ln(1 + e^x) = max(x, 0) + ln(1 + e^-|x|)
            Activation::Softplus => x.max(0.0) + (-x.abs()).exp().ln_1p(),
            Activation::Softsign => x / (1.0 + x.abs()),
            Activation::HardSigmoid => (0.2 * x + 0.5).clamp(0.0, 1.0),
        }
    }

    fn derivative_at(&self, y: f32) -> f32 {
        match self {
            Activation::Sigmoid => y * (1.0 - y),
            Activation::Softmax => 1.0,
            // A zero output means the input was <= 0.
            Activation::Relu => if y > 0.0 { 1.0 } else { 0.0 },
            Activation::Linear => 1.0,
            Activation::Tanh => 1.0 - y * y,
            Activation::Exponential => y,
            Activation::Softplus => 1.0 - (-y).exp(),
            Activation::Softsign => {
                let d = y - y.signum();
                d * d
            }
            // Clipped outputs sit exactly on 0 or 1 and carry no gradient.
            Activation::HardSigmoid => if y > 0.0 && y < 1.0 { 0.2 } else { 0.0 },
        }
    }
}

impl FromStr for Activation {
    type Err = NnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activation::from_name(s.trim())
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logistic function without overflow: for negative inputs `e^x` is used
/// so the exponent is never large and positive.
fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

fn softmax(z: &[f32]) -> Vec<f32> {
    let max = z.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = z.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    /// Evenly spaced points in (-2, 2), offset so none lands on a kink.
    fn sample_points(n: usize) -> Vec<f32> {
        (0..n).map(|i| -1.9 + 3.8 * i as f32 / (n - 1) as f32 + 0.037).collect()
    }

    #[test]
    fn names_round_trip_through_the_registry() {
        for a in Activation::ALL {
            assert_eq!(Activation::from_name(a.name()).unwrap(), a);
            assert_eq!(a.to_string().parse::<Activation>().unwrap(), a);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = Activation::from_name("swish").unwrap_err();
        assert!(matches!(err, NnError::UnknownActivation(name) if name == "swish"));
    }

    #[test]
    fn derivative_of_output_matches_finite_difference() {
        let h = 1e-2f32;
        for a in Activation::ALL {
            if a == Activation::Softmax {
                continue;
            }
            for n in [4, 9, 17] {
                let x = sample_points(n);
                let analytic = a.derivative(&a.forward(&x));
                let plus: Vec<f32> = x.iter().map(|v| v + h).collect();
                let minus: Vec<f32> = x.iter().map(|v| v - h).collect();
                let (fp, fm) = (a.forward(&plus), a.forward(&minus));
                for i in 0..n {
                    let numeric = (fp[i] - fm[i]) / (2.0 * h);
                    assert_relative_eq!(analytic[i], numeric, epsilon = 1e-4, max_relative = 1e-3);
                }
            }
        }
    }

    #[test]
    fn saturated_derivatives_match_finite_difference() {
        let h = 1e-2f32;
        let x = [-4.0f32, -3.0, 3.0, 4.0];
        for a in Activation::ALL {
            if a == Activation::Softmax {
                continue;
            }
            let analytic = a.derivative(&a.forward(&x));
            let plus: Vec<f32> = x.iter().map(|v| v + h).collect();
            let minus: Vec<f32> = x.iter().map(|v| v - h).collect();
            let (fp, fm) = (a.forward(&plus), a.forward(&minus));
            for i in 0..x.len() {
                let numeric = (fp[i] - fm[i]) / (2.0 * h);
                assert_relative_eq!(analytic[i], numeric, epsilon = 1e-3, max_relative = 1e-3);
            }
        }
    }

    #[test]
    fn softmax_is_stable_for_large_inputs() {
        let y = Activation::Softmax.forward(&[1000.0, 2000.0, 3000.0]);
        assert!(y.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(y.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y[2], 1.0, epsilon = 1e-6);

        let y = Activation::Softmax.forward(&[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(y.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert!(y[0] < y[1] && y[1] < y[2]);
    }

    #[test]
    fn sigmoid_saturates_without_nan() {
        let y = Activation::Sigmoid.forward(&[-1000.0, 1000.0]);
        assert!(y.iter().all(|v| !v.is_nan()));
        assert_abs_diff_eq!(y[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn relu_derivative_is_zero_at_zero_output() {
        let y = Activation::Relu.forward(&[-3.0, 0.0, 2.0]);
        assert_eq!(y, vec![0.0, 0.0, 2.0]);
        assert_eq!(Activation::Relu.derivative(&y), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn hard_sigmoid_clips_to_unit_interval() {
        let y = Activation::HardSigmoid.forward(&[-10.0, 0.0, 10.0]);
        assert_eq!(y, vec![0.0, 0.5, 1.0]);
        assert_eq!(Activation::HardSigmoid.derivative(&y), vec![0.0, 0.2, 0.0]);
        assert_eq!(Activation::HardSigmoid.derivative(&[0.5, 1.5]), vec![0.2, 0.0]);
    }

    #[test]
    fn softplus_does_not_overflow() {
        let y = Activation::Softplus.forward(&[-100.0, 100.0]);
        assert!(y.iter().all(|v| v.is_finite()));
        assert_relative_eq!(y[1], 100.0);
    }
}
