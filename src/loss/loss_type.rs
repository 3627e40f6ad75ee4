use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NnError;
use crate::loss::bce::BceLoss;
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::mae::MaeLoss;
use crate::loss::mape::MapeLoss;
use crate::loss::mse::MseLoss;

/// Selects which loss function backpropagation seeds its error with.
///
/// - `MeanSquaredError`           : pair with Linear output.
/// - `MeanAbsoluteError`          : pair with Linear output.
/// - `MeanAbsolutePercentageError`: pair with Linear output.
/// - `BinaryCrossentropy`         : pair with Sigmoid output; the gradient is
///   the combined Sigmoid+BCE gradient.
/// - `CategoricalCrossentropy`    : pair with Softmax output; the gradient is
///   the combined Softmax+CE gradient (predicted - expected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    MeanSquaredError,
    MeanAbsoluteError,
    MeanAbsolutePercentageError,
    BinaryCrossentropy,
    CategoricalCrossentropy,
}

impl LossType {
    pub const ALL: [LossType; 5] = [
        LossType::MeanSquaredError,
        LossType::MeanAbsoluteError,
        LossType::MeanAbsolutePercentageError,
        LossType::BinaryCrossentropy,
        LossType::CategoricalCrossentropy,
    ];

    /// Looks up a loss by its canonical name or one of the short aliases
    /// `mse`, `mae` and `mape`.
    pub fn from_name(name: &str) -> Result<LossType, NnError> {
        match name {
            "mse" => Ok(LossType::MeanSquaredError),
            "mae" => Ok(LossType::MeanAbsoluteError),
            "mape" => Ok(LossType::MeanAbsolutePercentageError),
            _ => LossType::ALL.iter()
                .copied()
                .find(|l| l.name() == name)
                .ok_or_else(|| NnError::UnknownLoss(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LossType::MeanSquaredError => "mean_squared_error",
            LossType::MeanAbsoluteError => "mean_absolute_error",
            LossType::MeanAbsolutePercentageError => "mean_absolute_percentage_error",
            LossType::BinaryCrossentropy => "binary_crossentropy",
            LossType::CategoricalCrossentropy => "categorical_crossentropy",
        }
    }

    /// ∂loss/∂output for one sample. This is what backpropagation consumes.
    pub fn gradient(&self, predicted: &[f32], expected: &[f32]) -> Vec<f32> {
        match self {
            LossType::MeanSquaredError => MseLoss::derivative(predicted, expected),
            LossType::MeanAbsoluteError => MaeLoss::derivative(predicted, expected),
            LossType::MeanAbsolutePercentageError => MapeLoss::derivative(predicted, expected),
            LossType::BinaryCrossentropy => BceLoss::derivative(predicted, expected),
            LossType::CategoricalCrossentropy => CrossEntropyLoss::derivative(predicted, expected),
        }
    }

    /// Scalar loss for one sample, for reporting only.
    pub fn loss(&self, predicted: &[f32], expected: &[f32]) -> f32 {
        match self {
            LossType::MeanSquaredError => MseLoss::loss(predicted, expected),
            LossType::MeanAbsoluteError => MaeLoss::loss(predicted, expected),
            LossType::MeanAbsolutePercentageError => MapeLoss::loss(predicted, expected),
            LossType::BinaryCrossentropy => BceLoss::loss(predicted, expected),
            LossType::CategoricalCrossentropy => CrossEntropyLoss::loss(predicted, expected),
        }
    }
}

impl FromStr for LossType {
    type Err = NnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LossType::from_name(s.trim())
    }
}

impl fmt::Display for LossType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
