use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NnError;
use crate::loss::{BceLoss, CrossEntropyLoss, LossType, MaeLoss, MapeLoss, MseLoss};

/// A per-sample score used to report on a dataset. Metrics are never
/// differentiated; training goes through `LossType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    MeanSquaredError,
    MeanAbsoluteError,
    MeanAbsolutePercentageError,
    BinaryCrossentropy,
    /// Averaged over the output width, unlike the categorical loss which sums.
    CategoricalCrossentropy,
    /// Fraction of outputs that round to the same class as the target, with
    /// both sides clipped to `[0, 1]` first.
    BinaryAccuracy,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::MeanSquaredError,
        Metric::MeanAbsoluteError,
        Metric::MeanAbsolutePercentageError,
        Metric::BinaryCrossentropy,
        Metric::CategoricalCrossentropy,
        Metric::BinaryAccuracy,
    ];

    /// Looks a metric up by name. `mse`, `mae` and `mape` are accepted as
    /// short forms.
    pub fn from_name(name: &str) -> Result<Metric, NnError> {
        match name {
            "mse" => Ok(Metric::MeanSquaredError),
            "mae" => Ok(Metric::MeanAbsoluteError),
            "mape" => Ok(Metric::MeanAbsolutePercentageError),
            _ => Metric::ALL.iter()
                .copied()
                .find(|m| m.name() == name)
                .ok_or_else(|| NnError::UnknownMetric(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::MeanSquaredError => "mean_squared_error",
            Metric::MeanAbsoluteError => "mean_absolute_error",
            Metric::MeanAbsolutePercentageError => "mean_absolute_percentage_error",
            Metric::BinaryCrossentropy => "binary_crossentropy",
            Metric::CategoricalCrossentropy => "categorical_crossentropy",
            Metric::BinaryAccuracy => "binary_accuracy",
        }
    }

    /// The metric reporting the same quantity a loss trains on.
    pub fn for_loss(loss: LossType) -> Metric {
        match loss {
            LossType::MeanSquaredError => Metric::MeanSquaredError,
            LossType::MeanAbsoluteError => Metric::MeanAbsoluteError,
            LossType::MeanAbsolutePercentageError => Metric::MeanAbsolutePercentageError,
            LossType::BinaryCrossentropy => Metric::BinaryCrossentropy,
            LossType::CategoricalCrossentropy => Metric::CategoricalCrossentropy,
        }
    }

    /// Scores one prediction against its target.
    pub fn compute(&self, predicted: &[f32], expected: &[f32]) -> f32 {
        let n = predicted.len() as f32;
        match self {
            Metric::MeanSquaredError => MseLoss::loss(predicted, expected),
            Metric::MeanAbsoluteError => MaeLoss::loss(predicted, expected),
            Metric::MeanAbsolutePercentageError => MapeLoss::loss(predicted, expected),
            Metric::BinaryCrossentropy => BceLoss::loss(predicted, expected),
            Metric::CategoricalCrossentropy => CrossEntropyLoss::loss(predicted, expected) / n,
            Metric::BinaryAccuracy => {
                let hits = predicted.iter().zip(expected.iter())
                    .filter(|(p, y)| p.clamp(0.0, 1.0).round() == y.clamp(0.0, 1.0).round())
                    .count();
                hits as f32 / n
            }
        }
    }
}

impl FromStr for Metric {
    type Err = NnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::from_name(s.trim())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn names_and_aliases_resolve() {
        for m in Metric::ALL {
            assert_eq!(Metric::from_name(m.name()).unwrap(), m);
        }
        assert_eq!(" mape ".parse::<Metric>().unwrap(), Metric::MeanAbsolutePercentageError);
        assert!(matches!(Metric::from_name("f1"), Err(NnError::UnknownMetric(_))));
    }

    #[test]
    fn every_loss_has_a_matching_metric() {
        for loss in LossType::ALL {
            assert_eq!(Metric::for_loss(loss).name(), loss.name());
        }
    }

    #[test]
    fn binary_accuracy_rounds_and_clips() {
        let acc = Metric::BinaryAccuracy.compute(&[0.2, 0.7, 1.8, 0.4], &[0.0, 1.0, 1.0, 1.0]);
        assert_eq!(acc, 0.75);
    }

    #[test]
    fn categorical_metric_is_the_loss_averaged() {
        let p = [0.7, 0.2, 0.1];
        let y = [1.0, 0.0, 0.0];
        let loss = LossType::CategoricalCrossentropy.loss(&p, &y);
        assert_relative_eq!(Metric::CategoricalCrossentropy.compute(&p, &y), loss / 3.0);
        assert_relative_eq!(Metric::MeanSquaredError.compute(&p, &y), (0.09 + 0.04 + 0.01) / 3.0, max_relative = 1e-5);
    }
}
