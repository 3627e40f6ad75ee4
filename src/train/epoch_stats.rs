use serde::{Serialize, Deserialize};

/// Summary of one `train_epoch` pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// Number of training samples visited (one SGD step each).
    pub samples: usize,
    /// Mean scalar training loss, measured before each sample's update.
    pub train_loss: f32,
    /// Mean-squared error over the validation set, regardless of the bound
    /// training loss. Only set when validation data was supplied.
    pub val_mse: Option<f32>,
    /// Learning rate in effect after the last step.
    pub learning_rate: f32,
    /// Wall-clock duration of the epoch in milliseconds.
    pub elapsed_ms: u64,
}
