use serde::{Serialize, Deserialize};
use tracing::warn;

/// Weight initialization scheme for a freshly created network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initializer {
    /// U(-1, 1) · sqrt(6 / (fan_in + fan_out)); suits sigmoid/tanh layers.
    Xavier,
    /// N(0, 1) · sqrt(2 / fan_in); suits ReLU layers.
    Kaiming,
    /// Plain N(0, 1).
    Normal,
}

impl Initializer {
    /// Unrecognised names fall back to `Normal` with a warning.
    pub fn from_name(name: &str) -> Initializer {
        match name.trim() {
            "xavier" => Initializer::Xavier,
            "kaiming" => Initializer::Kaiming,
            "normal" => Initializer::Normal,
            other => {
                warn!(initializer = other, "initializer not recognised; using unscaled normal values");
                Initializer::Normal
            }
        }
    }
}
