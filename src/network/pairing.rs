use crate::activation::activation::Activation;
use crate::loss::loss_type::LossType;

/// How the output layer's activation derivative combines with the bound loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPairing {
    /// The loss gradient already includes the activation's Jacobian, so the
    /// output layer's derivative step is a pass-through.
    Cancels,
    /// No analytic simplification; the activation's own derivative is used.
    Nominal,
}

/// Decision table for the output-layer simplification.
pub fn output_pairing(loss: LossType, activation: Activation) -> OutputPairing {
    match (loss, activation) {
        (LossType::BinaryCrossentropy, Activation::Sigmoid)
        | (LossType::CategoricalCrossentropy, Activation::Softmax) => OutputPairing::Cancels,
        _ => OutputPairing::Nominal,
    }
}
