pub mod bce;
pub mod cross_entropy;
pub mod loss_type;
pub mod mae;
pub mod mape;
pub mod mse;

pub use bce::BceLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use loss_type::LossType;
pub use mae::MaeLoss;
pub use mape::MapeLoss;
pub use mse::MseLoss;
