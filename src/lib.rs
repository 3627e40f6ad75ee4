pub mod math;
pub mod error;
pub mod activation;
pub mod loss;
pub mod layers;
pub mod network;
pub mod metrics;
pub mod optim;
pub mod train;
pub mod config;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use error::{NnError, Result};
pub use activation::activation::Activation;
pub use loss::loss_type::LossType;
pub use layers::dense::Layer;
pub use network::network::{Gradient, Network};
pub use network::archive::Archive;
pub use network::initializer::Initializer;
pub use optim::{Adagrad, Adam, Optimizer, RmsProp, Sgd};
pub use metrics::{evaluate, Metric};
pub use train::trainer::train_epoch;
pub use config::run_config::RunConfig;
